//! Error types for the visibility registries and the transform context.
//!
//! Every variant is a usage error: it is detected before any state is
//! mutated and returned to the immediate caller.

use crate::id::Id;
use thiserror::Error;

/// Render core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Instance already visible: {id}")]
    InstanceAlreadyVisible { id: Id },
    #[error("Light already visible: {id}")]
    LightAlreadyVisible { id: Id },
    #[error("Invalid group {0}: groups must be in the range [1, 15]")]
    InvalidGroup(u32),
    #[error("Observer already active")]
    ObserverAlreadyActive,
    #[error("Instance already active")]
    InstanceAlreadyActive,
    #[error("Projective already active")]
    ProjectiveLightAlreadyActive,
    #[error("Volume already active")]
    VolumeLightAlreadyActive,
    #[error("{scope} is not active")]
    ScopeInactive { scope: &'static str },
    #[error("Invalid projection: {0}")]
    InvalidProjection(String),
}

pub type RenderResult<T> = Result<T, RenderError>;
