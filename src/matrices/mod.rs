//! Hierarchical transform context.
//!
//! [`Matrices`] produces the matrices a renderer needs for an observer and,
//! nested inside it, for one instance or one light at a time. Scopes are
//! opened with `with_*` calls that take a closure; the closure receives a
//! handle through which the cached values are read.
//!
//! ```text
//! Idle -> ObserverActive -> InstanceActive        -> ObserverActive -> Idle
//!                        -> ProjectiveLightActive
//!                        -> VolumeLightActive
//! ```
//!
//! At most one observer and at most one sub-scope are active. Opening a
//! second one fails with an "already active" error before anything is
//! written. Every scope is closed when its closure returns, whether it
//! returned `Ok`, `Err`, or unwound. Handles that outlive their scope fail
//! every read with [`RenderError::ScopeInactive`].

mod scopes;
mod view_rays;

pub use scopes::{
    InstanceUniforms, MatricesInstance, MatricesObserver, MatricesProjectiveLight, MatricesVolumeLight,
    ObserverUniforms,
};
pub use view_rays::{ViewRay, ViewRays};

use crate::error::{RenderError, RenderResult};
use crate::projection::Projection;
use glam::{Mat3, Mat4};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Which scopes are currently open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopeState {
    #[default]
    Idle,
    ObserverActive,
    InstanceActive,
    ProjectiveLightActive,
    VolumeLightActive,
}

impl ScopeState {
    fn check_open_observer(self) -> RenderResult<()> {
        match self {
            ScopeState::Idle => Ok(()),
            _ => Err(RenderError::ObserverAlreadyActive),
        }
    }

    /// The error names the sub-scope that is already open.
    fn check_open_sub_scope(self) -> RenderResult<()> {
        match self {
            ScopeState::ObserverActive => Ok(()),
            ScopeState::Idle => Err(RenderError::ScopeInactive { scope: "Observer" }),
            ScopeState::InstanceActive => Err(RenderError::InstanceAlreadyActive),
            ScopeState::ProjectiveLightActive => Err(RenderError::ProjectiveLightAlreadyActive),
            ScopeState::VolumeLightActive => Err(RenderError::VolumeLightAlreadyActive),
        }
    }
}

#[derive(Debug, Default)]
struct ObserverData {
    view: Mat4,
    view_inverse: Mat4,
    projection: Projection,
    projection_matrix: Mat4,
    projection_inverse: Mat4,
    depth_coefficient: f32,
    view_rays: ViewRays,
}

impl ObserverData {
    fn update(&mut self, view: Mat4, projection: &Projection) {
        self.view = view;
        self.view_inverse = view.inverse();
        self.projection = *projection;
        self.projection_matrix = projection.matrix();
        self.projection_inverse = self.projection_matrix.inverse();
        self.depth_coefficient = projection.depth_coefficient();
        self.view_rays = ViewRays::from_inverse_projection(self.projection_inverse);
    }
}

#[derive(Debug, Default)]
struct InstanceData {
    model: Mat4,
    model_view: Mat4,
    normal: Mat3,
    uv: Mat3,
}

impl InstanceData {
    fn update(&mut self, view: Mat4, model: Mat4, uv: Mat3) {
        self.model = model;
        self.model_view = view * model;
        self.normal = normal_matrix(self.model_view);
        self.uv = uv;
    }
}

#[derive(Debug, Default)]
struct ProjectiveData {
    model_view: Mat4,
    light_view: Mat4,
    light_projection: Projection,
    light_projection_matrix: Mat4,
    eye_to_light_clip: Mat4,
}

#[derive(Debug, Default)]
struct VolumeData {
    model_view: Mat4,
    normal: Mat3,
}

/// Inverse transpose of the upper 3x3, for transforming normals.
fn normal_matrix(model_view: Mat4) -> Mat3 {
    Mat3::from_mat4(model_view).inverse().transpose()
}

#[derive(Debug, Default)]
struct Shared {
    state: Cell<ScopeState>,
    observer_generation: Cell<u64>,
    sub_generation: Cell<u64>,
    observer: RefCell<ObserverData>,
    instance: RefCell<InstanceData>,
    projective: RefCell<ProjectiveData>,
    volume: RefCell<VolumeData>,
}

impl Shared {
    /// Switch to `next`; the returned guard switches to `restore` when dropped.
    fn enter(&self, next: ScopeState, restore: ScopeState) -> ScopeGuard<'_> {
        self.state.set(next);
        ScopeGuard {
            state: &self.state,
            restore,
        }
    }

    fn next_generation(counter: &Cell<u64>) -> u64 {
        let generation = counter.get().wrapping_add(1);
        counter.set(generation);
        generation
    }
}

struct ScopeGuard<'a> {
    state: &'a Cell<ScopeState>,
    restore: ScopeState,
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.state.set(self.restore);
    }
}

/// The transform context.
///
/// Not `Send`: a context and every handle it gives out belong to the thread
/// that renders the frame.
#[derive(Debug)]
pub struct Matrices {
    shared: Rc<Shared>,
}

impl Default for Matrices {
    fn default() -> Self {
        Self::new()
    }
}

impl Matrices {
    pub fn new() -> Self {
        log::debug!("Creating transform context");
        Self {
            shared: Rc::new(Shared::default()),
        }
    }

    pub fn state(&self) -> ScopeState {
        self.shared.state.get()
    }

    /// A handle to the observer scope that is currently open.
    pub fn current_observer(&self) -> RenderResult<MatricesObserver> {
        match self.shared.state.get() {
            ScopeState::Idle => Err(RenderError::ScopeInactive { scope: "Observer" }),
            _ => Ok(MatricesObserver::new(
                Rc::clone(&self.shared),
                self.shared.observer_generation.get(),
            )),
        }
    }

    /// Open an observer scope for the given view and projection and run `body` inside it.
    ///
    /// Fails with [`RenderError::ObserverAlreadyActive`] if any scope is open,
    /// and with [`RenderError::InvalidProjection`] if `projection` is out of range.
    /// Returns whatever `body` returns; the scope is closed either way.
    pub fn with_observer<U, T, E, F>(&self, view: Mat4, projection: &Projection, user: U, body: F) -> Result<T, E>
    where
        F: FnOnce(&MatricesObserver, U) -> Result<T, E>,
        E: From<RenderError>,
    {
        let shared = &self.shared;
        shared.state.get().check_open_observer()?;
        projection.validate()?;

        shared.observer.borrow_mut().update(view, projection);
        let generation = Shared::next_generation(&shared.observer_generation);
        let _guard = shared.enter(ScopeState::ObserverActive, ScopeState::Idle);

        let observer = MatricesObserver::new(Rc::clone(shared), generation);
        body(&observer, user)
    }
}
