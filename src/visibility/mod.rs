//! Visibility registries.
//!
//! A registry accumulates what is visible this frame, then replays it to a
//! consumer grouped so that draw state changes as rarely as possible:
//! render group, then shader, then material, then geometry source. Every
//! entry is visited exactly once per `execute`, and all visits sharing a
//! (group, shader, material) triple are contiguous.
//!
//! - [`VisibilitySet`]: single, batched and billboarded instances with materials
//!   (opaque and depth-only registries)
//! - [`SceneLights`]: lights with light shaders
//! - [`SceneStencils`]: instances that write the stencil allow bit
//!
//! Registries are reset and reused each frame rather than reallocated.

mod consumer;
mod entries;
mod lights;
mod set;
mod stencils;

pub use consumer::{LightsConsumer, StencilsConsumer, VisibilityConsumer};
pub use lights::SceneLights;
pub use set::{SceneDepthInstances, SceneOpaques, VisibilitySet};
pub use stencils::SceneStencils;
