//! Per-frame registry bundle.
//!
//! A renderer keeps one [`FrameScenes`] for its whole lifetime and calls
//! [`FrameScenes::begin_frame`] at the start of every frame. Registries are
//! cleared in place so their allocations carry over to the next frame.

use crate::group::StencilMode;
use crate::material::{Material, Shader};
use crate::visibility::{SceneLights, SceneStencils, VisibilitySet};

/// Per-frame state that is cleared, not reallocated, between frames.
pub trait FrameResource {
    /// Clear contents, preserving allocated capacity.
    fn reset(&mut self);

    /// Number of entries currently held.
    fn count(&self) -> usize;
}

impl<M: Material> FrameResource for VisibilitySet<M> {
    fn reset(&mut self) {
        VisibilitySet::reset(self);
    }

    fn count(&self) -> usize {
        VisibilitySet::count(self)
    }
}

impl<S: Shader> FrameResource for SceneLights<S> {
    fn reset(&mut self) {
        SceneLights::reset(self);
    }

    fn count(&self) -> usize {
        SceneLights::count(self)
    }
}

impl FrameResource for SceneStencils {
    fn reset(&mut self) {
        SceneStencils::reset(self);
    }

    fn count(&self) -> usize {
        SceneStencils::count(self)
    }
}

/// Initial sizing and defaults for the per-frame registries
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Expected number of visible opaque instances
    pub opaque_capacity: usize,
    /// Expected number of visible depth-only instances
    pub depth_capacity: usize,
    /// Expected number of visible lights
    pub light_capacity: usize,
    /// Expected number of stencil instances
    pub stencil_capacity: usize,
    /// How stencil instances affect the allow bit
    pub stencil_mode: StencilMode,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            opaque_capacity: 1024,
            depth_capacity: 256,
            light_capacity: 64,
            stencil_capacity: 16,
            stencil_mode: StencilMode::InstancesAreNegative,
        }
    }
}

/// Every registry a deferred frame needs.
#[derive(Debug)]
pub struct FrameScenes<M: Material, S: Shader> {
    pub opaques: VisibilitySet<M>,
    pub depth: VisibilitySet<M>,
    pub lights: SceneLights<S>,
    pub stencils: SceneStencils,
    frame_index: u64,
}

impl<M: Material, S: Shader> Default for FrameScenes<M, S> {
    fn default() -> Self {
        Self::with_config(&FrameConfig::default())
    }
}

impl<M: Material, S: Shader> FrameScenes<M, S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &FrameConfig) -> Self {
        log::debug!("Creating frame scenes: {:?}", config);
        Self {
            opaques: VisibilitySet::with_capacity("opaques", config.opaque_capacity),
            depth: VisibilitySet::with_capacity("depth", config.depth_capacity),
            lights: SceneLights::with_capacity(config.light_capacity),
            stencils: SceneStencils::with_capacity(config.stencil_mode, config.stencil_capacity),
            frame_index: 0,
        }
    }

    /// Clear every registry and advance the frame counter. Returns the new frame index.
    pub fn begin_frame(&mut self) -> u64 {
        self.frame_index += 1;
        log::trace!("Beginning frame {} ({} stale entries)", self.frame_index, self.count());
        for resource in self.resources_mut() {
            resource.reset();
        }
        self.frame_index
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Total entries across all registries.
    pub fn count(&self) -> usize {
        self.opaques.count() + self.depth.count() + self.lights.count() + self.stencils.count()
    }

    fn resources_mut(&mut self) -> [&mut dyn FrameResource; 4] {
        [&mut self.opaques, &mut self.depth, &mut self.lights, &mut self.stencils]
    }
}
