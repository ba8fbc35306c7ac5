//! Visible light registry.

use super::consumer::LightsConsumer;
use super::entries::{runs, EntryList, LightKey};
use crate::error::{RenderError, RenderResult};
use crate::group::Group;
use crate::instance::ArrayObjectId;
use crate::light::Light;
use crate::material::Shader;
use std::fmt;
use std::sync::Arc;

/// The lights visible this frame, each with the shader that draws it.
///
/// Lights are grouped like instances: a light in group `g` only affects
/// pixels whose stencil group bits equal `g`.
pub struct SceneLights<S: Shader> {
    lights: EntryList<LightKey, dyn Light, S>,
}

impl<S: Shader> fmt::Debug for SceneLights<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneLights").field("lights", &self.lights.len()).finish()
    }
}

impl<S: Shader> Default for SceneLights<S> {
    fn default() -> Self {
        Self::with_capacity(64)
    }
}

impl<S: Shader> SceneLights<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        log::debug!("Creating light set with capacity {}", capacity);
        Self {
            lights: EntryList::with_capacity(capacity),
        }
    }

    /// Make a light visible in the default group.
    pub fn add_light(&mut self, light: Arc<dyn Light>, shader: S) -> RenderResult<()> {
        self.add_light_in_group(light, shader, u32::from(Group::DEFAULT.get()))
    }

    /// Make a light visible in `group`.
    pub fn add_light_in_group(&mut self, light: Arc<dyn Light>, shader: S, group: u32) -> RenderResult<()> {
        let key = LightKey {
            group: Group::new(group)?,
            shader: shader.shader_id(),
            array: light.array_object(),
            light: light.light_id(),
        };
        if self.lights.insert(key, light, shader) {
            Ok(())
        } else {
            Err(RenderError::LightAlreadyVisible { id: key.light })
        }
    }

    pub fn count(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn reset(&mut self) {
        log::trace!("Resetting light set ({} lights)", self.count());
        self.lights.clear();
    }

    /// Replay the visible lights to `consumer`.
    pub fn execute<C: LightsConsumer<S>>(&mut self, consumer: &mut C) -> Result<(), C::Error> {
        log::trace!("Executing light set ({} lights)", self.count());
        self.lights.sort();

        consumer.on_start()?;

        for group in Group::all() {
            let entries = self.lights.range_of(|k| k.group, group);
            if entries.is_empty() {
                continue;
            }

            consumer.on_start_group(group)?;
            for by_shader in runs(entries, |e| e.key.shader) {
                let shader = &by_shader[0].payload;
                consumer.on_light_shader_start(shader)?;

                let mut previous: Option<ArrayObjectId> = None;
                for entry in by_shader {
                    if previous != Some(entry.key.array) {
                        consumer.on_light_array_start(&*entry.item)?;
                        previous = Some(entry.key.array);
                    }
                    consumer.on_light(shader, &*entry.item)?;
                }

                consumer.on_light_shader_finish(shader)?;
            }
            consumer.on_finish_group(group)?;
        }

        consumer.on_finish()
    }
}
