//! Traversal consumers.
//!
//! A consumer receives the callbacks of a registry's `execute`. Every
//! callback has an empty default, so an implementation only overrides the
//! ones it cares about. Returning `Err` from any callback stops the traversal
//! and the error is handed back by `execute` unchanged.

use crate::group::{Group, StencilMode};
use crate::instance::{InstanceBatched, InstanceBillboarded, InstanceSingle};
use crate::light::Light;
use crate::material::{Material, Shader};

/// Consumer of a [`VisibilitySet`](super::VisibilitySet) traversal.
///
/// Call order for one `execute`:
///
/// 1. `on_start`
/// 2. `on_instance_batched_update` / `on_instance_billboarded_update`, once per
///    batched or billboarded entry
/// 3. for each non-empty group, ascending: `on_start_group`, then the batched,
///    billboarded and single sections, then `on_finish_group`. Each section
///    nests `*_shader_start`, `*_material_start`, the visits,
///    `*_material_finish`, `*_shader_finish`.
/// 4. `on_finish`
#[allow(unused_variables)]
pub trait VisibilityConsumer<M: Material> {
    type Error;

    fn on_start(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_instance_batched_update(&mut self, instance: &dyn InstanceBatched) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_instance_billboarded_update(&mut self, instance: &dyn InstanceBillboarded) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_start_group(&mut self, group: Group) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_instance_batched_shader_start(&mut self, shader: &M::Shader) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_instance_batched_material_start(&mut self, material: &M) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_instance_batched(&mut self, material: &M, instance: &dyn InstanceBatched) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_instance_batched_material_finish(&mut self, material: &M) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_instance_batched_shader_finish(&mut self, shader: &M::Shader) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_instance_billboarded_shader_start(&mut self, shader: &M::Shader) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_instance_billboarded_material_start(&mut self, material: &M) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_instance_billboarded(
        &mut self,
        material: &M,
        instance: &dyn InstanceBillboarded,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_instance_billboarded_material_finish(&mut self, material: &M) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_instance_billboarded_shader_finish(&mut self, shader: &M::Shader) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_instance_single_shader_start(&mut self, shader: &M::Shader) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_instance_single_material_start(&mut self, material: &M) -> Result<(), Self::Error> {
        Ok(())
    }

    /// The geometry source differs from the previous single visit within this material.
    fn on_instance_single_array_start(&mut self, instance: &dyn InstanceSingle) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_instance_single(&mut self, material: &M, instance: &dyn InstanceSingle) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_instance_single_material_finish(&mut self, material: &M) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_instance_single_shader_finish(&mut self, shader: &M::Shader) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_finish_group(&mut self, group: Group) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_finish(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Consumer of a [`SceneLights`](super::SceneLights) traversal.
///
/// Per non-empty group, ascending: `on_start_group`, then per light shader
/// `on_light_shader_start`, the lights (each preceded by
/// `on_light_array_start` when its geometry differs from the previous light
/// under that shader), `on_light_shader_finish`; then `on_finish_group`.
#[allow(unused_variables)]
pub trait LightsConsumer<S: Shader + ?Sized> {
    type Error;

    fn on_start(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_start_group(&mut self, group: Group) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_light_shader_start(&mut self, shader: &S) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_light_array_start(&mut self, light: &dyn Light) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_light(&mut self, shader: &S, light: &dyn Light) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_light_shader_finish(&mut self, shader: &S) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_finish_group(&mut self, group: Group) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_finish(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Consumer of a [`SceneStencils`](super::SceneStencils) traversal.
#[allow(unused_variables)]
pub trait StencilsConsumer {
    type Error;

    /// Receives the mode so the consumer can clear to
    /// [`StencilMode::base_value`] and draw with [`StencilMode::instance_value`].
    fn on_start(&mut self, mode: StencilMode) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_instance_single_array_start(&mut self, instance: &dyn InstanceSingle) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_instance_single(&mut self, instance: &dyn InstanceSingle) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_finish(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
