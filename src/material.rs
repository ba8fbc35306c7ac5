//! Shaders and materials as seen by the visibility registries.
//!
//! The registries only need identifiers: a material's own [`Id`] and the
//! [`Id`] of the shader it uses. Everything else about a shader (programs,
//! uniforms) belongs to the rasterization layer. [`Shader`] and [`Material`]
//! are capability traits so that callers can plug in their own handle types;
//! [`ShaderProgram`] and [`MaterialInstance`] are ready-made handles.

use crate::id::{Id, IdPool};
use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use std::sync::Arc;

/// A shader handle.
pub trait Shader {
    fn shader_id(&self) -> Id;
}

/// A material: a shader paired with parameter values for it.
pub trait Material {
    type Shader: Shader + ?Sized;

    fn material_id(&self) -> Id;

    fn shader(&self) -> &Self::Shader;
}

impl<T: Shader + ?Sized> Shader for Arc<T> {
    fn shader_id(&self) -> Id {
        (**self).shader_id()
    }
}

impl<T: Shader + ?Sized> Shader for &T {
    fn shader_id(&self) -> Id {
        (**self).shader_id()
    }
}

impl<T: Material + ?Sized> Material for Arc<T> {
    type Shader = T::Shader;

    fn material_id(&self) -> Id {
        (**self).material_id()
    }

    fn shader(&self) -> &Self::Shader {
        (**self).shader()
    }
}

/// A named shader handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderProgram {
    id: Id,
    name: String,
}

impl ShaderProgram {
    pub fn new(pool: &IdPool, name: &str) -> Self {
        Self {
            id: pool.fresh_id(),
            name: name.to_string(),
        }
    }

    /// Wrap an identifier issued elsewhere.
    pub fn with_id(id: Id, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Shader for ShaderProgram {
    fn shader_id(&self) -> Id {
        self.id
    }
}

/// A material with parameter values of type `P` for a shared [`ShaderProgram`].
#[derive(Debug, Clone)]
pub struct MaterialInstance<P> {
    id: Id,
    shader: Arc<ShaderProgram>,
    parameters: P,
}

impl<P> MaterialInstance<P> {
    pub fn new(pool: &IdPool, shader: Arc<ShaderProgram>, parameters: P) -> Self {
        Self::with_id(pool.fresh_id(), shader, parameters)
    }

    /// Wrap an identifier issued elsewhere.
    pub fn with_id(id: Id, shader: Arc<ShaderProgram>, parameters: P) -> Self {
        Self { id, shader, parameters }
    }

    pub fn parameters(&self) -> &P {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut P {
        &mut self.parameters
    }

    pub fn shader_program(&self) -> &Arc<ShaderProgram> {
        &self.shader
    }
}

impl<P> Material for MaterialInstance<P> {
    type Shader = ShaderProgram;

    fn material_id(&self) -> Id {
        self.id
    }

    fn shader(&self) -> &ShaderProgram {
        &self.shader
    }
}

/// Parameters for the basic deferred surface shader
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceParameters {
    pub albedo: Vec4,
    pub emission: f32,
    pub specular_color: Vec3,
    pub specular_exponent: f32,
}

impl Default for SurfaceParameters {
    fn default() -> Self {
        Self {
            albedo: Vec4::ONE,
            emission: 0.0,
            specular_color: Vec3::ZERO,
            specular_exponent: 64.0,
        }
    }
}

impl SurfaceParameters {
    pub fn with_albedo(mut self, albedo: Vec4) -> Self {
        self.albedo = albedo;
        self
    }

    pub fn with_specular(mut self, color: Vec3, exponent: f32) -> Self {
        self.specular_color = color;
        self.specular_exponent = exponent;
        self
    }

    pub fn with_emission(mut self, emission: f32) -> Self {
        self.emission = emission;
        self
    }

    /// Create a uniform data struct for GPU
    pub fn uniform_data(&self) -> SurfaceUniformData {
        SurfaceUniformData {
            albedo: self.albedo,
            specular: self.specular_color.extend(self.specular_exponent),
            emission: [self.emission, 0.0, 0.0, 0.0],
        }
    }
}

/// Surface parameter uniform data for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SurfaceUniformData {
    pub albedo: Vec4,
    pub specular: Vec4,      // xyz=color, w=exponent
    pub emission: [f32; 4], // x=emission, yzw=padding
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_reports_shader() {
        let pool = IdPool::new();
        let shader = Arc::new(ShaderProgram::new(&pool, "basic"));
        let m0 = MaterialInstance::new(&pool, shader.clone(), SurfaceParameters::default());
        let m1 = MaterialInstance::new(&pool, shader.clone(), SurfaceParameters::default());
        assert_ne!(m0.material_id(), m1.material_id());
        assert_eq!(m0.shader().shader_id(), shader.shader_id());
        assert_eq!(m1.shader().name(), "basic");
    }

    #[test]
    fn test_arc_material_delegates() {
        let pool = IdPool::new();
        let shader = Arc::new(ShaderProgram::new(&pool, "basic"));
        let m = Arc::new(MaterialInstance::new(&pool, shader, ()));
        assert_eq!(Material::material_id(&m), m.material_id());
    }

    #[test]
    fn test_uniform_layout() {
        let data = SurfaceParameters::default().with_emission(0.5).uniform_data();
        assert_eq!(std::mem::size_of::<SurfaceUniformData>(), 48);
        assert_eq!(bytemuck::bytes_of(&data).len(), 48);
        assert_eq!(data.emission[0], 0.5);
    }
}
