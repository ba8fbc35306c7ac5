//! Light types
//!
//! Deferred lights are drawn as geometry: a volume (sphere, frustum) covering
//! the lit region, or a full-screen quad for lights with unbounded reach.
//! Like instances, every light carries an [`Id`] and the [`ArrayObjectId`] of
//! the geometry it is drawn with.

use crate::id::{Id, IdPool};
use crate::instance::ArrayObjectId;
use crate::projection::Projection;
use crate::transform::Transform;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3, Vec4};

/// Anything that can be registered as a visible light.
pub trait Light: Send + Sync {
    fn light_id(&self) -> Id;

    /// Geometry drawn to cover the lit region.
    fn array_object(&self) -> ArrayObjectId;

    /// Convert to GPU data format
    fn gpu_data(&self) -> GpuLightData;
}

/// A light drawn as a transformed volume.
pub trait LightVolume: Light {
    /// Volume-to-world matrix.
    fn transform(&self) -> Mat4;
}

/// A light that projects along a frustum, such as a spot light with a texture.
pub trait LightProjective: LightVolume {
    fn projection(&self) -> &Projection;

    /// World-to-light matrix. Defaults to the inverse of the volume transform.
    fn view(&self) -> Mat4 {
        self.transform().inverse()
    }
}

/// Point light lighting a sphere of the given radius
#[derive(Debug, Clone)]
pub struct SphericalLight {
    id: Id,
    array: ArrayObjectId,
    pub position: Vec3,
    pub radius: f32,
    pub color: Vec3,
    pub intensity: f32,
}

impl SphericalLight {
    pub fn new(pool: &IdPool, sphere: ArrayObjectId, position: Vec3, radius: f32) -> Self {
        Self {
            id: pool.fresh_id(),
            array: sphere,
            position,
            radius,
            color: Vec3::ONE,
            intensity: 1.0,
        }
    }

    pub fn with_color(mut self, color: Vec3, intensity: f32) -> Self {
        self.color = color;
        self.intensity = intensity;
        self
    }
}

impl Light for SphericalLight {
    fn light_id(&self) -> Id {
        self.id
    }

    fn array_object(&self) -> ArrayObjectId {
        self.array
    }

    fn gpu_data(&self) -> GpuLightData {
        GpuLightData {
            position: self.position.extend(self.radius),
            color_intensity: self.color.extend(self.intensity),
            direction_type: Vec4::new(0.0, 0.0, 0.0, 0.0), // type 0 = spherical
        }
    }
}

impl LightVolume for SphericalLight {
    fn transform(&self) -> Mat4 {
        Transform::from_translation_scale(self.position, self.radius).matrix()
    }
}

/// Light projected along a frustum from a position and orientation.
///
/// The volume transform carries no scale: the frustum geometry is expected
/// to be built from the projection itself.
#[derive(Debug, Clone)]
pub struct ProjectiveLight {
    id: Id,
    array: ArrayObjectId,
    pub position: Vec3,
    pub orientation: Quat,
    pub projection: Projection,
    pub color: Vec3,
    pub intensity: f32,
}

impl ProjectiveLight {
    pub fn new(pool: &IdPool, frustum: ArrayObjectId, projection: Projection) -> Self {
        Self {
            id: pool.fresh_id(),
            array: frustum,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            projection,
            color: Vec3::ONE,
            intensity: 1.0,
        }
    }

    /// Place the light at `position`, looking at `target`.
    pub fn look_at(mut self, position: Vec3, target: Vec3, up: Vec3) -> Self {
        let mut transform = Transform::from_translation(position);
        transform.look_at(target, up);
        self.position = position;
        self.orientation = transform.orientation;
        self
    }

    pub fn with_color(mut self, color: Vec3, intensity: f32) -> Self {
        self.color = color;
        self.intensity = intensity;
        self
    }

    pub fn direction(&self) -> Vec3 {
        self.orientation * -Vec3::Z
    }
}

impl Light for ProjectiveLight {
    fn light_id(&self) -> Id {
        self.id
    }

    fn array_object(&self) -> ArrayObjectId {
        self.array
    }

    fn gpu_data(&self) -> GpuLightData {
        GpuLightData {
            position: self.position.extend(self.projection.far()),
            color_intensity: self.color.extend(self.intensity),
            direction_type: self.direction().extend(1.0), // type 1 = projective
        }
    }
}

impl LightVolume for ProjectiveLight {
    fn transform(&self) -> Mat4 {
        Transform::from_translation_orientation(self.position, self.orientation).matrix()
    }
}

impl LightProjective for ProjectiveLight {
    fn projection(&self) -> &Projection {
        &self.projection
    }
}

/// Directional light (like the sun), drawn as a full-screen quad
#[derive(Debug, Clone)]
pub struct DirectionalLight {
    id: Id,
    array: ArrayObjectId,
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl DirectionalLight {
    pub fn new(pool: &IdPool, quad: ArrayObjectId, direction: Vec3) -> Self {
        Self {
            id: pool.fresh_id(),
            array: quad,
            direction: direction.normalize(),
            color: Vec3::ONE,
            intensity: 1.0,
        }
    }

    pub fn with_color(mut self, color: Vec3, intensity: f32) -> Self {
        self.color = color;
        self.intensity = intensity;
        self
    }
}

impl Light for DirectionalLight {
    fn light_id(&self) -> Id {
        self.id
    }

    fn array_object(&self) -> ArrayObjectId {
        self.array
    }

    fn gpu_data(&self) -> GpuLightData {
        GpuLightData {
            position: Vec4::new(0.0, 0.0, 0.0, f32::INFINITY),
            color_intensity: self.color.extend(self.intensity),
            direction_type: self.direction.extend(2.0), // type 2 = directional
        }
    }
}

/// GPU-friendly light data structure
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuLightData {
    /// xyz = position, w = radius
    pub position: Vec4,
    /// xyz = color, w = intensity
    pub color_intensity: Vec4,
    /// xyz = direction, w = light type (0=spherical, 1=projective, 2=directional)
    pub direction_type: Vec4,
}
