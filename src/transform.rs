//! Object transforms

use glam::{Mat4, Quat, Vec3};

/// Anything that can produce an object-space to world-space matrix.
pub trait TransformSource {
    fn transform_matrix(&self) -> Mat4;
}

/// The identity transform
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransformIdentity;

impl TransformSource for TransformIdentity {
    fn transform_matrix(&self) -> Mat4 {
        Mat4::IDENTITY
    }
}

impl TransformSource for Mat4 {
    fn transform_matrix(&self) -> Mat4 {
        *self
    }
}

/// Scale, then orientation, then translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub orientation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    pub fn from_translation_scale(translation: Vec3, scale: f32) -> Self {
        Self {
            translation,
            scale: Vec3::splat(scale),
            ..Default::default()
        }
    }

    pub fn from_translation_orientation(translation: Vec3, orientation: Quat) -> Self {
        Self {
            translation,
            orientation,
            ..Default::default()
        }
    }

    /// Get the object-to-world matrix for this transform
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.orientation, self.translation)
    }

    /// Translate by an offset
    pub fn translate(&mut self, offset: Vec3) {
        self.translation += offset;
    }

    /// Rotate around an axis
    pub fn rotate_axis(&mut self, axis: Vec3, angle: f32) {
        let delta = Quat::from_axis_angle(axis, angle);
        self.orientation = delta * self.orientation;
    }

    /// Point the local -Z axis at a target position
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = (target - self.translation).normalize();
        let right = up.cross(-forward).normalize();
        let up = (-forward).cross(right);

        self.orientation = Quat::from_mat3(&glam::Mat3::from_cols(right, up, -forward));
    }
}

impl TransformSource for Transform {
    fn transform_matrix(&self) -> Mat4 {
        self.matrix()
    }
}
