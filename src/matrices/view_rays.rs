//! View-frustum corner rays for position reconstruction.
//!
//! Given a pixel's eye-space depth `z` (read back from a depth buffer), its
//! eye-space position is `origin + direction * z`, with `origin` and
//! `direction` bilinearly interpolated from the four corner rays.

use glam::{Mat4, Vec3, Vec4};

/// One corner ray. `direction.z` is always `1`, and `origin.z` is always `0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewRay {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl ViewRay {
    /// The eye-space point on this ray with the given eye-space depth.
    pub fn at_depth(&self, eye_z: f32) -> Vec3 {
        self.origin + self.direction * eye_z
    }
}

/// Rays through the four screen corners, `x0` left, `x1` right, `y0` bottom, `y1` top.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewRays {
    pub x0y0: ViewRay,
    pub x1y0: ViewRay,
    pub x0y1: ViewRay,
    pub x1y1: ViewRay,
}

impl ViewRays {
    /// Compute the rays from an inverse projection matrix.
    pub fn from_inverse_projection(inverse: Mat4) -> Self {
        Self {
            x0y0: corner_ray(inverse, -1.0, -1.0),
            x1y0: corner_ray(inverse, 1.0, -1.0),
            x0y1: corner_ray(inverse, -1.0, 1.0),
            x1y1: corner_ray(inverse, 1.0, 1.0),
        }
    }

    /// In order `x0y0, x1y0, x0y1, x1y1`.
    pub fn corners(&self) -> [ViewRay; 4] {
        [self.x0y0, self.x1y0, self.x0y1, self.x1y1]
    }

    /// Origins as padded vectors, for uniform upload.
    pub fn origins(&self) -> [Vec4; 4] {
        self.corners().map(|r| r.origin.extend(0.0))
    }

    /// Directions as padded vectors, for uniform upload.
    pub fn directions(&self) -> [Vec4; 4] {
        self.corners().map(|r| r.direction.extend(0.0))
    }
}

fn corner_ray(inverse: Mat4, x: f32, y: f32) -> ViewRay {
    let near = inverse.project_point3(Vec3::new(x, y, 0.0));
    let far = inverse.project_point3(Vec3::new(x, y, 1.0));
    let direction = (far - near) / (far.z - near.z);
    ViewRay {
        origin: near - direction * near.z,
        direction,
    }
}
