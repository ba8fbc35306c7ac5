//! Observer and light projections

use crate::error::{RenderError, RenderResult};
use glam::{Mat4, Vec4};

/// Projection from eye space to clip space.
///
/// All variants produce right-handed matrices with clip-space depth in
/// `[0, 1]`, matching `glam`'s `*_rh` constructors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Symmetric perspective described by its horizontal field of view.
    Perspective {
        horizontal_fov: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    /// Perspective with arbitrary extents on the near plane.
    Frustum {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    },
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Perspective {
            horizontal_fov: std::f32::consts::FRAC_PI_2,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

fn check_depth_range(near: f32, far: f32, perspective: bool) -> RenderResult<()> {
    if perspective && !(near > 0.0) {
        return Err(RenderError::InvalidProjection(format!(
            "near plane must be positive, got {near}"
        )));
    }
    if !(far > near) {
        return Err(RenderError::InvalidProjection(format!(
            "far plane ({far}) must lie beyond near plane ({near})"
        )));
    }
    Ok(())
}

fn check_fov(fov: f32) -> RenderResult<()> {
    if fov > 0.0 && fov < std::f32::consts::PI {
        Ok(())
    } else {
        Err(RenderError::InvalidProjection(format!(
            "field of view must be in (0, pi), got {fov}"
        )))
    }
}

fn check_aspect(aspect: f32) -> RenderResult<()> {
    if aspect > 0.0 && aspect.is_finite() {
        Ok(())
    } else {
        Err(RenderError::InvalidProjection(format!(
            "aspect ratio must be positive, got {aspect}"
        )))
    }
}

fn check_extents(left: f32, right: f32, bottom: f32, top: f32) -> RenderResult<()> {
    if right > left && top > bottom {
        Ok(())
    } else {
        Err(RenderError::InvalidProjection(format!(
            "degenerate extents [{left}, {right}] x [{bottom}, {top}]"
        )))
    }
}

/// Right-handed off-center perspective matrix with depth in `[0, 1]`.
fn frustum_rh(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let width = right - left;
    let height = top - bottom;
    let depth = near - far;
    Mat4::from_cols(
        Vec4::new(2.0 * near / width, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * near / height, 0.0, 0.0),
        Vec4::new((right + left) / width, (top + bottom) / height, far / depth, -1.0),
        Vec4::new(0.0, 0.0, near * far / depth, 0.0),
    )
}

impl Projection {
    /// Perspective projection from a horizontal field of view in radians.
    pub fn perspective(horizontal_fov: f32, aspect: f32, near: f32, far: f32) -> RenderResult<Self> {
        check_fov(horizontal_fov)?;
        check_aspect(aspect)?;
        check_depth_range(near, far, true)?;
        Ok(Projection::Perspective {
            horizontal_fov,
            aspect,
            near,
            far,
        })
    }

    pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> RenderResult<Self> {
        check_extents(left, right, bottom, top)?;
        check_depth_range(near, far, true)?;
        Ok(Projection::Frustum {
            left,
            right,
            bottom,
            top,
            near,
            far,
        })
    }

    /// Centered orthographic projection of the given width and height.
    pub fn orthographic(width: f32, height: f32, near: f32, far: f32) -> RenderResult<Self> {
        let half_w = width / 2.0;
        let half_h = height / 2.0;
        check_extents(-half_w, half_w, -half_h, half_h)?;
        check_depth_range(near, far, false)?;
        Ok(Projection::Orthographic {
            left: -half_w,
            right: half_w,
            bottom: -half_h,
            top: half_h,
            near,
            far,
        })
    }

    /// Re-run the range checks of the constructors.
    ///
    /// Variants can be built directly from their fields, bypassing the
    /// checked constructors, so scopes validate before deriving matrices.
    pub fn validate(&self) -> RenderResult<()> {
        match *self {
            Projection::Perspective {
                horizontal_fov,
                aspect,
                near,
                far,
            } => {
                check_fov(horizontal_fov)?;
                check_aspect(aspect)?;
                check_depth_range(near, far, true)
            }
            Projection::Frustum {
                left,
                right,
                bottom,
                top,
                near,
                far,
            } => {
                check_extents(left, right, bottom, top)?;
                check_depth_range(near, far, true)
            }
            Projection::Orthographic {
                left,
                right,
                bottom,
                top,
                near,
                far,
            } => {
                check_extents(left, right, bottom, top)?;
                check_depth_range(near, far, false)
            }
        }
    }

    pub fn matrix(&self) -> Mat4 {
        match *self {
            Projection::Perspective { near, far, .. } => {
                let (left, right, bottom, top) = self.near_extents();
                frustum_rh(left, right, bottom, top, near, far)
            }
            Projection::Frustum {
                left,
                right,
                bottom,
                top,
                near,
                far,
            } => frustum_rh(left, right, bottom, top, near, far),
            Projection::Orthographic {
                left,
                right,
                bottom,
                top,
                near,
                far,
            } => Mat4::orthographic_rh(left, right, bottom, top, near, far),
        }
    }

    pub fn near(&self) -> f32 {
        match self {
            Projection::Perspective { near, .. }
            | Projection::Frustum { near, .. }
            | Projection::Orthographic { near, .. } => *near,
        }
    }

    pub fn far(&self) -> f32 {
        match self {
            Projection::Perspective { far, .. }
            | Projection::Frustum { far, .. }
            | Projection::Orthographic { far, .. } => *far,
        }
    }

    /// `(x_min, x_max, y_min, y_max)` on the near plane.
    fn near_extents(&self) -> (f32, f32, f32, f32) {
        match *self {
            Projection::Perspective {
                horizontal_fov,
                aspect,
                near,
                ..
            } => {
                let x_max = near * (horizontal_fov * 0.5).tan();
                let y_max = x_max / aspect;
                (-x_max, x_max, -y_max, y_max)
            }
            Projection::Frustum {
                left,
                right,
                bottom,
                top,
                ..
            }
            | Projection::Orthographic {
                left,
                right,
                bottom,
                top,
                ..
            } => (left, right, bottom, top),
        }
    }

    /// `(x_min, x_max, y_min, y_max)` on the far plane.
    fn far_extents(&self) -> (f32, f32, f32, f32) {
        let (x0, x1, y0, y1) = self.near_extents();
        match self {
            Projection::Orthographic { .. } => (x0, x1, y0, y1),
            _ => {
                let s = self.far() / self.near();
                (x0 * s, x1 * s, y0 * s, y1 * s)
            }
        }
    }

    pub fn near_x_minimum(&self) -> f32 {
        self.near_extents().0
    }

    pub fn near_x_maximum(&self) -> f32 {
        self.near_extents().1
    }

    pub fn near_y_minimum(&self) -> f32 {
        self.near_extents().2
    }

    pub fn near_y_maximum(&self) -> f32 {
        self.near_extents().3
    }

    pub fn far_x_minimum(&self) -> f32 {
        self.far_extents().0
    }

    pub fn far_x_maximum(&self) -> f32 {
        self.far_extents().1
    }

    pub fn far_y_minimum(&self) -> f32 {
        self.far_extents().2
    }

    pub fn far_y_maximum(&self) -> f32 {
        self.far_extents().3
    }

    /// Coefficient used by shaders to linearize logarithmic depth.
    pub fn depth_coefficient(&self) -> f32 {
        2.0 / (self.far() + 1.0).log2()
    }

    pub fn set_near(&mut self, value: f32) -> RenderResult<()> {
        let perspective = !matches!(self, Projection::Orthographic { .. });
        check_depth_range(value, self.far(), perspective)?;
        match self {
            Projection::Perspective { near, .. }
            | Projection::Frustum { near, .. }
            | Projection::Orthographic { near, .. } => *near = value,
        }
        Ok(())
    }

    pub fn set_far(&mut self, value: f32) -> RenderResult<()> {
        let perspective = !matches!(self, Projection::Orthographic { .. });
        check_depth_range(self.near(), value, perspective)?;
        match self {
            Projection::Perspective { far, .. }
            | Projection::Frustum { far, .. }
            | Projection::Orthographic { far, .. } => *far = value,
        }
        Ok(())
    }

    /// Update the aspect ratio. Only perspective projections carry one; others ignore it.
    pub fn set_aspect(&mut self, value: f32) -> RenderResult<()> {
        check_aspect(value)?;
        if let Projection::Perspective { aspect, .. } = self {
            *aspect = value;
        }
        Ok(())
    }

    /// Update the horizontal field of view. Only perspective projections carry one.
    pub fn set_horizontal_fov(&mut self, value: f32) -> RenderResult<()> {
        check_fov(value)?;
        if let Projection::Perspective { horizontal_fov, .. } = self {
            *horizontal_fov = value;
        }
        Ok(())
    }
}
