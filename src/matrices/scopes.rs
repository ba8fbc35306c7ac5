//! Scope handles.
//!
//! A handle is tied to the scope that created it by a generation number.
//! Reads through a handle whose scope has closed (or been replaced by a
//! later scope of the same kind) fail.

use super::{ObserverData, ScopeState, Shared, ViewRays};
use crate::error::{RenderError, RenderResult};
use crate::instance::InstanceSingle;
use crate::light::{LightProjective, LightVolume};
use crate::projection::Projection;
use crate::transform::TransformSource;
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec4};
use std::rc::Rc;

/// Observer uniform data for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ObserverUniforms {
    pub view: Mat4,
    pub proj: Mat4,
    pub inv_view: Mat4,
    pub inv_proj: Mat4,
    /// x = depth coefficient, y = near, z = far
    pub depth: Vec4,
    pub ray_origins: [Vec4; 4],
    pub ray_directions: [Vec4; 4],
}

/// Per-instance uniform data for GPU. 3x3 matrices are stored as padded columns.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct InstanceUniforms {
    pub model_view: Mat4,
    pub normal: [Vec4; 3],
    pub uv: [Vec4; 3],
}

fn padded_columns(m: Mat3) -> [Vec4; 3] {
    [m.x_axis.extend(0.0), m.y_axis.extend(0.0), m.z_axis.extend(0.0)]
}

/// Read access to the active observer, and the entry point for sub-scopes.
#[derive(Debug, Clone)]
pub struct MatricesObserver {
    shared: Rc<Shared>,
    generation: u64,
}

impl MatricesObserver {
    pub(super) fn new(shared: Rc<Shared>, generation: u64) -> Self {
        Self { shared, generation }
    }

    /// Observer data stays readable while a sub-scope is open.
    fn check(&self) -> RenderResult<()> {
        let open = self.shared.state.get() != ScopeState::Idle;
        if open && self.shared.observer_generation.get() == self.generation {
            Ok(())
        } else {
            Err(RenderError::ScopeInactive { scope: "Observer" })
        }
    }

    fn read<R>(&self, f: impl FnOnce(&ObserverData) -> R) -> RenderResult<R> {
        self.check()?;
        Ok(f(&self.shared.observer.borrow()))
    }

    pub fn view(&self) -> RenderResult<Mat4> {
        self.read(|o| o.view)
    }

    pub fn view_inverse(&self) -> RenderResult<Mat4> {
        self.read(|o| o.view_inverse)
    }

    pub fn projection(&self) -> RenderResult<Projection> {
        self.read(|o| o.projection)
    }

    pub fn projection_matrix(&self) -> RenderResult<Mat4> {
        self.read(|o| o.projection_matrix)
    }

    pub fn projection_inverse(&self) -> RenderResult<Mat4> {
        self.read(|o| o.projection_inverse)
    }

    pub fn depth_coefficient(&self) -> RenderResult<f32> {
        self.read(|o| o.depth_coefficient)
    }

    pub fn view_rays(&self) -> RenderResult<ViewRays> {
        self.read(|o| o.view_rays)
    }

    /// Build observer uniform data for shaders
    pub fn uniforms(&self) -> RenderResult<ObserverUniforms> {
        self.read(|o| ObserverUniforms {
            view: o.view,
            proj: o.projection_matrix,
            inv_view: o.view_inverse,
            inv_proj: o.projection_inverse,
            depth: Vec4::new(o.depth_coefficient, o.projection.near(), o.projection.far(), 0.0),
            ray_origins: o.view_rays.origins(),
            ray_directions: o.view_rays.directions(),
        })
    }

    /// Check that a sub-scope may open, let `prepare` fill its data, then enter it.
    ///
    /// If `prepare` fails the state is left unchanged.
    fn open_sub_scope(
        &self,
        next: ScopeState,
        prepare: impl FnOnce(&Shared, &ObserverData) -> RenderResult<()>,
    ) -> RenderResult<(super::ScopeGuard<'_>, u64)> {
        self.check()?;
        self.shared.state.get().check_open_sub_scope()?;

        prepare(&self.shared, &self.shared.observer.borrow())?;
        let generation = Shared::next_generation(&self.shared.sub_generation);
        let guard = self.shared.enter(next, ScopeState::ObserverActive);
        Ok((guard, generation))
    }

    /// Open an instance scope for an object transform and texture matrix.
    ///
    /// Fails with the "already active" error of whichever sub-scope is open.
    pub fn with_transform<S, U, T, E, F>(&self, transform: &S, uv: Mat3, user: U, body: F) -> Result<T, E>
    where
        S: TransformSource + ?Sized,
        F: FnOnce(&MatricesInstance, U) -> Result<T, E>,
        E: From<RenderError>,
    {
        let (_guard, generation) = self.open_sub_scope(ScopeState::InstanceActive, |shared, observer| {
            shared
                .instance
                .borrow_mut()
                .update(observer.view, transform.transform_matrix(), uv);
            Ok(())
        })?;

        let instance = MatricesInstance {
            shared: Rc::clone(&self.shared),
            generation,
        };
        body(&instance, user)
    }

    /// [`with_transform`](Self::with_transform) using an instance's own transform and texture matrix.
    pub fn with_instance<I, U, T, E, F>(&self, instance: &I, user: U, body: F) -> Result<T, E>
    where
        I: InstanceSingle + ?Sized,
        F: FnOnce(&MatricesInstance, U) -> Result<T, E>,
        E: From<RenderError>,
    {
        self.with_transform(&instance.transform(), instance.uv_matrix(), user, body)
    }

    /// Open a projective light scope.
    ///
    /// Fails with [`RenderError::InvalidProjection`] if the light's projection is out of range.
    pub fn with_projective_light<L, U, T, E, F>(&self, light: &L, user: U, body: F) -> Result<T, E>
    where
        L: LightProjective + ?Sized,
        F: FnOnce(&MatricesProjectiveLight, U) -> Result<T, E>,
        E: From<RenderError>,
    {
        let (_guard, generation) = self.open_sub_scope(ScopeState::ProjectiveLightActive, |shared, observer| {
            let projection = *light.projection();
            projection.validate()?;
            let light_view = light.view();
            let light_projection_matrix = projection.matrix();
            let mut data = shared.projective.borrow_mut();
            data.model_view = observer.view * light.transform();
            data.light_view = light_view;
            data.light_projection = projection;
            data.light_projection_matrix = light_projection_matrix;
            data.eye_to_light_clip = light_projection_matrix * light_view * observer.view_inverse;
            Ok(())
        })?;

        let scope = MatricesProjectiveLight {
            shared: Rc::clone(&self.shared),
            generation,
        };
        body(&scope, user)
    }

    /// Open a volume light scope.
    pub fn with_volume_light<L, U, T, E, F>(&self, light: &L, user: U, body: F) -> Result<T, E>
    where
        L: LightVolume + ?Sized,
        F: FnOnce(&MatricesVolumeLight, U) -> Result<T, E>,
        E: From<RenderError>,
    {
        let (_guard, generation) = self.open_sub_scope(ScopeState::VolumeLightActive, |shared, observer| {
            let mut data = shared.volume.borrow_mut();
            data.model_view = observer.view * light.transform();
            data.normal = super::normal_matrix(data.model_view);
            Ok(())
        })?;

        let scope = MatricesVolumeLight {
            shared: Rc::clone(&self.shared),
            generation,
        };
        body(&scope, user)
    }
}

/// Shared validity check for the three sub-scope handles.
fn check_sub_scope(shared: &Shared, generation: u64, expected: ScopeState, scope: &'static str) -> RenderResult<()> {
    if shared.state.get() == expected && shared.sub_generation.get() == generation {
        Ok(())
    } else {
        Err(RenderError::ScopeInactive { scope })
    }
}

/// Read access to the active instance scope.
#[derive(Debug, Clone)]
pub struct MatricesInstance {
    shared: Rc<Shared>,
    generation: u64,
}

impl MatricesInstance {
    fn read<R>(&self, f: impl FnOnce(&super::InstanceData) -> R) -> RenderResult<R> {
        check_sub_scope(&self.shared, self.generation, ScopeState::InstanceActive, "Instance")?;
        Ok(f(&self.shared.instance.borrow()))
    }

    /// Object-to-world matrix.
    pub fn model(&self) -> RenderResult<Mat4> {
        self.read(|i| i.model)
    }

    /// Object-to-eye matrix.
    pub fn model_view(&self) -> RenderResult<Mat4> {
        self.read(|i| i.model_view)
    }

    pub fn normal(&self) -> RenderResult<Mat3> {
        self.read(|i| i.normal)
    }

    pub fn uv(&self) -> RenderResult<Mat3> {
        self.read(|i| i.uv)
    }

    pub fn uniforms(&self) -> RenderResult<InstanceUniforms> {
        self.read(|i| InstanceUniforms {
            model_view: i.model_view,
            normal: padded_columns(i.normal),
            uv: padded_columns(i.uv),
        })
    }
}

/// Read access to the active projective light scope.
#[derive(Debug, Clone)]
pub struct MatricesProjectiveLight {
    shared: Rc<Shared>,
    generation: u64,
}

impl MatricesProjectiveLight {
    fn read<R>(&self, f: impl FnOnce(&super::ProjectiveData) -> R) -> RenderResult<R> {
        check_sub_scope(
            &self.shared,
            self.generation,
            ScopeState::ProjectiveLightActive,
            "Projective light",
        )?;
        Ok(f(&self.shared.projective.borrow()))
    }

    /// Light-volume-to-eye matrix.
    pub fn model_view(&self) -> RenderResult<Mat4> {
        self.read(|p| p.model_view)
    }

    /// World-to-light matrix.
    pub fn light_view(&self) -> RenderResult<Mat4> {
        self.read(|p| p.light_view)
    }

    pub fn light_projection(&self) -> RenderResult<Projection> {
        self.read(|p| p.light_projection)
    }

    pub fn light_projection_matrix(&self) -> RenderResult<Mat4> {
        self.read(|p| p.light_projection_matrix)
    }

    /// Maps eye-space positions of the observer into the light's clip space.
    pub fn eye_to_light_clip(&self) -> RenderResult<Mat4> {
        self.read(|p| p.eye_to_light_clip)
    }
}

/// Read access to the active volume light scope.
#[derive(Debug, Clone)]
pub struct MatricesVolumeLight {
    shared: Rc<Shared>,
    generation: u64,
}

impl MatricesVolumeLight {
    fn read<R>(&self, f: impl FnOnce(&super::VolumeData) -> R) -> RenderResult<R> {
        check_sub_scope(
            &self.shared,
            self.generation,
            ScopeState::VolumeLightActive,
            "Volume light",
        )?;
        Ok(f(&self.shared.volume.borrow()))
    }

    /// Light-volume-to-eye matrix.
    pub fn model_view(&self) -> RenderResult<Mat4> {
        self.read(|v| v.model_view)
    }

    pub fn normal(&self) -> RenderResult<Mat3> {
        self.read(|v| v.normal)
    }
}
