//! Integration tests for the transform context.
//!
//! Covers scope exclusivity for every pair of sub-scopes, validity of data
//! read through scope handles, and the matrices produced for instances and
//! lights.

mod common;

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use rstest::rstest;

use common::init_logging;
use deferred_engine::instance::ArrayObjectId;
use deferred_engine::light::{LightProjective, LightVolume, ProjectiveLight, SphericalLight};
use deferred_engine::matrices::{Matrices, MatricesObserver, ScopeState};
use deferred_engine::{IdPool, Projection, RenderError, RenderResult};
use glam::{Mat3, Mat4, Vec3, Vec4};

fn view() -> Mat4 {
    Mat4::look_at_rh(Vec3::new(0.0, 2.0, 10.0), Vec3::ZERO, Vec3::Y)
}

fn projection() -> Projection {
    Projection::perspective(FRAC_PI_2, 1.5, 0.5, 200.0).unwrap()
}

struct Lights {
    projective: Arc<ProjectiveLight>,
    spherical: Arc<SphericalLight>,
}

fn lights() -> Lights {
    let pool = IdPool::new();
    let light_projection = Projection::perspective(FRAC_PI_2, 1.0, 0.1, 30.0).unwrap();
    Lights {
        projective: Arc::new(
            ProjectiveLight::new(&pool, ArrayObjectId(1), light_projection).look_at(
                Vec3::new(5.0, 5.0, 0.0),
                Vec3::ZERO,
                Vec3::Y,
            ),
        ),
        spherical: Arc::new(SphericalLight::new(&pool, ArrayObjectId(0), Vec3::new(1.0, 0.0, -2.0), 3.0)),
    }
}

// ============================================================================
// Scope exclusivity
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Sub {
    Instance,
    Projective,
    Volume,
}

impl Sub {
    fn state(self) -> ScopeState {
        match self {
            Sub::Instance => ScopeState::InstanceActive,
            Sub::Projective => ScopeState::ProjectiveLightActive,
            Sub::Volume => ScopeState::VolumeLightActive,
        }
    }
}

fn open(
    observer: &MatricesObserver,
    sub: Sub,
    lights: &Lights,
    body: &mut dyn FnMut() -> RenderResult<()>,
) -> RenderResult<()> {
    match sub {
        Sub::Instance => observer.with_transform(&Mat4::IDENTITY, Mat3::IDENTITY, (), |_, ()| body()),
        Sub::Projective => observer.with_projective_light(&*lights.projective, (), |_, ()| body()),
        Sub::Volume => observer.with_volume_light(&*lights.spherical, (), |_, ()| body()),
    }
}

#[rstest]
#[case(Sub::Instance, Sub::Instance, RenderError::InstanceAlreadyActive)]
#[case(Sub::Instance, Sub::Projective, RenderError::InstanceAlreadyActive)]
#[case(Sub::Instance, Sub::Volume, RenderError::InstanceAlreadyActive)]
#[case(Sub::Projective, Sub::Instance, RenderError::ProjectiveLightAlreadyActive)]
#[case(Sub::Projective, Sub::Projective, RenderError::ProjectiveLightAlreadyActive)]
#[case(Sub::Projective, Sub::Volume, RenderError::ProjectiveLightAlreadyActive)]
#[case(Sub::Volume, Sub::Instance, RenderError::VolumeLightAlreadyActive)]
#[case(Sub::Volume, Sub::Projective, RenderError::VolumeLightAlreadyActive)]
#[case(Sub::Volume, Sub::Volume, RenderError::VolumeLightAlreadyActive)]
fn test_sub_scopes_are_exclusive(#[case] outer: Sub, #[case] inner: Sub, #[case] expected: RenderError) {
    init_logging();
    let m = Matrices::new();
    let lights = lights();

    let mut inner_ran = false;
    let result = m.with_observer(view(), &projection(), (), |o, ()| {
        open(o, outer, &lights, &mut || {
            let nested = open(o, inner, &lights, &mut || {
                inner_ran = true;
                Ok(())
            });
            assert_eq!(nested, Err(expected.clone()));
            assert_eq!(m.state(), outer.state());
            Ok(())
        })?;
        assert_eq!(m.state(), ScopeState::ObserverActive);
        Ok::<_, RenderError>(())
    });

    assert_eq!(result, Ok(()));
    assert!(!inner_ran);
    assert_eq!(m.state(), ScopeState::Idle);
}

#[rstest]
#[case::observer(None)]
#[case::instance(Some(Sub::Instance))]
#[case::projective(Some(Sub::Projective))]
#[case::volume(Some(Sub::Volume))]
fn test_nested_observer_is_rejected(#[case] sub: Option<Sub>) {
    let m = Matrices::new();
    let lights = lights();

    let result: RenderResult<()> = m.with_observer(view(), &projection(), (), |o, ()| {
        let nested = || m.with_observer(Mat4::IDENTITY, &projection(), (), |_, ()| Ok(()));
        let error = match sub {
            None => nested(),
            Some(sub) => {
                let mut error = Ok(());
                open(o, sub, &lights, &mut || {
                    error = nested();
                    Ok(())
                })?;
                error
            }
        };
        assert_eq!(error, Err(RenderError::ObserverAlreadyActive));

        // The rejected call wrote nothing.
        assert_eq!(o.view()?, view());
        Ok(())
    });

    assert_eq!(result, Ok(()));
    assert_eq!(m.state(), ScopeState::Idle);
}

#[test]
fn test_second_transform_inside_transform() {
    let m = Matrices::new();
    let model = Mat4::from_translation(Vec3::new(3.0, 0.0, 0.0));

    let result = m.with_observer(view(), &projection(), (), |o, ()| {
        o.with_transform(&model, Mat3::IDENTITY, (), |i, ()| {
            let second = o.with_transform(&Mat4::from_scale(Vec3::splat(9.0)), Mat3::IDENTITY, (), |_, ()| {
                Ok::<_, RenderError>(())
            });
            assert_eq!(second, Err(RenderError::InstanceAlreadyActive));

            // The outer instance is intact.
            assert_eq!(m.state(), ScopeState::InstanceActive);
            assert_eq!(i.model()?, model);
            assert_eq!(i.model_view()?, view() * model);
            Ok::<_, RenderError>(())
        })?;

        // And the observer can open a fresh sub-scope afterwards.
        o.with_transform(&Mat4::IDENTITY, Mat3::IDENTITY, (), |i, ()| {
            assert_eq!(i.model_view()?, view());
            Ok::<_, RenderError>(())
        })
    });

    assert_eq!(result, Ok(()));
    assert_eq!(m.state(), ScopeState::Idle);
}

// ============================================================================
// Scope data validity
// ============================================================================

#[test]
fn test_read_before_observer_fails() {
    let m = Matrices::new();
    assert_eq!(
        m.current_observer().map(|_| ()),
        Err(RenderError::ScopeInactive { scope: "Observer" })
    );
}

#[test]
fn test_read_after_observer_fails() {
    let m = Matrices::new();
    let escaped = m
        .with_observer(view(), &projection(), (), |o, ()| Ok::<_, RenderError>(o.clone()))
        .unwrap();

    let inactive = Err(RenderError::ScopeInactive { scope: "Observer" });
    assert_eq!(escaped.view().map(|_| ()), inactive);
    assert_eq!(escaped.projection_matrix().map(|_| ()), inactive);
    assert_eq!(escaped.view_rays().map(|_| ()), inactive);
    assert_eq!(escaped.depth_coefficient().map(|_| ()), inactive);
    assert!(m.current_observer().is_err());

    // A new observer scope does not revive an old handle.
    m.with_observer(view(), &projection(), (), |o, ()| {
        assert!(escaped.view().is_err());
        assert!(o.view().is_ok());
        assert!(m.current_observer()?.view().is_ok());
        Ok::<_, RenderError>(())
    })
    .unwrap();
}

#[test]
fn test_reads_inside_observer_are_consistent() {
    let m = Matrices::new();
    let p = projection();
    m.with_observer(view(), &p, 42, |o, answer| {
        assert_eq!(answer, 42);
        assert_eq!(o.view()?, view());
        assert!(o.view_inverse()?.abs_diff_eq(view().inverse(), 1e-6));
        assert_eq!(o.projection()?, p);
        assert_eq!(o.projection_matrix()?, p.matrix());
        assert!((o.projection_matrix()? * o.projection_inverse()?).abs_diff_eq(Mat4::IDENTITY, 1e-4));
        assert_eq!(o.depth_coefficient()?, p.depth_coefficient());

        let rays = o.view_rays()?;
        assert_eq!(o.view_rays()?, rays);

        let uniforms = o.uniforms()?;
        assert_eq!(uniforms.view, view());
        assert_eq!(uniforms.depth, Vec4::new(p.depth_coefficient(), 0.5, 200.0, 0.0));
        Ok::<_, RenderError>(())
    })
    .unwrap();
}

#[test]
fn test_body_error_is_returned_and_scopes_close() {
    #[derive(Debug, PartialEq)]
    enum DrawError {
        Render(RenderError),
        Device,
    }

    impl From<RenderError> for DrawError {
        fn from(e: RenderError) -> Self {
            DrawError::Render(e)
        }
    }

    let m = Matrices::new();
    let lights = lights();
    let result = m.with_observer(view(), &projection(), (), |o, ()| {
        o.with_volume_light(&*lights.spherical, (), |_, ()| Err::<(), _>(DrawError::Device))
    });
    assert_eq!(result, Err(DrawError::Device));
    assert_eq!(m.state(), ScopeState::Idle);

    // Usage errors travel through the caller's error type.
    let result: Result<(), DrawError> = m.with_observer(view(), &projection(), (), |_, ()| {
        m.with_observer(view(), &projection(), (), |_, ()| Ok(()))
    });
    assert_eq!(result, Err(DrawError::Render(RenderError::ObserverAlreadyActive)));
    assert_eq!(m.state(), ScopeState::Idle);
}

// ============================================================================
// Matrices
// ============================================================================

#[test]
fn test_view_rays_reconstruct_eye_positions() {
    let m = Matrices::new();
    let p = projection();
    m.with_observer(view(), &p, (), |o, ()| {
        let rays = o.view_rays()?;
        let clip = o.projection_matrix()?;

        for eye in [Vec3::new(1.0, -2.0, -7.0), Vec3::new(-30.0, 12.0, -150.0), Vec3::new(0.0, 0.0, -1.0)] {
            let ndc = clip.project_point3(eye);
            let u = ndc.x * 0.5 + 0.5;
            let v = ndc.y * 0.5 + 0.5;

            let lerp = |a: Vec3, b: Vec3, c: Vec3, d: Vec3| {
                let bottom = a.lerp(b, u);
                let top = c.lerp(d, u);
                bottom.lerp(top, v)
            };
            let origin = lerp(rays.x0y0.origin, rays.x1y0.origin, rays.x0y1.origin, rays.x1y1.origin);
            let direction = lerp(
                rays.x0y0.direction,
                rays.x1y0.direction,
                rays.x0y1.direction,
                rays.x1y1.direction,
            );

            let rebuilt = origin + direction * eye.z;
            assert!(rebuilt.abs_diff_eq(eye, 1e-3), "{rebuilt} != {eye}");
        }
        Ok::<_, RenderError>(())
    })
    .unwrap();
}

#[test]
fn test_projective_light_matrices() {
    let m = Matrices::new();
    let lights = lights();
    let light = &*lights.projective;

    m.with_observer(view(), &projection(), (), |o, ()| {
        o.with_projective_light(light, (), |p, ()| {
            assert_eq!(p.light_view()?, light.view());
            assert_eq!(p.light_projection()?, *light.projection());
            assert_eq!(p.model_view()?, view() * light.transform());

            // A world point seen by the observer lands where the light sees it.
            let world = Vec3::new(0.5, 0.0, 0.5);
            let eye = view().transform_point3(world);
            let via_eye = p.eye_to_light_clip()?.project_point3(eye);
            let direct = (p.light_projection_matrix()? * p.light_view()?).project_point3(world);
            assert!(via_eye.abs_diff_eq(direct, 1e-4));
            assert!(via_eye.z > 0.0 && via_eye.z < 1.0);
            Ok::<_, RenderError>(())
        })
    })
    .unwrap();
}

#[test]
fn test_volume_light_matrices() {
    let m = Matrices::new();
    let lights = lights();
    let light = &*lights.spherical;

    m.with_observer(view(), &projection(), (), |o, ()| {
        o.with_volume_light(light, (), |v, ()| {
            let model_view = view() * light.transform();
            assert_eq!(v.model_view()?, model_view);
            let expected = Mat3::from_mat4(model_view).inverse().transpose();
            assert!(v.normal()?.abs_diff_eq(expected, 1e-5));
            Ok::<_, RenderError>(())
        })
    })
    .unwrap();
}

#[test]
fn test_instance_scope_uses_instance_matrices() {
    use deferred_engine::instance::InstanceSingleStatic;
    use deferred_engine::transform::Transform;

    let pool = IdPool::new();
    let uv = Mat3::from_scale(glam::Vec2::new(2.0, 2.0));
    let instance = InstanceSingleStatic::new(
        &pool,
        ArrayObjectId(0),
        Transform::from_translation_scale(Vec3::new(0.0, 1.0, 0.0), 2.0),
    )
    .with_uv_matrix(uv);

    let m = Matrices::new();
    m.with_observer(view(), &projection(), (), |o, ()| {
        o.with_instance(&instance, (), |i, ()| {
            assert_eq!(i.uv()?, uv);
            let model_view = i.model_view()?;
            let origin = model_view.transform_point3(Vec3::ZERO);
            assert!(origin.abs_diff_eq(view().transform_point3(Vec3::Y), 1e-5));
            // Uniform scale leaves normals pointing the same way, only shorter.
            let n = i.normal()? * Vec3::Y;
            let expected = Mat3::from_mat4(view()) * Vec3::Y;
            assert!(n.normalize().abs_diff_eq(expected.normalize(), 1e-5));
            Ok::<_, RenderError>(())
        })
    })
    .unwrap();
}

#[test]
fn test_unchecked_projection_is_rejected() {
    let m = Matrices::new();
    let degenerate = Projection::Perspective {
        horizontal_fov: FRAC_PI_2,
        aspect: 1.0,
        near: 0.0,
        far: 100.0,
    };

    let mut ran = false;
    let result = m.with_observer(view(), &degenerate, (), |_, ()| {
        ran = true;
        Ok::<_, RenderError>(())
    });
    assert!(matches!(result, Err(RenderError::InvalidProjection(_))));
    assert!(!ran);
    assert_eq!(m.state(), ScopeState::Idle);
    assert!(m.current_observer().is_err());

    // A light carrying the same projection is rejected inside a valid observer.
    let pool = IdPool::new();
    let mut light = ProjectiveLight::new(&pool, ArrayObjectId(1), projection());
    light.projection = degenerate;
    m.with_observer(view(), &projection(), (), |o, ()| {
        let opened = o.with_projective_light(&light, (), |_, ()| Ok::<_, RenderError>(()));
        assert!(matches!(opened, Err(RenderError::InvalidProjection(_))));
        assert_eq!(m.state(), ScopeState::ObserverActive);

        // The observer is still usable.
        assert!(o.view_rays()?.x0y0.direction.is_finite());
        o.with_volume_light(&*lights().spherical, (), |_, ()| Ok::<_, RenderError>(()))
    })
    .unwrap();
    assert_eq!(m.state(), ScopeState::Idle);
}
