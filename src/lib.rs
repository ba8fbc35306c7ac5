//! Deferred Engine - the scene side of a deferred renderer
//!
//! This crate decides *what* is drawn each frame and *with which matrices*;
//! issuing the draw calls is left to the rendering layer, which plugs in
//! through consumer traits.
//!
//! # Features
//! - Per-frame visibility registries for opaque, depth-only, light and
//!   stencil geometry, replayed grouped by render group, shader, material and
//!   geometry source
//! - Up to 15 render groups, masked through the stencil buffer
//! - Batched and billboarded instances with a per-frame update step
//! - A transform context producing observer, instance and light matrices
//!   under strictly nested, runtime-checked scopes
//! - A shared identifier pool for instances, materials, shaders and lights
//!
//! # Example
//!
//! ```
//! use deferred_engine::prelude::*;
//! use std::sync::Arc;
//!
//! let pool = IdPool::new();
//! let shader = Arc::new(ShaderProgram::new(&pool, "basic"));
//! let material = Arc::new(MaterialInstance::new(&pool, shader, SurfaceParameters::default()));
//! let cube = Arc::new(InstanceSingleStatic::new(&pool, ArrayObjectId(0), Transform::default()));
//!
//! let mut opaques = VisibilitySet::opaque();
//! opaques.add_single_in_group(cube, material, 2).unwrap();
//!
//! struct Draw<'a>(&'a MatricesObserver, usize);
//! impl VisibilityConsumer<Arc<MaterialInstance<SurfaceParameters>>> for Draw<'_> {
//!     type Error = RenderError;
//!     fn on_instance_single(
//!         &mut self,
//!         _material: &Arc<MaterialInstance<SurfaceParameters>>,
//!         instance: &dyn InstanceSingle,
//!     ) -> Result<(), RenderError> {
//!         self.0.with_instance(instance, (), |m, ()| {
//!             let _uniforms = m.uniforms()?;
//!             self.1 += 1;
//!             Ok(())
//!         })
//!     }
//! }
//!
//! let matrices = Matrices::new();
//! let drawn = matrices
//!     .with_observer(glam::Mat4::IDENTITY, &Projection::default(), (), |observer, ()| {
//!         let mut draw = Draw(observer, 0);
//!         opaques.execute(&mut draw)?;
//!         Ok::<_, RenderError>(draw.1)
//!     })
//!     .unwrap();
//! assert_eq!(drawn, 1);
//! ```

pub mod error;
pub mod frame;
pub mod group;
pub mod id;
pub mod instance;
pub mod light;
pub mod material;
pub mod matrices;
pub mod projection;
pub mod transform;
pub mod visibility;

pub use error::{RenderError, RenderResult};
pub use frame::{FrameConfig, FrameResource, FrameScenes};
pub use group::{check_valid_group, Group, StencilMode, ALLOW_BIT, GROUP_BITS};
pub use id::{Id, IdPool};
pub use matrices::Matrices;
pub use projection::Projection;
pub use visibility::{SceneLights, SceneStencils, VisibilitySet};

/// Commonly used types
pub mod prelude {
    pub use crate::error::{RenderError, RenderResult};
    pub use crate::frame::{FrameConfig, FrameScenes};
    pub use crate::group::{Group, StencilMode};
    pub use crate::id::{Id, IdPool};
    pub use crate::instance::{
        ArrayObjectId, Instance, InstanceBatched, InstanceBatchedDynamic, InstanceBillboarded,
        InstanceBillboardedDynamic, InstanceSingle, InstanceSingleStatic,
    };
    pub use crate::light::{DirectionalLight, Light, LightProjective, LightVolume, ProjectiveLight, SphericalLight};
    pub use crate::material::{Material, MaterialInstance, Shader, ShaderProgram, SurfaceParameters};
    pub use crate::matrices::{
        Matrices, MatricesInstance, MatricesObserver, MatricesProjectiveLight, MatricesVolumeLight, ScopeState,
    };
    pub use crate::projection::Projection;
    pub use crate::transform::{Transform, TransformIdentity, TransformSource};
    pub use crate::visibility::{LightsConsumer, SceneLights, SceneStencils, StencilsConsumer, VisibilityConsumer, VisibilitySet};
}
