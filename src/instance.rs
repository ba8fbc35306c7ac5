//! Renderable instances.
//!
//! Three kinds of instance can be made visible:
//!
//! - **single**: one mesh drawn once with its own transform,
//! - **batched**: one mesh drawn many times, with a per-instance matrix buffer,
//! - **billboarded**: camera-facing sprites with a per-sprite attribute buffer.
//!
//! Batched and billboarded instances carry derived per-frame state that must
//! be refreshed (via [`InstanceBatched::update`] /
//! [`InstanceBillboarded::update`]) before drawing. The registries give the
//! caller a dedicated callback for that, ahead of any draw grouping.

use crate::id::{Id, IdPool};
use crate::transform::{Transform, TransformSource};
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use parking_lot::Mutex;
use std::fmt;

/// Identifies the geometry source (vertex array) an instance is drawn from.
///
/// Consecutive single instances sharing a source need only one bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArrayObjectId(pub u32);

impl fmt::Display for ArrayObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Anything with an instance identifier.
pub trait Instance: Send + Sync {
    fn instance_id(&self) -> Id;
}

/// A mesh drawn once.
pub trait InstanceSingle: Instance {
    fn array_object(&self) -> ArrayObjectId;

    /// Object-to-world matrix.
    fn transform(&self) -> Mat4;

    /// Texture coordinate matrix.
    fn uv_matrix(&self) -> Mat3 {
        Mat3::IDENTITY
    }
}

/// A mesh drawn many times from a per-instance matrix buffer.
pub trait InstanceBatched: Instance {
    fn array_object(&self) -> ArrayObjectId;

    /// Number of instances to draw.
    fn instance_count(&self) -> usize;

    /// True if the matrix buffer is stale.
    fn update_required(&self) -> bool;

    /// Refresh the matrix buffer.
    fn update(&self);
}

/// Camera-facing sprites drawn from a per-sprite attribute buffer.
pub trait InstanceBillboarded: Instance {
    fn array_object(&self) -> ArrayObjectId;

    /// Number of sprites currently enabled.
    fn enabled_count(&self) -> usize;

    /// True if the attribute buffer is stale.
    fn update_required(&self) -> bool;

    /// Refresh the attribute buffer.
    fn update(&self);
}

/// A single instance with a fixed transform.
#[derive(Debug, Clone)]
pub struct InstanceSingleStatic {
    id: Id,
    array: ArrayObjectId,
    transform: Transform,
    uv_matrix: Mat3,
}

impl InstanceSingleStatic {
    pub fn new(pool: &IdPool, array: ArrayObjectId, transform: Transform) -> Self {
        Self::with_id(pool.fresh_id(), array, transform)
    }

    /// Wrap an identifier issued elsewhere.
    pub fn with_id(id: Id, array: ArrayObjectId, transform: Transform) -> Self {
        Self {
            id,
            array,
            transform,
            uv_matrix: Mat3::IDENTITY,
        }
    }

    pub fn with_uv_matrix(mut self, uv_matrix: Mat3) -> Self {
        self.uv_matrix = uv_matrix;
        self
    }
}

impl Instance for InstanceSingleStatic {
    fn instance_id(&self) -> Id {
        self.id
    }
}

impl InstanceSingle for InstanceSingleStatic {
    fn array_object(&self) -> ArrayObjectId {
        self.array
    }

    fn transform(&self) -> Mat4 {
        self.transform.transform_matrix()
    }

    fn uv_matrix(&self) -> Mat3 {
        self.uv_matrix
    }
}

#[derive(Debug, Default)]
struct BatchedState {
    transforms: Vec<Transform>,
    matrices: Vec<Mat4>,
    dirty: bool,
}

/// A batched instance whose per-instance transforms may change every frame.
///
/// Transforms are edited freely; the matrix buffer handed to the GPU layer is
/// only rebuilt by [`update`](InstanceBatched::update).
#[derive(Debug)]
pub struct InstanceBatchedDynamic {
    id: Id,
    array: ArrayObjectId,
    state: Mutex<BatchedState>,
}

impl InstanceBatchedDynamic {
    pub fn new(pool: &IdPool, array: ArrayObjectId, count: usize) -> Self {
        Self::with_id(pool.fresh_id(), array, count)
    }

    /// Wrap an identifier issued elsewhere.
    pub fn with_id(id: Id, array: ArrayObjectId, count: usize) -> Self {
        Self {
            id,
            array,
            state: Mutex::new(BatchedState {
                transforms: vec![Transform::default(); count],
                matrices: vec![Mat4::IDENTITY; count],
                dirty: false,
            }),
        }
    }

    /// Replace the transform at `index`. Returns `false` if out of range.
    pub fn set_transform(&self, index: usize, transform: Transform) -> bool {
        let mut state = self.state.lock();
        match state.transforms.get_mut(index) {
            Some(slot) => {
                *slot = transform;
                state.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Copy of the matrix buffer as of the last update.
    pub fn matrices(&self) -> Vec<Mat4> {
        self.state.lock().matrices.clone()
    }

    /// The matrix buffer as raw bytes, ready for upload.
    pub fn matrix_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.state.lock().matrices).to_vec()
    }
}

impl Instance for InstanceBatchedDynamic {
    fn instance_id(&self) -> Id {
        self.id
    }
}

impl InstanceBatched for InstanceBatchedDynamic {
    fn array_object(&self) -> ArrayObjectId {
        self.array
    }

    fn instance_count(&self) -> usize {
        self.state.lock().transforms.len()
    }

    fn update_required(&self) -> bool {
        self.state.lock().dirty
    }

    fn update(&self) {
        let mut state = self.state.lock();
        let BatchedState {
            transforms,
            matrices,
            dirty,
        } = &mut *state;
        matrices.clear();
        matrices.extend(transforms.iter().map(Transform::matrix));
        *dirty = false;
    }
}

/// Per-sprite vertex attributes for a billboarded instance.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BillboardVertex {
    pub position: Vec3,
    pub scale: f32,
    pub rotation: f32,
}

#[derive(Debug, Default)]
struct BillboardState {
    sprites: Vec<BillboardVertex>,
    enabled: Vec<bool>,
    buffer: Vec<BillboardVertex>,
    dirty: bool,
}

/// A fixed-capacity set of sprites that can be enabled and disabled individually.
#[derive(Debug)]
pub struct InstanceBillboardedDynamic {
    id: Id,
    array: ArrayObjectId,
    capacity: usize,
    state: Mutex<BillboardState>,
}

impl InstanceBillboardedDynamic {
    pub fn new(pool: &IdPool, array: ArrayObjectId, capacity: usize) -> Self {
        Self::with_id(pool.fresh_id(), array, capacity)
    }

    /// Wrap an identifier issued elsewhere.
    pub fn with_id(id: Id, array: ArrayObjectId, capacity: usize) -> Self {
        Self {
            id,
            array,
            capacity,
            state: Mutex::new(BillboardState {
                sprites: Vec::with_capacity(capacity),
                enabled: Vec::with_capacity(capacity),
                buffer: Vec::with_capacity(capacity),
                dirty: false,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Add a sprite, returning its index, or `None` when full.
    pub fn add_billboard(&self, position: Vec3, scale: f32, rotation: f32) -> Option<usize> {
        let mut state = self.state.lock();
        if state.sprites.len() >= self.capacity {
            return None;
        }
        state.sprites.push(BillboardVertex {
            position,
            scale,
            rotation,
        });
        state.enabled.push(true);
        state.dirty = true;
        Some(state.sprites.len() - 1)
    }

    /// Enable or disable the sprite at `index`. Returns `false` if out of range.
    pub fn set_enabled(&self, index: usize, enabled: bool) -> bool {
        let mut state = self.state.lock();
        match state.enabled.get_mut(index) {
            Some(slot) => {
                *slot = enabled;
                state.dirty = true;
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.sprites.clear();
        state.enabled.clear();
        state.dirty = true;
    }

    /// Copy of the packed attribute buffer as of the last update.
    pub fn vertices(&self) -> Vec<BillboardVertex> {
        self.state.lock().buffer.clone()
    }
}

impl Instance for InstanceBillboardedDynamic {
    fn instance_id(&self) -> Id {
        self.id
    }
}

impl InstanceBillboarded for InstanceBillboardedDynamic {
    fn array_object(&self) -> ArrayObjectId {
        self.array
    }

    fn enabled_count(&self) -> usize {
        self.state.lock().enabled.iter().filter(|e| **e).count()
    }

    fn update_required(&self) -> bool {
        self.state.lock().dirty
    }

    fn update(&self) {
        let mut state = self.state.lock();
        let BillboardState {
            sprites,
            enabled,
            buffer,
            dirty,
        } = &mut *state;
        buffer.clear();
        buffer.extend(
            sprites
                .iter()
                .zip(enabled.iter())
                .filter(|(_, on)| **on)
                .map(|(sprite, _)| *sprite),
        );
        *dirty = false;
    }
}
