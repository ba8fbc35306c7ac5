//! Stencil instance registry.
//!
//! Stencil instances mark screen regions as allowed or disallowed for
//! rendering by writing the allow bit, before any group is drawn.

use super::consumer::StencilsConsumer;
use super::entries::{EntryList, StencilKey};
use crate::error::{RenderError, RenderResult};
use crate::group::StencilMode;
use crate::instance::{ArrayObjectId, InstanceSingle};
use std::fmt;
use std::sync::Arc;

pub struct SceneStencils {
    mode: StencilMode,
    instances: EntryList<StencilKey, dyn InstanceSingle, ()>,
}

impl fmt::Debug for SceneStencils {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneStencils")
            .field("mode", &self.mode)
            .field("instances", &self.instances.len())
            .finish()
    }
}

impl Default for SceneStencils {
    fn default() -> Self {
        Self::with_capacity(StencilMode::default(), 16)
    }
}

impl SceneStencils {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(mode: StencilMode, capacity: usize) -> Self {
        log::debug!("Creating stencil set ({:?}) with capacity {}", mode, capacity);
        Self {
            mode,
            instances: EntryList::with_capacity(capacity),
        }
    }

    pub fn mode(&self) -> StencilMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: StencilMode) {
        self.mode = mode;
    }

    pub fn add_single(&mut self, instance: Arc<dyn InstanceSingle>) -> RenderResult<()> {
        let key = StencilKey {
            array: instance.array_object(),
            instance: instance.instance_id(),
        };
        if self.instances.insert(key, instance, ()) {
            Ok(())
        } else {
            Err(RenderError::InstanceAlreadyVisible { id: key.instance })
        }
    }

    pub fn count(&self) -> usize {
        self.instances.len()
    }

    /// Remove every instance. The mode is kept.
    pub fn reset(&mut self) {
        log::trace!("Resetting stencil set ({} instances)", self.count());
        self.instances.clear();
    }

    pub fn execute<C: StencilsConsumer>(&mut self, consumer: &mut C) -> Result<(), C::Error> {
        log::trace!("Executing stencil set ({} instances)", self.count());
        self.instances.sort();

        consumer.on_start(self.mode)?;
        let mut previous: Option<ArrayObjectId> = None;
        for entry in self.instances.as_slice() {
            if previous != Some(entry.key.array) {
                consumer.on_instance_single_array_start(&*entry.item)?;
                previous = Some(entry.key.array);
            }
            consumer.on_instance_single(&*entry.item)?;
        }
        consumer.on_finish()
    }
}
