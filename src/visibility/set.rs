//! Visible instance registry.

use super::consumer::VisibilityConsumer;
use super::entries::{runs, Entry, EntryList, InstanceKey};
use crate::error::{RenderError, RenderResult};
use crate::group::Group;
use crate::instance::{ArrayObjectId, InstanceBatched, InstanceBillboarded, InstanceSingle};
use crate::material::{Material, Shader};
use std::fmt;
use std::sync::Arc;

type InstanceEntry<I, M> = Entry<InstanceKey, I, M>;

/// The per-kind half of the traversal: which consumer callbacks a kind uses.
trait Kind<M: Material> {
    type Instance: ?Sized;

    fn shader_start<C: VisibilityConsumer<M>>(consumer: &mut C, shader: &M::Shader) -> Result<(), C::Error>;

    fn material_start<C: VisibilityConsumer<M>>(consumer: &mut C, material: &M) -> Result<(), C::Error>;

    fn visit<C: VisibilityConsumer<M>>(
        consumer: &mut C,
        material: &M,
        instance: &Self::Instance,
        array_changed: bool,
    ) -> Result<(), C::Error>;

    fn material_finish<C: VisibilityConsumer<M>>(consumer: &mut C, material: &M) -> Result<(), C::Error>;

    fn shader_finish<C: VisibilityConsumer<M>>(consumer: &mut C, shader: &M::Shader) -> Result<(), C::Error>;
}

struct Single;
struct Batched;
struct Billboarded;

impl<M: Material> Kind<M> for Single {
    type Instance = dyn InstanceSingle;

    fn shader_start<C: VisibilityConsumer<M>>(consumer: &mut C, shader: &M::Shader) -> Result<(), C::Error> {
        consumer.on_instance_single_shader_start(shader)
    }

    fn material_start<C: VisibilityConsumer<M>>(consumer: &mut C, material: &M) -> Result<(), C::Error> {
        consumer.on_instance_single_material_start(material)
    }

    fn visit<C: VisibilityConsumer<M>>(
        consumer: &mut C,
        material: &M,
        instance: &Self::Instance,
        array_changed: bool,
    ) -> Result<(), C::Error> {
        if array_changed {
            consumer.on_instance_single_array_start(instance)?;
        }
        consumer.on_instance_single(material, instance)
    }

    fn material_finish<C: VisibilityConsumer<M>>(consumer: &mut C, material: &M) -> Result<(), C::Error> {
        consumer.on_instance_single_material_finish(material)
    }

    fn shader_finish<C: VisibilityConsumer<M>>(consumer: &mut C, shader: &M::Shader) -> Result<(), C::Error> {
        consumer.on_instance_single_shader_finish(shader)
    }
}

impl<M: Material> Kind<M> for Batched {
    type Instance = dyn InstanceBatched;

    fn shader_start<C: VisibilityConsumer<M>>(consumer: &mut C, shader: &M::Shader) -> Result<(), C::Error> {
        consumer.on_instance_batched_shader_start(shader)
    }

    fn material_start<C: VisibilityConsumer<M>>(consumer: &mut C, material: &M) -> Result<(), C::Error> {
        consumer.on_instance_batched_material_start(material)
    }

    fn visit<C: VisibilityConsumer<M>>(
        consumer: &mut C,
        material: &M,
        instance: &Self::Instance,
        _array_changed: bool,
    ) -> Result<(), C::Error> {
        consumer.on_instance_batched(material, instance)
    }

    fn material_finish<C: VisibilityConsumer<M>>(consumer: &mut C, material: &M) -> Result<(), C::Error> {
        consumer.on_instance_batched_material_finish(material)
    }

    fn shader_finish<C: VisibilityConsumer<M>>(consumer: &mut C, shader: &M::Shader) -> Result<(), C::Error> {
        consumer.on_instance_batched_shader_finish(shader)
    }
}

impl<M: Material> Kind<M> for Billboarded {
    type Instance = dyn InstanceBillboarded;

    fn shader_start<C: VisibilityConsumer<M>>(consumer: &mut C, shader: &M::Shader) -> Result<(), C::Error> {
        consumer.on_instance_billboarded_shader_start(shader)
    }

    fn material_start<C: VisibilityConsumer<M>>(consumer: &mut C, material: &M) -> Result<(), C::Error> {
        consumer.on_instance_billboarded_material_start(material)
    }

    fn visit<C: VisibilityConsumer<M>>(
        consumer: &mut C,
        material: &M,
        instance: &Self::Instance,
        _array_changed: bool,
    ) -> Result<(), C::Error> {
        consumer.on_instance_billboarded(material, instance)
    }

    fn material_finish<C: VisibilityConsumer<M>>(consumer: &mut C, material: &M) -> Result<(), C::Error> {
        consumer.on_instance_billboarded_material_finish(material)
    }

    fn shader_finish<C: VisibilityConsumer<M>>(consumer: &mut C, shader: &M::Shader) -> Result<(), C::Error> {
        consumer.on_instance_billboarded_shader_finish(shader)
    }
}

/// Replay one group's entries of one kind, shader by shader, material by material.
fn execute_kind<K, M, C>(entries: &[InstanceEntry<K::Instance, M>], consumer: &mut C) -> Result<(), C::Error>
where
    K: Kind<M>,
    M: Material,
    C: VisibilityConsumer<M>,
{
    for by_shader in runs(entries, |e| e.key.shader) {
        let shader = by_shader[0].payload.shader();
        K::shader_start(consumer, shader)?;

        for by_material in runs(by_shader, |e| e.key.material) {
            let material = &by_material[0].payload;
            K::material_start(consumer, material)?;

            let mut previous: Option<ArrayObjectId> = None;
            for entry in by_material {
                let array_changed = previous != Some(entry.key.array);
                previous = Some(entry.key.array);
                K::visit(consumer, material, &*entry.item, array_changed)?;
            }

            K::material_finish(consumer, material)?;
        }

        K::shader_finish(consumer, shader)?;
    }
    Ok(())
}

/// The set of instances visible this frame, with the material each is drawn with.
///
/// Used both for opaque geometry and for depth-only passes; the name only
/// appears in log records. Each instance kind has its own identifier
/// namespace. Traversal order is deterministic: within a group, entries are
/// ordered by shader id, material id, geometry source, then instance id.
pub struct VisibilitySet<M: Material> {
    name: &'static str,
    singles: EntryList<InstanceKey, dyn InstanceSingle, M>,
    batched: EntryList<InstanceKey, dyn InstanceBatched, M>,
    billboarded: EntryList<InstanceKey, dyn InstanceBillboarded, M>,
}

/// Registry of opaque instances.
pub type SceneOpaques<M> = VisibilitySet<M>;

/// Registry of instances rendered only into depth.
pub type SceneDepthInstances<M> = VisibilitySet<M>;

impl<M: Material> fmt::Debug for VisibilitySet<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisibilitySet")
            .field("name", &self.name)
            .field("singles", &self.singles.len())
            .field("batched", &self.batched.len())
            .field("billboarded", &self.billboarded.len())
            .finish()
    }
}

impl<M: Material> VisibilitySet<M> {
    pub fn with_capacity(name: &'static str, capacity: usize) -> Self {
        log::debug!("Creating visibility set '{}' with capacity {}", name, capacity);
        Self {
            name,
            singles: EntryList::with_capacity(capacity),
            batched: EntryList::with_capacity(capacity / 4),
            billboarded: EntryList::with_capacity(capacity / 4),
        }
    }

    pub fn opaque() -> Self {
        Self::with_capacity("opaques", 1024)
    }

    pub fn depth() -> Self {
        Self::with_capacity("depth", 1024)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn key(group: u32, id: crate::id::Id, array: ArrayObjectId, material: &M) -> RenderResult<InstanceKey> {
        Ok(InstanceKey {
            group: Group::new(group)?,
            shader: material.shader().shader_id(),
            material: material.material_id(),
            array,
            instance: id,
        })
    }

    /// Make a single instance visible in the default group.
    pub fn add_single(&mut self, instance: Arc<dyn InstanceSingle>, material: M) -> RenderResult<()> {
        self.add_single_in_group(instance, material, u32::from(Group::DEFAULT.get()))
    }

    /// Make a single instance visible in `group`.
    pub fn add_single_in_group(&mut self, instance: Arc<dyn InstanceSingle>, material: M, group: u32) -> RenderResult<()> {
        let key = Self::key(group, instance.instance_id(), instance.array_object(), &material)?;
        insert(&mut self.singles, key, instance, material)
    }

    /// Make a batched instance visible in the default group.
    pub fn add_batched(&mut self, instance: Arc<dyn InstanceBatched>, material: M) -> RenderResult<()> {
        self.add_batched_in_group(instance, material, u32::from(Group::DEFAULT.get()))
    }

    /// Make a batched instance visible in `group`.
    pub fn add_batched_in_group(&mut self, instance: Arc<dyn InstanceBatched>, material: M, group: u32) -> RenderResult<()> {
        let key = Self::key(group, instance.instance_id(), instance.array_object(), &material)?;
        insert(&mut self.batched, key, instance, material)
    }

    /// Make a billboarded instance visible in the default group.
    pub fn add_billboarded(&mut self, instance: Arc<dyn InstanceBillboarded>, material: M) -> RenderResult<()> {
        self.add_billboarded_in_group(instance, material, u32::from(Group::DEFAULT.get()))
    }

    /// Make a billboarded instance visible in `group`.
    pub fn add_billboarded_in_group(
        &mut self,
        instance: Arc<dyn InstanceBillboarded>,
        material: M,
        group: u32,
    ) -> RenderResult<()> {
        let key = Self::key(group, instance.instance_id(), instance.array_object(), &material)?;
        insert(&mut self.billboarded, key, instance, material)
    }

    /// Total number of visible entries across all kinds and groups.
    pub fn count(&self) -> usize {
        self.singles.len() + self.batched.len() + self.billboarded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Remove every entry, keeping allocations for reuse.
    pub fn reset(&mut self) {
        log::trace!("Resetting visibility set '{}' ({} entries)", self.name, self.count());
        self.singles.clear();
        self.batched.clear();
        self.billboarded.clear();
    }

    /// Replay the visible entries to `consumer`.
    ///
    /// Entries are sorted here, once per frame, rather than on every add.
    pub fn execute<C: VisibilityConsumer<M>>(&mut self, consumer: &mut C) -> Result<(), C::Error> {
        log::trace!("Executing visibility set '{}' ({} entries)", self.name, self.count());
        self.singles.sort();
        self.batched.sort();
        self.billboarded.sort();

        consumer.on_start()?;

        for entry in self.batched.as_slice() {
            consumer.on_instance_batched_update(&*entry.item)?;
        }
        for entry in self.billboarded.as_slice() {
            consumer.on_instance_billboarded_update(&*entry.item)?;
        }

        for group in Group::all() {
            let batched = self.batched.range_of(|k| k.group, group);
            let billboarded = self.billboarded.range_of(|k| k.group, group);
            let singles = self.singles.range_of(|k| k.group, group);
            if batched.is_empty() && billboarded.is_empty() && singles.is_empty() {
                continue;
            }

            consumer.on_start_group(group)?;
            execute_kind::<Batched, M, C>(batched, consumer)?;
            execute_kind::<Billboarded, M, C>(billboarded, consumer)?;
            execute_kind::<Single, M, C>(singles, consumer)?;
            consumer.on_finish_group(group)?;
        }

        consumer.on_finish()
    }
}

fn insert<I: ?Sized, M>(list: &mut EntryList<InstanceKey, I, M>, key: InstanceKey, instance: Arc<I>, material: M) -> RenderResult<()> {
    if list.insert(key, instance, material) {
        Ok(())
    } else {
        Err(RenderError::InstanceAlreadyVisible { id: key.instance })
    }
}
