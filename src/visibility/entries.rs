//! Sorted entry storage shared by every registry.
//!
//! Entries are appended as they are added and sorted once, before traversal,
//! by a key whose leading fields are the draw state transitions to amortize
//! (group, shader, material, geometry source). Traversal is then a linear
//! scan that emits a callback wherever a key field changes, and contiguity of
//! equal prefixes holds by construction.

use crate::group::Group;
use crate::id::Id;
use crate::instance::ArrayObjectId;
use std::collections::HashSet;
use std::sync::Arc;

/// Sort key of an instance entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct InstanceKey {
    pub group: Group,
    pub shader: Id,
    pub material: Id,
    pub array: ArrayObjectId,
    pub instance: Id,
}

/// Sort key of a light entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct LightKey {
    pub group: Group,
    pub shader: Id,
    pub array: ArrayObjectId,
    pub light: Id,
}

/// Sort key of a stencil entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct StencilKey {
    pub array: ArrayObjectId,
    pub instance: Id,
}

/// A key that names the entry it sorts.
pub(crate) trait EntryKey: Ord + Copy {
    fn id(&self) -> Id;
}

impl EntryKey for InstanceKey {
    fn id(&self) -> Id {
        self.instance
    }
}

impl EntryKey for LightKey {
    fn id(&self) -> Id {
        self.light
    }
}

impl EntryKey for StencilKey {
    fn id(&self) -> Id {
        self.instance
    }
}

pub(crate) struct Entry<K, I: ?Sized, P> {
    pub key: K,
    pub item: Arc<I>,
    pub payload: P,
}

/// Entries, at most one per identifier, sorted by key on demand.
pub(crate) struct EntryList<K, I: ?Sized, P> {
    ids: HashSet<Id>,
    entries: Vec<Entry<K, I, P>>,
    sorted: bool,
}

impl<K: EntryKey, I: ?Sized, P> EntryList<K, I, P> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: HashSet::with_capacity(capacity),
            entries: Vec::with_capacity(capacity),
            sorted: true,
        }
    }

    pub fn contains(&self, id: Id) -> bool {
        self.ids.contains(&id)
    }

    /// Append an entry. Returns `false`, leaving the list untouched, if an
    /// entry with the same identifier is present.
    pub fn insert(&mut self, key: K, item: Arc<I>, payload: P) -> bool {
        if !self.ids.insert(key.id()) {
            return false;
        }
        if self.entries.last().is_some_and(|last| last.key > key) {
            self.sorted = false;
        }
        self.entries.push(Entry { key, item, payload });
        true
    }

    /// Bring the entries into key order. Keys are unique, so the order is total.
    pub fn sort(&mut self) {
        if !self.sorted {
            self.entries.sort_unstable_by_key(|e| e.key);
            self.sorted = true;
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Remove everything. Allocations are kept for the next frame.
    pub fn clear(&mut self) {
        self.ids.clear();
        self.entries.clear();
        self.sorted = true;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The entries, in key order once [`sort`](Self::sort) has run.
    pub fn as_slice(&self) -> &[Entry<K, I, P>] {
        debug_assert!(self.sorted);
        &self.entries
    }

    /// The contiguous range of entries whose `field` equals `value`.
    ///
    /// The list must be sorted, and `field` must be a leading key field.
    pub fn range_of<F, V>(&self, field: F, value: V) -> &[Entry<K, I, P>]
    where
        F: Fn(&K) -> V,
        V: Ord,
    {
        debug_assert!(self.sorted);
        let start = self.entries.partition_point(|e| field(&e.key) < value);
        let end = self.entries.partition_point(|e| field(&e.key) <= value);
        &self.entries[start..end]
    }
}

/// Maximal runs of consecutive items sharing a key.
pub(crate) struct Runs<'a, T, F> {
    rest: &'a [T],
    key: F,
}

pub(crate) fn runs<T, K, F>(items: &[T], key: F) -> Runs<'_, T, F>
where
    F: Fn(&T) -> K,
    K: PartialEq,
{
    Runs { rest: items, key }
}

impl<'a, T, K, F> Iterator for Runs<'a, T, F>
where
    F: Fn(&T) -> K,
    K: PartialEq,
{
    type Item = &'a [T];

    fn next(&mut self) -> Option<&'a [T]> {
        let first = self.rest.first()?;
        let key = (self.key)(first);
        let len = self
            .rest
            .iter()
            .position(|item| (self.key)(item) != key)
            .unwrap_or(self.rest.len());
        let (run, rest) = self.rest.split_at(len);
        self.rest = rest;
        Some(run)
    }
}
