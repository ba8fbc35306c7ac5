//! Identifier pool.
//!
//! Instances, materials, shaders and lights are tagged with an [`Id`] taken
//! from a shared [`IdPool`]. Registries compare and sort entries by these
//! identifiers rather than by pointer identity.
//!
//! A pool is created once per application session and is never reset. It is
//! cheap to clone (the counter lives behind an [`Arc`]) and safe to use from
//! several threads at once.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// An opaque identifier, unique for the lifetime of the pool that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(u64);

impl Id {
    /// Wrap a raw value.
    ///
    /// Intended for tests and for callers that mirror identifiers issued
    /// elsewhere; values built this way bypass the uniqueness guarantee.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric value.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues strictly increasing, never repeating identifiers.
#[derive(Debug, Clone, Default)]
pub struct IdPool {
    next: Arc<AtomicU64>,
}

impl IdPool {
    /// Create a new pool. The first identifier issued is `0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next identifier.
    pub fn fresh_id(&self) -> Id {
        Id(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// The identifier that the next call to [`fresh_id`](Self::fresh_id) would return.
    pub fn peek(&self) -> Id {
        Id(self.next.load(Ordering::Relaxed))
    }
}
