//! Render groups and the stencil bit layout that masks them.
//!
//! Visible entries are partitioned into up to 15 numbered groups. The
//! rasterization layer writes each group's number into the low bits of the
//! stencil buffer so that lights in a group only touch pixels of geometry in
//! the same group. Bit 7 is the allow bit, set or cleared by stencil
//! instances to exclude regions of the screen from rendering entirely.

use crate::error::{RenderError, RenderResult};
use std::fmt;

/// Stencil bits holding the group number. Compared with equality under this mask.
pub const GROUP_BITS: u8 = 0b0000_1111;

/// Stencil bit marking pixels that may be rendered at all.
pub const ALLOW_BIT: u8 = 0b1000_0000;

/// A validated render group number in `[1, 15]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Group(u8);

impl Group {
    /// Lowest valid group number.
    pub const MIN: u8 = 1;
    /// Highest valid group number.
    pub const MAX: u8 = 15;
    /// Number of distinct groups.
    pub const COUNT: usize = 15;
    /// The group used when none is specified.
    pub const DEFAULT: Group = Group(1);

    /// Validate a group number.
    pub fn new(value: u32) -> RenderResult<Self> {
        check_valid_group(value).map(|v| Self(v as u8))
    }

    /// The group number.
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Zero-based index, for per-group tables.
    #[inline]
    pub const fn index(self) -> usize {
        (self.0 - Self::MIN) as usize
    }

    /// The stencil reference value written for pixels of this group.
    #[inline]
    pub const fn stencil_value(self) -> u8 {
        self.0 & GROUP_BITS
    }

    /// Every valid group in ascending order.
    pub fn all() -> impl Iterator<Item = Group> {
        (Self::MIN..=Self::MAX).map(Group)
    }
}

impl Default for Group {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for Group {
    type Error = RenderError;

    fn try_from(value: u32) -> RenderResult<Self> {
        Self::new(value)
    }
}

/// Check that `value` is a valid group number and return it unchanged.
pub fn check_valid_group(value: u32) -> RenderResult<u32> {
    if (u32::from(Group::MIN)..=u32::from(Group::MAX)).contains(&value) {
        Ok(value)
    } else {
        Err(RenderError::InvalidGroup(value))
    }
}

/// How stencil instances affect the allow bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StencilMode {
    /// The screen starts disallowed; instances set the allow bit where they cover.
    InstancesArePositive,
    /// The screen starts allowed; instances clear the allow bit where they cover.
    #[default]
    InstancesAreNegative,
}

impl StencilMode {
    /// Stencil value written for the whole screen before instances are drawn.
    pub fn base_value(self) -> u8 {
        match self {
            Self::InstancesArePositive => 0,
            Self::InstancesAreNegative => ALLOW_BIT,
        }
    }

    /// Stencil value written by each instance.
    pub fn instance_value(self) -> u8 {
        match self {
            Self::InstancesArePositive => ALLOW_BIT,
            Self::InstancesAreNegative => 0,
        }
    }
}
