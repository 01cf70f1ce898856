//! # Epoch Counter
//!
//! The shared simulation clock. Sixteen bits wide to match the wire; all
//! arithmetic wraps at 65536, which keeps ring indices consistent as long as
//! the ring size divides 65536.

use std::fmt;

/// A discrete simulation step both peers agree on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Epoch(pub u16);

impl Epoch {
    /// The first epoch of a match.
    pub const ZERO: Self = Self(0);

    /// Raw counter value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }

    /// The epoch after this one.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// The epoch `n` steps after this one.
    #[inline]
    #[must_use]
    pub const fn plus(self, n: u16) -> Self {
        Self(self.0.wrapping_add(n))
    }

    /// How far ahead of `base` this epoch is, modulo 65536.
    ///
    /// An epoch just behind `base` reports a very large offset.
    #[inline]
    #[must_use]
    pub const fn offset_from(self, base: Self) -> u16 {
        self.0.wrapping_sub(base.0)
    }

    /// Ring position for a power-of-two ring with the given index mask.
    #[inline]
    #[must_use]
    pub const fn slot(self, mask: usize) -> usize {
        self.0 as usize & mask
    }

    /// True for non-zero multiples of `every`.
    #[inline]
    #[must_use]
    pub const fn is_report_point(self, every: u16) -> bool {
        every != 0 && self.0 != 0 && self.0 % every == 0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
