//! # Players and Inputs
//!
//! The two seats at the table and the three things a player can ask for.

use std::fmt;

/// One of the two seats in a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Player {
    /// Left paddle.
    Zero = 0,
    /// Right paddle.
    One = 1,
}

impl Player {
    /// Both players, in index order.
    pub const ALL: [Self; 2] = [Self::Zero, Self::One];

    /// Index into per-player arrays.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The opposing player.
    #[inline]
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Zero => Self::One,
            Self::One => Self::Zero,
        }
    }

    /// Parses a seat number (`0` or `1`).
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Zero),
            1 => Some(Self::One),
            _ => None,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.index())
    }
}

/// Paddle command for a single epoch.
///
/// The discriminants are the values carried in the `input` field of a
/// wire packet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum PaddleInput {
    /// Hold still.
    #[default]
    None = 0,
    /// Move up.
    Up = 1,
    /// Move down.
    Down = 2,
}

impl PaddleInput {
    /// Wire representation.
    #[inline]
    #[must_use]
    pub const fn to_wire(self) -> i32 {
        self as i32
    }

    /// Decodes a wire value, rejecting anything outside the alphabet.
    #[inline]
    #[must_use]
    pub const fn from_wire(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Up),
            2 => Some(Self::Down),
            _ => None,
        }
    }

    /// Vertical direction of travel: -1 up, +1 down, 0 still.
    #[inline]
    #[must_use]
    pub const fn direction(self) -> f32 {
        match self {
            Self::None => 0.0,
            Self::Up => -1.0,
            Self::Down => 1.0,
        }
    }
}
