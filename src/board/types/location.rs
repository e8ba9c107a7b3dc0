//! Board coordinates.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A square on the board, represented as (row, col), each in `0..8`.
///
/// Row 0 is White's back rank; col 0 is the a-file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Location(pub usize, pub usize);

impl Location {
    /// Create a new location with bounds checking.
    #[must_use]
    pub fn new(row: usize, col: usize) -> Option<Self> {
        if row < 8 && col < 8 {
            Some(Location(row, col))
        } else {
            None
        }
    }

    /// Get the row (0-7, where 0 = rank 1).
    #[inline]
    #[must_use]
    pub const fn row(self) -> usize {
        self.0
    }

    /// Get the column (0-7, where 0 = file a).
    #[inline]
    #[must_use]
    pub const fn col(self) -> usize {
        self.1
    }

    /// Get the location's index (0-63, a1=0, b1=1, ..., h8=63).
    #[inline]
    #[must_use]
    pub const fn as_index(self) -> usize {
        self.0 * 8 + self.1
    }

    /// Create a location from an index (0-63).
    #[must_use]
    pub const fn from_index(idx: usize) -> Self {
        Location(idx / 8, idx % 8)
    }

    /// Step by a signed (row, col) offset, returning `None` off the board.
    #[inline]
    #[must_use]
    pub fn offset(self, dr: isize, dc: isize) -> Option<Self> {
        let row = self.0 as isize + dr;
        let col = self.1 as isize + dc;
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Some(Location(row as usize, col as usize))
        } else {
            None
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (self.1 as u8 + b'a') as char, self.0 + 1)
    }
}
