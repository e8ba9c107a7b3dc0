//! Move types.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::location::Location;
use super::piece::PieceKind;

/// A move from one square to another, with an optional pawn promotion
/// annotation on the destination.
///
/// Invariant: `from != to`. Applying a move that violates this is a
/// programmer error and panics rather than silently succeeding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Move {
    pub from: Location,
    pub to: Location,
    pub promotion: Option<PieceKind>,
}

impl Move {
    /// Create a plain move.
    #[inline]
    #[must_use]
    pub const fn new(from: Location, to: Location) -> Self {
        Move {
            from,
            to,
            promotion: None,
        }
    }

    /// Create a pawn-promotion move.
    #[inline]
    #[must_use]
    pub const fn promoting(from: Location, to: Location, kind: PieceKind) -> Self {
        Move {
            from,
            to,
            promotion: Some(kind),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.to_char())?;
        }
        Ok(())
    }
}

/// Record of a move that has been applied to a board.
///
/// Carried between plies to derive en passant (a pawn that just
/// double-advanced) and to maintain the fifty-move counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LastMove {
    /// The kind of the piece that moved (before promotion).
    pub piece: PieceKind,
    /// The move as applied.
    pub mv: Move,
    /// Promotion piece, if the move promoted a pawn.
    pub promotion: Option<PieceKind>,
    /// Whether the move captured a piece (including en passant).
    pub is_capture: bool,
}

impl LastMove {
    /// Returns true if this was a pawn advancing two rows, which makes the
    /// bypassed square an en passant target for the reply.
    #[inline]
    #[must_use]
    pub fn is_double_pawn_advance(&self) -> bool {
        self.piece == PieceKind::Pawn
            && self.mv.from.col() == self.mv.to.col()
            && self.mv.from.row().abs_diff(self.mv.to.row()) == 2
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_plain_and_promotion() {
        let mv = Move::new(Location(1, 4), Location(3, 4));
        assert_eq!(mv.to_string(), "e2e4");

        let promo = Move::promoting(Location(6, 0), Location(7, 0), PieceKind::Queen);
        assert_eq!(promo.to_string(), "a7a8q");
    }

    #[test]
    fn double_pawn_advance_detection() {
        let double = LastMove {
            piece: PieceKind::Pawn,
            mv: Move::new(Location(1, 4), Location(3, 4)),
            promotion: None,
            is_capture: false,
        };
        assert!(double.is_double_pawn_advance());

        let single = LastMove {
            piece: PieceKind::Pawn,
            mv: Move::new(Location(1, 4), Location(2, 4)),
            promotion: None,
            is_capture: false,
        };
        assert!(!single.is_double_pawn_advance());

        let knight = LastMove {
            piece: PieceKind::Knight,
            mv: Move::new(Location(0, 1), Location(2, 1)),
            promotion: None,
            is_capture: false,
        };
        assert!(!knight.is_double_pawn_advance());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn move_serde_roundtrip() {
        let mv = Move::promoting(Location(6, 3), Location(7, 3), PieceKind::Knight);
        let json = serde_json::to_string(&mv).expect("serialize");
        let back: Move = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(mv, back);
    }
}
