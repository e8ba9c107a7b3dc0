//! Fixed first-move table.
//!
//! The only opening knowledge the engine carries: a handful of mainline
//! first moves for White, picked at random when asked to move from the
//! untouched starting position.

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;

use crate::board::{Color, Location, Move, PackedBoard};

static FIRST_MOVES: Lazy<Vec<Move>> = Lazy::new(|| {
    vec![
        Move::new(Location(1, 4), Location(3, 4)), // e4
        Move::new(Location(1, 3), Location(3, 3)), // d4
        Move::new(Location(1, 2), Location(3, 2)), // c4
        Move::new(Location(0, 6), Location(2, 5)), // Nf3
    ]
});

/// A book first move, if the board is the untouched starting position and
/// White is to move.
pub(super) fn fixed_first_move(board: &PackedBoard, mover: Color) -> Option<Move> {
    if mover != Color::White || *board != PackedBoard::new() {
        return None;
    }
    FIRST_MOVES.choose(&mut rand::thread_rng()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_only_the_start_position() {
        let board = PackedBoard::new();
        let mv = fixed_first_move(&board, Color::White).expect("book move for start position");
        assert!(board.legal_moves(Color::White, None).contains(&mv));

        assert_eq!(fixed_first_move(&board, Color::Black), None);

        let mut developed = board.clone();
        developed.make_move(Move::new(Location(1, 4), Location(3, 4)));
        assert_eq!(fixed_first_move(&developed, Color::White), None);
    }
}
