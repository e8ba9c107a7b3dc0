//! Pawn move and attack generation.

use crate::board::packed::PackedBoard;
use crate::board::types::{BitBoard, Color, LastMove, Location, Move, PieceKind, PROMOTION_PIECES};

/// Push a pawn move, expanding into every promotion choice on the last row.
fn push_pawn_move(from: Location, to: Location, promotion_row: usize, out: &mut Vec<Move>) {
    if to.row() == promotion_row {
        for kind in PROMOTION_PIECES {
            out.push(Move::promoting(from, to, kind));
        }
    } else {
        out.push(Move::new(from, to));
    }
}

pub(super) fn moves(
    board: &PackedBoard,
    from: Location,
    color: Color,
    previous: Option<&LastMove>,
    out: &mut Vec<Move>,
) {
    let dir = color.pawn_direction();
    let promotion_row = color.pawn_promotion_row();

    // Single advance, and a double advance from the starting row when both
    // squares are empty.
    if let Some(one) = from.offset(dir, 0) {
        if board.piece_at(one).is_none() {
            push_pawn_move(from, one, promotion_row, out);
            if from.row() == color.pawn_start_row() {
                if let Some(two) = from.offset(2 * dir, 0) {
                    if board.piece_at(two).is_none() {
                        out.push(Move::new(from, two));
                    }
                }
            }
        }
    }

    // Diagonal captures.
    for dc in [-1isize, 1] {
        if let Some(to) = from.offset(dir, dc) {
            if let Some((c, _)) = board.piece_at(to) {
                if c != color {
                    push_pawn_move(from, to, promotion_row, out);
                }
            }
        }
    }

    // En passant: the previous move was an adjacent enemy pawn's double
    // advance; we capture onto the square it skipped.
    if let Some(prev) = previous {
        if prev.is_double_pawn_advance() {
            let passed = prev.mv.to;
            if passed.row() == from.row()
                && passed.col().abs_diff(from.col()) == 1
                && board.piece_at(passed) == Some((color.opponent(), PieceKind::Pawn))
            {
                if let Some(to) = from.offset(dir, passed.col() as isize - from.col() as isize) {
                    if board.piece_at(to).is_none() {
                        out.push(Move::new(from, to));
                    }
                }
            }
        }
    }
}

pub(super) fn attacks(from: Location, color: Color, out: &mut BitBoard) {
    let dir = color.pawn_direction();
    for dc in [-1isize, 1] {
        if let Some(to) = from.offset(dir, dc) {
            out.insert(to);
        }
    }
}
