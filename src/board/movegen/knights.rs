//! Knight move and attack generation.

use crate::board::packed::PackedBoard;
use crate::board::types::{BitBoard, Color, Location, Move};

const OFFSETS: [(isize, isize); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];

pub(super) fn moves(board: &PackedBoard, from: Location, color: Color, out: &mut Vec<Move>) {
    for (dr, dc) in OFFSETS {
        if let Some(to) = from.offset(dr, dc) {
            match board.piece_at(to) {
                Some((c, _)) if c == color => {}
                _ => out.push(Move::new(from, to)),
            }
        }
    }
}

pub(super) fn attacks(from: Location, out: &mut BitBoard) {
    for (dr, dc) in OFFSETS {
        if let Some(to) = from.offset(dr, dc) {
            out.insert(to);
        }
    }
}
