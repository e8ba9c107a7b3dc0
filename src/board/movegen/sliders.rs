//! Sliding piece (bishop, rook, queen) move and attack generation.

use crate::board::packed::PackedBoard;
use crate::board::types::{BitBoard, Color, Location, Move};

pub(super) const ROOK_DIRS: &[(isize, isize)] = &[(1, 0), (-1, 0), (0, 1), (0, -1)];
pub(super) const BISHOP_DIRS: &[(isize, isize)] = &[(1, 1), (1, -1), (-1, 1), (-1, -1)];
pub(super) const QUEEN_DIRS: &[(isize, isize)] = &[
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

pub(super) fn moves(
    board: &PackedBoard,
    from: Location,
    color: Color,
    dirs: &[(isize, isize)],
    out: &mut Vec<Move>,
) {
    for &(dr, dc) in dirs {
        let mut current = from;
        while let Some(to) = current.offset(dr, dc) {
            match board.piece_at(to) {
                None => {
                    out.push(Move::new(from, to));
                    current = to;
                }
                Some((c, _)) => {
                    if c != color {
                        out.push(Move::new(from, to));
                    }
                    break;
                }
            }
        }
    }
}

pub(super) fn attacks(
    board: &PackedBoard,
    from: Location,
    dirs: &[(isize, isize)],
    out: &mut BitBoard,
) {
    for &(dr, dc) in dirs {
        let mut current = from;
        while let Some(to) = current.offset(dr, dc) {
            out.insert(to);
            if board.piece_at(to).is_some() {
                break;
            }
            current = to;
        }
    }
}
