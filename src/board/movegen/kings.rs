//! King move, attack, and castle generation.

use crate::board::packed::{BoardFlag, PackedBoard};
use crate::board::types::{BitBoard, Color, Location, Move, PieceKind};

const OFFSETS: [(isize, isize); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
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

/// Generate castle moves for `color`.
///
/// Castling requires the king and the relevant rook unmoved, no prior
/// castle, the squares between king and rook empty, and every square the
/// king stands on or crosses unattacked.
pub(super) fn castle_moves(board: &PackedBoard, color: Color, out: &mut Vec<Move>) {
    if board.flag(BoardFlag::KingMoved, color) || board.flag(BoardFlag::Castled, color) {
        return;
    }
    let row = color.back_row();
    let king_home = Location(row, 4);
    if board.piece_at(king_home) != Some((color, PieceKind::King)) {
        return;
    }
    let enemy = board.attack_map(color.opponent());

    // Kingside: f and g empty; e, f, g unattacked; rook on h unmoved.
    if !board.flag(BoardFlag::KingsideRookMoved, color)
        && board.piece_at(Location(row, 7)) == Some((color, PieceKind::Rook))
        && board.piece_at(Location(row, 5)).is_none()
        && board.piece_at(Location(row, 6)).is_none()
        && !enemy.contains(king_home)
        && !enemy.contains(Location(row, 5))
        && !enemy.contains(Location(row, 6))
    {
        out.push(Move::new(king_home, Location(row, 6)));
    }

    // Queenside: b, c, d empty; e, d, c unattacked; rook on a unmoved.
    if !board.flag(BoardFlag::QueensideRookMoved, color)
        && board.piece_at(Location(row, 0)) == Some((color, PieceKind::Rook))
        && board.piece_at(Location(row, 1)).is_none()
        && board.piece_at(Location(row, 2)).is_none()
        && board.piece_at(Location(row, 3)).is_none()
        && !enemy.contains(king_home)
        && !enemy.contains(Location(row, 3))
        && !enemy.contains(Location(row, 2))
    {
        out.push(Move::new(king_home, Location(row, 2)));
    }
}
