//! Move and attack generation.
//!
//! Generation walks the packed rows (skipping all-empty rows), dispatches on
//! the piece kind, and then filters every pseudo-legal candidate by applying
//! it to a board copy and rejecting it if the mover's own king ends up in
//! check. That simulate-and-test step is by far the most expensive operation
//! in the engine, which is why legal-move lists and attack maps are cached
//! per (hash, color).

mod kings;
mod knights;
mod pawns;
mod sliders;

use std::sync::Arc;

use super::packed::PackedBoard;
use super::types::{BitBoard, Color, LastMove, Location, Move, PieceKind};

/// Dispatch pseudo-legal move generation on the piece kind.
fn pseudo_moves(
    board: &PackedBoard,
    kind: PieceKind,
    from: Location,
    color: Color,
    previous: Option<&LastMove>,
    out: &mut Vec<Move>,
) {
    match kind {
        PieceKind::Pawn => pawns::moves(board, from, color, previous, out),
        PieceKind::Knight => knights::moves(board, from, color, out),
        PieceKind::Bishop => sliders::moves(board, from, color, sliders::BISHOP_DIRS, out),
        PieceKind::Rook => sliders::moves(board, from, color, sliders::ROOK_DIRS, out),
        PieceKind::Queen => sliders::moves(board, from, color, sliders::QUEEN_DIRS, out),
        PieceKind::King => kings::moves(board, from, color, out),
    }
}

/// Dispatch attack-square generation on the piece kind.
///
/// Attack squares are pseudo (no king-safety filtering): they answer "which
/// squares does this piece cover", including defended friendly squares for
/// sliders stopping at the first blocker.
fn attack_squares(
    board: &PackedBoard,
    kind: PieceKind,
    from: Location,
    color: Color,
    out: &mut BitBoard,
) {
    match kind {
        PieceKind::Pawn => pawns::attacks(from, color, out),
        PieceKind::Knight => knights::attacks(from, out),
        PieceKind::Bishop => sliders::attacks(board, from, sliders::BISHOP_DIRS, out),
        PieceKind::Rook => sliders::attacks(board, from, sliders::ROOK_DIRS, out),
        PieceKind::Queen => sliders::attacks(board, from, sliders::QUEEN_DIRS, out),
        PieceKind::King => kings::attacks(from, out),
    }
}

impl PackedBoard {
    /// All legal moves for `color`, given the previous move for en passant
    /// context. Results are cached per (hash, color) in the shared caches.
    #[must_use]
    pub fn legal_moves(&self, color: Color, previous: Option<&LastMove>) -> Arc<Vec<Move>> {
        let hash = self.hash();
        if let Some(cached) = self.caches().moves.get(&hash, color) {
            return cached;
        }
        let moves = Arc::new(self.compute_legal_moves(color, previous));
        self.caches().moves.insert(&hash, color, Arc::clone(&moves));
        moves
    }

    fn compute_legal_moves(&self, color: Color, previous: Option<&LastMove>) -> Vec<Move> {
        let mut candidates = Vec::with_capacity(48);
        for row in 0..8 {
            if self.row_bits(row) == 0 {
                continue;
            }
            for col in 0..8 {
                let from = Location(row, col);
                if let Some((c, kind)) = self.piece_at(from) {
                    if c == color {
                        pseudo_moves(self, kind, from, color, previous, &mut candidates);
                    }
                }
            }
        }
        kings::castle_moves(self, color, &mut candidates);
        candidates.retain(|mv| !self.leaves_king_in_check(*mv, color));
        candidates
    }

    /// The set of squares `color` attacks, cached per (hash, color).
    #[must_use]
    pub fn attack_map(&self, color: Color) -> BitBoard {
        let hash = self.hash();
        if let Some(cached) = self.caches().attacks.get(&hash, color) {
            return cached;
        }
        let mut map = BitBoard::EMPTY;
        for row in 0..8 {
            if self.row_bits(row) == 0 {
                continue;
            }
            for col in 0..8 {
                let from = Location(row, col);
                if let Some((c, kind)) = self.piece_at(from) {
                    if c == color {
                        attack_squares(self, kind, from, color, &mut map);
                    }
                }
            }
        }
        self.caches().attacks.insert(&hash, color, map);
        map
    }

    /// Whether applying `mv` would leave `color`'s own king in check.
    /// Simulates the move on a copy of the board.
    #[must_use]
    pub(crate) fn leaves_king_in_check(&self, mv: Move, color: Color) -> bool {
        let mut probe = self.clone();
        probe.make_move(mv);
        probe.is_king_in_check(color)
    }

    /// Whether `color`'s king is attacked. A board with no king for `color`
    /// is never in check.
    #[must_use]
    pub fn is_king_in_check(&self, color: Color) -> bool {
        match self.king(color) {
            Some(loc) => self.attack_map(color.opponent()).contains(loc),
            None => false,
        }
    }

    /// Checkmate: no legal moves while in check.
    #[must_use]
    pub fn is_checkmate(&self, color: Color, previous: Option<&LastMove>) -> bool {
        self.is_king_in_check(color) && self.legal_moves(color, previous).is_empty()
    }

    /// Stalemate: no legal moves while not in check.
    #[must_use]
    pub fn is_stalemate(&self, color: Color, previous: Option<&LastMove>) -> bool {
        !self.is_king_in_check(color) && self.legal_moves(color, previous).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::types::{LastMove, PieceKind};

    #[test]
    fn starting_position_has_twenty_moves() {
        let board = PackedBoard::new();
        assert_eq!(board.legal_moves(Color::White, None).len(), 20);
        assert_eq!(board.legal_moves(Color::Black, None).len(), 20);
    }

    #[test]
    fn empty_rows_are_skipped() {
        // A lone rook sees 14 squares from the middle of an empty board.
        let mut board = PackedBoard::empty();
        board.set_piece(Location(3, 3), Color::White, PieceKind::Rook);
        assert_eq!(board.legal_moves(Color::White, None).len(), 14);
    }

    #[test]
    fn pinned_piece_may_not_expose_king() {
        let mut board = PackedBoard::empty();
        board.set_piece(Location(0, 4), Color::White, PieceKind::King);
        board.set_piece(Location(2, 4), Color::White, PieceKind::Knight);
        board.set_piece(Location(7, 4), Color::Black, PieceKind::Rook);
        board.set_piece(Location(7, 0), Color::Black, PieceKind::King);

        let moves = board.legal_moves(Color::White, None);
        assert!(
            moves.iter().all(|m| m.from != Location(2, 4)),
            "pinned knight must have no legal moves"
        );
    }

    #[test]
    fn en_passant_generated_from_previous_double_advance() {
        let mut board = PackedBoard::empty();
        board.set_piece(Location(0, 4), Color::White, PieceKind::King);
        board.set_piece(Location(7, 4), Color::Black, PieceKind::King);
        board.set_piece(Location(4, 4), Color::White, PieceKind::Pawn);
        board.set_piece(Location(4, 3), Color::Black, PieceKind::Pawn);

        let previous = LastMove {
            piece: PieceKind::Pawn,
            mv: Move::new(Location(6, 3), Location(4, 3)),
            promotion: None,
            is_capture: false,
        };

        let moves = board.legal_moves(Color::White, Some(&previous));
        let ep = Move::new(Location(4, 4), Location(5, 3));
        assert!(moves.contains(&ep), "en passant capture must be generated");
    }

    #[test]
    fn no_en_passant_without_context() {
        let mut board = PackedBoard::empty();
        board.set_piece(Location(0, 4), Color::White, PieceKind::King);
        board.set_piece(Location(7, 4), Color::Black, PieceKind::King);
        board.set_piece(Location(4, 4), Color::White, PieceKind::Pawn);
        board.set_piece(Location(4, 3), Color::Black, PieceKind::Pawn);

        let moves = board.legal_moves(Color::White, None);
        let ep = Move::new(Location(4, 4), Location(5, 3));
        assert!(!moves.contains(&ep));
    }

    #[test]
    fn both_castles_generated_when_paths_clear() {
        let mut board = PackedBoard::empty();
        board.set_piece(Location(0, 4), Color::White, PieceKind::King);
        board.set_piece(Location(0, 0), Color::White, PieceKind::Rook);
        board.set_piece(Location(0, 7), Color::White, PieceKind::Rook);
        board.set_piece(Location(7, 4), Color::Black, PieceKind::King);

        let moves = board.legal_moves(Color::White, None);
        let castles: Vec<_> = moves
            .iter()
            .filter(|m| m.from == Location(0, 4) && m.from.col().abs_diff(m.to.col()) == 2)
            .collect();
        assert_eq!(castles.len(), 2, "expected exactly two castle moves");
    }

    #[test]
    fn no_castles_when_transit_attacked() {
        let mut board = PackedBoard::empty();
        board.set_piece(Location(0, 4), Color::White, PieceKind::King);
        board.set_piece(Location(0, 0), Color::White, PieceKind::Rook);
        board.set_piece(Location(0, 7), Color::White, PieceKind::Rook);
        board.set_piece(Location(7, 4), Color::Black, PieceKind::King);
        // Black rooks cover d1 and f1, one transit square of each castle.
        board.set_piece(Location(7, 3), Color::Black, PieceKind::Rook);
        board.set_piece(Location(7, 5), Color::Black, PieceKind::Rook);

        let moves = board.legal_moves(Color::White, None);
        let castles: Vec<_> = moves
            .iter()
            .filter(|m| m.from == Location(0, 4) && m.from.col().abs_diff(m.to.col()) == 2)
            .collect();
        assert_eq!(castles.len(), 0, "attacked transit squares forbid castling");
    }

    #[test]
    fn no_castles_after_king_moved() {
        let mut board = PackedBoard::empty();
        board.set_piece(Location(0, 4), Color::White, PieceKind::King);
        board.set_piece(Location(0, 0), Color::White, PieceKind::Rook);
        board.set_piece(Location(0, 7), Color::White, PieceKind::Rook);
        board.set_piece(Location(7, 4), Color::Black, PieceKind::King);
        board.set_flag(crate::board::BoardFlag::KingMoved, Color::White, true);

        let moves = board.legal_moves(Color::White, None);
        assert!(moves
            .iter()
            .all(|m| !(m.from == Location(0, 4) && m.from.col().abs_diff(m.to.col()) == 2)));
    }

    #[test]
    fn promotion_moves_carry_all_choices() {
        let mut board = PackedBoard::empty();
        board.set_piece(Location(0, 4), Color::White, PieceKind::King);
        board.set_piece(Location(7, 0), Color::Black, PieceKind::King);
        board.set_piece(Location(6, 6), Color::White, PieceKind::Pawn);

        let moves = board.legal_moves(Color::White, None);
        let promotions: Vec<_> = moves
            .iter()
            .filter(|m| m.from == Location(6, 6) && m.to == Location(7, 6))
            .collect();
        assert_eq!(promotions.len(), 4);
        assert!(promotions.iter().all(|m| m.promotion.is_some()));
    }

    #[test]
    fn checkmate_and_stalemate_classification() {
        // Back-rank mate: Black king on h8, White rook on a8, White king g6.
        let mut mate = PackedBoard::empty();
        mate.set_piece(Location(7, 7), Color::Black, PieceKind::King);
        mate.set_piece(Location(7, 0), Color::White, PieceKind::Rook);
        mate.set_piece(Location(5, 6), Color::White, PieceKind::King);
        assert!(mate.is_checkmate(Color::Black, None));
        assert!(!mate.is_stalemate(Color::Black, None));

        // Classic stalemate: Black king a8, White queen b6, White king c6.
        let mut stale = PackedBoard::empty();
        stale.set_piece(Location(7, 0), Color::Black, PieceKind::King);
        stale.set_piece(Location(5, 1), Color::White, PieceKind::Queen);
        stale.set_piece(Location(5, 2), Color::White, PieceKind::King);
        assert!(stale.is_stalemate(Color::Black, None));
        assert!(!stale.is_checkmate(Color::Black, None));
    }

    #[test]
    fn attack_map_covers_pawn_diagonals_only() {
        let mut board = PackedBoard::empty();
        board.set_piece(Location(3, 3), Color::White, PieceKind::Pawn);

        let map = board.attack_map(Color::White);
        assert!(map.contains(Location(4, 2)));
        assert!(map.contains(Location(4, 4)));
        assert!(!map.contains(Location(4, 3)), "forward push is not an attack");
        assert_eq!(map.popcount(), 2);
    }
}
