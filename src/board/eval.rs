//! Static position evaluation.
//!
//! The evaluator is deterministic and side-to-move-relative: for any
//! non-terminal board, `evaluate(b, White) == -evaluate(b, Black)`. Scores
//! are cached per structural hash together with the perspective they were
//! computed for; a hit from the opposite perspective is negated rather than
//! recomputed.

use crate::cache::ShardedCache;

use super::packed::{BoardFlag, PackedBoard};
use super::types::{Color, LastMove, Location, PieceKind};

/// Sentinel for a won position (opponent checkmated). Losing positions are
/// `-INFINITY`; the pair negate cleanly.
pub const INFINITY: i32 = i32::MAX;

/// Multiplier applied to the base material table, keeping material dominant
/// over the positional terms.
pub const MATERIAL_WEIGHT: i32 = 100;

const ADVANCEMENT_BONUS: i32 = 5;
const DOUBLED_PAWN_PENALTY: i32 = 8;
/// Pawn advancement bonus indexed by rows advanced from the starting row;
/// doubles with each step toward promotion.
const PAWN_ADVANCE_BONUS: [i32; 6] = [0, 2, 4, 8, 16, 32];
const MOBILITY_WEIGHT: i32 = 2;
const ATTACK_WEIGHT: i32 = 1;
const CASTLED_BONUS: i32 = 30;
const CASTLE_SPOILED_PENALTY: i32 = 20;
const IN_CHECK_PENALTY: i32 = 50;
/// Fifty-move decay horizon: the score shrinks linearly with the half-move
/// clock, reaching half strength as the rule's 100 half-moves approach.
const FIFTY_MOVE_HORIZON: i64 = 200;

/// Full per-color breakdown of a static evaluation.
#[derive(Clone, Debug)]
pub struct Evaluation {
    /// The color the total is relative to.
    pub mover: Color,
    /// Piece counts indexed by [color][piece kind].
    pub piece_counts: [[u32; 6]; 2],
    /// Non-pawn pieces developed off their starting squares.
    pub advancement: [u32; 2],
    /// Pawn counts per column.
    pub pawn_columns: [[u32; 8]; 2],
    /// Pawn counts per row.
    pub pawn_rows: [[u32; 8]; 2],
    /// Legal move counts.
    pub mobility: [u32; 2],
    /// Attacked-square counts.
    pub attacks: [u32; 2],
    /// Signed score relative to `mover`.
    pub total: i32,
}

/// Static evaluator with a per-position score cache.
pub struct Evaluator {
    cache: ShardedCache<(i32, Color)>,
}

impl Evaluator {
    #[must_use]
    pub fn new() -> Self {
        Evaluator {
            cache: ShardedCache::new(),
        }
    }

    /// Score the board relative to `mover`.
    ///
    /// Terminal states short-circuit: `mover` checkmated is `-INFINITY`,
    /// the opponent checkmated is `+INFINITY`, stalemate is 0.
    pub fn evaluate(
        &self,
        board: &PackedBoard,
        mover: Color,
        previous: Option<&LastMove>,
    ) -> i32 {
        let hash = board.hash();
        // Scores are stored once per position under a canonical key slot,
        // tagged with the perspective they were computed for.
        if let Some((score, for_color)) = self.cache.get(&hash, Color::White) {
            return if for_color == mover { score } else { -score };
        }

        let score = self.compute(board, mover, previous);
        self.cache.insert(&hash, Color::White, (score, mover));
        score
    }

    fn compute(&self, board: &PackedBoard, mover: Color, previous: Option<&LastMove>) -> i32 {
        if board.legal_moves(mover, previous).is_empty() {
            return if board.is_king_in_check(mover) {
                -INFINITY
            } else {
                0
            };
        }
        let opponent = mover.opponent();
        if board.legal_moves(opponent, previous).is_empty() && board.is_king_in_check(opponent) {
            return INFINITY;
        }
        self.analyze(board, mover, previous).total
    }

    /// Compute the full breakdown for a non-terminal position.
    #[must_use]
    pub fn analyze(
        &self,
        board: &PackedBoard,
        mover: Color,
        previous: Option<&LastMove>,
    ) -> Evaluation {
        let mut piece_counts = [[0u32; 6]; 2];
        let mut advancement = [0u32; 2];
        let mut pawn_columns = [[0u32; 8]; 2];
        let mut pawn_rows = [[0u32; 8]; 2];
        let mut tally = [0i32; 2];

        for row in 0..8 {
            if board.row_bits(row) == 0 {
                continue;
            }
            for col in 0..8 {
                let loc = Location(row, col);
                let Some((color, kind)) = board.piece_at(loc) else {
                    continue;
                };
                let c = color.index();
                piece_counts[c][kind_index(kind)] += 1;
                tally[c] += kind.material() * MATERIAL_WEIGHT;

                if kind == PieceKind::Pawn {
                    pawn_columns[c][col] += 1;
                    pawn_rows[c][row] += 1;
                    let advanced = row.abs_diff(color.pawn_start_row()).min(5);
                    tally[c] += PAWN_ADVANCE_BONUS[advanced];
                } else if !is_start_square(kind, color, loc) {
                    advancement[c] += 1;
                    tally[c] += ADVANCEMENT_BONUS;
                }
            }
        }

        // Doubled pawns: each extra pawn on a column costs twice the last.
        for color in Color::BOTH {
            let c = color.index();
            for col in 0..8 {
                let count = pawn_columns[c][col];
                for extra in 1..count {
                    tally[c] -= DOUBLED_PAWN_PENALTY << (extra - 1);
                }
            }
        }

        let mut mobility = [0u32; 2];
        let mut attacks = [0u32; 2];
        for color in Color::BOTH {
            let c = color.index();
            mobility[c] = board.legal_moves(color, previous).len() as u32;
            attacks[c] = board.attack_map(color).popcount();
            tally[c] += mobility[c] as i32 * MOBILITY_WEIGHT;
            tally[c] += attacks[c] as i32 * ATTACK_WEIGHT;

            if board.flag(BoardFlag::Castled, color) {
                tally[c] += CASTLED_BONUS;
            } else if board.flag(BoardFlag::KingMoved, color) {
                tally[c] -= CASTLE_SPOILED_PENALTY;
            }

            if board.is_king_in_check(color) {
                tally[c] -= IN_CHECK_PENALTY;
            }
        }

        let raw = tally[mover.index()] - tally[mover.opponent().index()];
        let clock = i64::from(board.halfmove_clock().min(100));
        let total = (i64::from(raw) - i64::from(raw) * clock / FIFTY_MOVE_HORIZON) as i32;

        Evaluation {
            mover,
            piece_counts,
            advancement,
            pawn_columns,
            pawn_rows,
            mobility,
            attacks,
            total,
        }
    }

    /// Drop every cached score. Call between games.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::new()
    }
}

#[inline]
const fn kind_index(kind: PieceKind) -> usize {
    match kind {
        PieceKind::Pawn => 0,
        PieceKind::Knight => 1,
        PieceKind::Bishop => 2,
        PieceKind::Rook => 3,
        PieceKind::Queen => 4,
        PieceKind::King => 5,
    }
}

fn is_start_square(kind: PieceKind, color: Color, loc: Location) -> bool {
    let row = color.back_row();
    match kind {
        PieceKind::Pawn => loc.row() == color.pawn_start_row(),
        PieceKind::Knight => loc == Location(row, 1) || loc == Location(row, 6),
        PieceKind::Bishop => loc == Location(row, 2) || loc == Location(row, 5),
        PieceKind::Rook => loc == Location(row, 0) || loc == Location(row, 7),
        PieceKind::Queen => loc == Location(row, 3),
        PieceKind::King => loc == Location(row, 4),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_is_balanced() {
        let board = PackedBoard::new();
        let evaluator = Evaluator::new();
        assert_eq!(evaluator.evaluate(&board, Color::White, None), 0);
    }

    #[test]
    fn symmetry_holds_without_cache_assistance() {
        let mut board = PackedBoard::new();
        board.make_move(crate::board::Move::new(Location(1, 4), Location(3, 4)));

        // Separate evaluators so each perspective is computed from scratch.
        let white = Evaluator::new().evaluate(&board, Color::White, None);
        let black = Evaluator::new().evaluate(&board, Color::Black, None);
        assert_eq!(white, -black);
    }

    #[test]
    fn opposite_perspective_hit_negates() {
        let mut board = PackedBoard::new();
        board.make_move(crate::board::Move::new(Location(1, 4), Location(3, 4)));

        let evaluator = Evaluator::new();
        let white = evaluator.evaluate(&board, Color::White, None);
        let black = evaluator.evaluate(&board, Color::Black, None);
        assert_eq!(white, -black);
    }

    #[test]
    fn extra_queen_is_worth_at_least_her_material() {
        let evaluator = Evaluator::new();
        let base = PackedBoard::new();
        let base_eval = evaluator.analyze(&base, Color::White, None);

        let mut with_queen = PackedBoard::new();
        with_queen.set_piece(Location(3, 3), Color::White, PieceKind::Queen);
        let queen_eval = Evaluator::new().analyze(&with_queen, Color::White, None);

        let queen_worth = PieceKind::Queen.material() * MATERIAL_WEIGHT;
        assert!(
            queen_eval.total >= base_eval.total + queen_worth,
            "total {} should exceed base {} by at least {}",
            queen_eval.total,
            base_eval.total,
            queen_worth
        );
    }

    #[test]
    fn checkmate_scores_are_sentinels() {
        // Back-rank mate against Black.
        let mut board = PackedBoard::empty();
        board.set_piece(Location(7, 7), Color::Black, PieceKind::King);
        board.set_piece(Location(7, 0), Color::White, PieceKind::Rook);
        board.set_piece(Location(5, 6), Color::White, PieceKind::King);

        let evaluator = Evaluator::new();
        assert_eq!(evaluator.evaluate(&board, Color::Black, None), -INFINITY);
        assert_eq!(Evaluator::new().evaluate(&board, Color::White, None), INFINITY);
    }

    #[test]
    fn stalemate_scores_zero() {
        let mut board = PackedBoard::empty();
        board.set_piece(Location(7, 0), Color::Black, PieceKind::King);
        board.set_piece(Location(5, 1), Color::White, PieceKind::Queen);
        board.set_piece(Location(5, 2), Color::White, PieceKind::King);

        let evaluator = Evaluator::new();
        assert_eq!(evaluator.evaluate(&board, Color::Black, None), 0);
    }

    #[test]
    fn doubled_pawns_are_penalized() {
        let evaluator = Evaluator::new();

        let mut split = PackedBoard::empty();
        split.set_piece(Location(0, 4), Color::White, PieceKind::King);
        split.set_piece(Location(7, 4), Color::Black, PieceKind::King);
        split.set_piece(Location(2, 2), Color::White, PieceKind::Pawn);
        split.set_piece(Location(2, 3), Color::White, PieceKind::Pawn);
        let split_eval = evaluator.analyze(&split, Color::White, None);

        let mut doubled = PackedBoard::empty();
        doubled.set_piece(Location(0, 4), Color::White, PieceKind::King);
        doubled.set_piece(Location(7, 4), Color::Black, PieceKind::King);
        doubled.set_piece(Location(2, 2), Color::White, PieceKind::Pawn);
        doubled.set_piece(Location(3, 2), Color::White, PieceKind::Pawn);
        let doubled_eval = Evaluator::new().analyze(&doubled, Color::White, None);

        assert!(doubled_eval.total < split_eval.total);
    }

    #[test]
    fn fifty_move_clock_decays_score() {
        let mut board = PackedBoard::new();
        board.set_piece(Location(3, 3), Color::White, PieceKind::Queen);

        let fresh = Evaluator::new().evaluate(&board, Color::White, None);

        let mut aged = board.clone();
        aged.set_halfmove_clock(80);
        let decayed = Evaluator::new().evaluate(&aged, Color::White, None);

        assert!(decayed < fresh, "decayed {decayed} should be below fresh {fresh}");
        assert!(decayed > 0);
    }
}
