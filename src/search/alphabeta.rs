//! Fail-soft alpha-beta with memory, and the MTDf driver built on it.

use crate::board::{Color, LastMove, Move, PackedBoard, INFINITY};
use crate::cache::AbEntry;
use crate::sync::StopFlag;

use super::{order_first, ScoredMove, SearchEngine};

/// Bound on MTDf null-window passes per depth. Convergence normally takes a
/// handful of passes; the cap guards against bound oscillation when cached
/// quiescence values disagree across windows.
const MAX_MTDF_PASSES: u32 = 64;

impl SearchEngine {
    /// Alpha-beta with memory at the full window, returning the best scored
    /// move with its principal line.
    pub(super) fn alphabeta_best(
        &self,
        board: &PackedBoard,
        mover: Color,
        previous: Option<&LastMove>,
        depth: u32,
        stop: &StopFlag,
    ) -> Option<ScoredMove> {
        let (score, best_move) =
            self.alphabeta_root(board, mover, previous, depth, -INFINITY, INFINITY, stop)?;
        let mv = best_move?;
        Some(ScoredMove {
            mv,
            score,
            sequence: self.principal_line(board, mover, previous, depth as usize, mv),
        })
    }

    /// MTDf: converge on the position's value with repeated null-window
    /// alpha-beta calls, seeded by the previous depth's score.
    pub(super) fn mtdf_root(
        &self,
        board: &PackedBoard,
        mover: Color,
        previous: Option<&LastMove>,
        depth: u32,
        guess: i32,
        stop: &StopFlag,
    ) -> Option<ScoredMove> {
        let mut g = guess;
        let mut lower = -INFINITY;
        let mut upper = INFINITY;
        let mut best_move: Option<Move> = None;

        for _ in 0..MAX_MTDF_PASSES {
            if stop.is_stopped() {
                break;
            }
            let beta = if g == lower { g.saturating_add(1) } else { g };
            let alpha = beta.saturating_sub(1).max(-INFINITY);

            let (score, mv) = self.alphabeta_root(board, mover, previous, depth, alpha, beta, stop)?;
            g = score;
            if mv.is_some() {
                best_move = mv;
            }

            if g < beta {
                upper = g;
            } else {
                lower = g;
            }
            if lower >= upper {
                break;
            }
        }

        let mv = best_move?;
        Some(ScoredMove {
            mv,
            score: g,
            sequence: self.principal_line(board, mover, previous, depth as usize, mv),
        })
    }

    /// Root move loop for alpha-beta with memory. Returns the fail-soft
    /// value and the best root move, or `None` with no legal moves.
    fn alphabeta_root(
        &self,
        board: &PackedBoard,
        mover: Color,
        previous: Option<&LastMove>,
        depth: u32,
        mut alpha: i32,
        beta: i32,
        stop: &StopFlag,
    ) -> Option<(i32, Option<Move>)> {
        let moves = board.legal_moves(mover, previous);
        if moves.is_empty() {
            return None;
        }
        let hash = board.hash();
        let tt_move = self.ab_cache.get(&hash, mover).and_then(|e| e.best_move);

        let (alpha0, beta0) = (alpha, beta);
        let mut best = -INFINITY;
        let mut best_move = None;

        for mv in order_first(&moves, tt_move) {
            if stop.is_stopped() {
                break;
            }
            let mut child = board.clone();
            let last = child.make_move(mv);
            self.metrics.count_move();
            let score = -self.alphabeta_memory(
                &child,
                mover.opponent(),
                Some(&last),
                depth - 1,
                -beta,
                -alpha,
                stop,
            );
            if score > best {
                best = score;
                best_move = Some(mv);
            }
            alpha = alpha.max(score);
            if alpha >= beta {
                self.metrics.count_ab_prune();
                break;
            }
        }

        if !stop.is_stopped() {
            self.store_ab(board, mover, depth, best, alpha0, beta0, best_move);
        }
        Some((best, best_move))
    }

    /// Fail-soft alpha-beta. On entry the window is narrowed from the cache
    /// (an immediate cutoff when a stored bound already decides the node);
    /// on exit the result is recorded as an upper bound, a lower bound, or
    /// an exact value.
    pub(super) fn alphabeta_memory(
        &self,
        board: &PackedBoard,
        to_move: Color,
        previous: Option<&LastMove>,
        depth: u32,
        mut alpha: i32,
        mut beta: i32,
        stop: &StopFlag,
    ) -> i32 {
        if stop.is_stopped() {
            return 0;
        }
        if depth == 0 {
            return self.leaf_score(board, to_move, previous, alpha, beta, stop);
        }

        let hash = board.hash();
        let mut tt_move = None;
        if let Some(entry) = self.ab_cache.get(&hash, to_move) {
            tt_move = entry.best_move;
            // Bounds apply only at the exact depth they were computed for.
            if entry.depth == depth {
                self.metrics.count_cache_hit();
                if entry.lower >= beta {
                    self.metrics.count_tt_prune();
                    return entry.lower;
                }
                if entry.upper <= alpha {
                    self.metrics.count_tt_prune();
                    return entry.upper;
                }
                alpha = alpha.max(entry.lower);
                beta = beta.min(entry.upper);
            }
        }

        let moves = board.legal_moves(to_move, previous);
        if moves.is_empty() {
            self.metrics.count_eval();
            return self.evaluator.evaluate(board, to_move, previous);
        }

        let (alpha0, beta0) = (alpha, beta);
        let mut best = -INFINITY;
        let mut best_move = None;

        for mv in order_first(&moves, tt_move) {
            if stop.is_stopped() {
                return best;
            }
            let mut child = board.clone();
            let last = child.make_move(mv);
            self.metrics.count_move();
            let score = -self.alphabeta_memory(
                &child,
                to_move.opponent(),
                Some(&last),
                depth - 1,
                -beta,
                -alpha,
                stop,
            );
            if score > best {
                best = score;
                best_move = Some(mv);
            }
            alpha = alpha.max(score);
            if alpha >= beta {
                self.metrics.count_ab_prune();
                break;
            }
        }

        if !stop.is_stopped() {
            self.store_ab(board, to_move, depth, best, alpha0, beta0, best_move);
        }
        best
    }

    /// Record a search result, merging with any entry at the same depth.
    fn store_ab(
        &self,
        board: &PackedBoard,
        color: Color,
        depth: u32,
        value: i32,
        alpha0: i32,
        beta0: i32,
        best_move: Option<Move>,
    ) {
        self.ab_cache.update(&board.hash(), color, |current| {
            let mut entry = match current {
                Some(e) if e.depth == depth => *e,
                _ => AbEntry::open(depth),
            };
            if value <= alpha0 {
                entry.upper = entry.upper.min(value);
            } else if value >= beta0 {
                entry.lower = entry.lower.max(value);
            } else {
                entry.lower = value;
                entry.upper = value;
            }
            if best_move.is_some() {
                entry.best_move = best_move;
            }
            Some(entry)
        });
    }

    /// Reconstruct the principal line by walking cached best moves,
    /// verifying each against the legal move list.
    pub(super) fn principal_line(
        &self,
        board: &PackedBoard,
        mover: Color,
        previous: Option<&LastMove>,
        max_len: usize,
        first: Move,
    ) -> Vec<Move> {
        let mut line = Vec::with_capacity(max_len);
        let mut walk = board.clone();
        let mut color = mover;
        let mut prev = previous.copied();
        let mut next = Some(first);

        while let Some(mv) = next {
            if line.len() >= max_len {
                break;
            }
            if !walk.legal_moves(color, prev.as_ref()).contains(&mv) {
                break;
            }
            prev = Some(walk.make_move(mv));
            line.push(mv);
            color = color.opponent();
            next = self
                .ab_cache
                .get(&walk.hash(), color)
                .and_then(|e| e.best_move);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Location, PieceKind};
    use crate::search::{Algorithm, EngineConfig, SearchBudget};

    fn quiet_engine() -> SearchEngine {
        SearchEngine::new(EngineConfig {
            quiescence: false,
            use_opening_table: false,
            ..EngineConfig::default()
        })
    }

    #[test]
    fn agrees_with_minimax_on_tactical_position() {
        let mut board = PackedBoard::empty();
        board.set_piece(Location(0, 4), Color::White, PieceKind::King);
        board.set_piece(Location(7, 4), Color::Black, PieceKind::King);
        board.set_piece(Location(3, 3), Color::White, PieceKind::Rook);
        board.set_piece(Location(3, 6), Color::Black, PieceKind::Queen);
        board.set_piece(Location(5, 6), Color::Black, PieceKind::Pawn);

        let stop = StopFlag::new();
        let budget = SearchBudget::depth(3);

        let oracle = quiet_engine()
            .find_move(&board, Color::White, None, budget, Algorithm::Minimax, &stop)
            .expect("moves exist");
        let ab = quiet_engine()
            .find_move(
                &board,
                Color::White,
                None,
                budget,
                Algorithm::AlphaBetaWithMemory,
                &stop,
            )
            .expect("moves exist");

        assert_eq!(ab.best.score, oracle.best.score);
    }

    #[test]
    fn pruning_reduces_moves_considered() {
        let board = PackedBoard::new();
        let stop = StopFlag::new();
        let budget = SearchBudget::depth(3);

        let oracle_engine = quiet_engine();
        let oracle = oracle_engine
            .find_move(&board, Color::White, None, budget, Algorithm::Minimax, &stop)
            .expect("moves exist");

        let ab_engine = quiet_engine();
        let ab = ab_engine
            .find_move(
                &board,
                Color::White,
                None,
                budget,
                Algorithm::AlphaBetaWithMemory,
                &stop,
            )
            .expect("moves exist");

        assert_eq!(ab.best.score, oracle.best.score);
        assert!(
            ab.metrics.moves_considered < oracle.metrics.moves_considered,
            "alpha-beta ({}) should visit fewer nodes than minimax ({})",
            ab.metrics.moves_considered,
            oracle.metrics.moves_considered
        );
        assert!(ab.metrics.pruned_alpha_beta > 0);
    }

    #[test]
    fn mtdf_matches_full_window_value() {
        let mut board = PackedBoard::empty();
        board.set_piece(Location(0, 0), Color::White, PieceKind::King);
        board.set_piece(Location(7, 7), Color::Black, PieceKind::King);
        board.set_piece(Location(4, 2), Color::White, PieceKind::Queen);
        board.set_piece(Location(3, 5), Color::Black, PieceKind::Rook);

        let stop = StopFlag::new();
        let budget = SearchBudget::depth(3);

        let ab = quiet_engine()
            .find_move(
                &board,
                Color::White,
                None,
                budget,
                Algorithm::AlphaBetaWithMemory,
                &stop,
            )
            .expect("moves exist");
        let mtdf = quiet_engine()
            .find_move(&board, Color::White, None, budget, Algorithm::Mtdf, &stop)
            .expect("moves exist");

        assert_eq!(mtdf.best.score, ab.best.score);
        assert_eq!(mtdf.depth_achieved, 3);
    }

    #[test]
    fn principal_line_starts_with_best_move() {
        let board = PackedBoard::new();
        let stop = StopFlag::new();

        let outcome = quiet_engine()
            .find_move(
                &board,
                Color::White,
                None,
                SearchBudget::depth(3),
                Algorithm::AlphaBetaWithMemory,
                &stop,
            )
            .expect("moves exist");

        assert!(!outcome.best.sequence.is_empty());
        assert_eq!(outcome.best.sequence[0], outcome.best.mv);
    }
}
