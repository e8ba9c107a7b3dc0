//! Exhaustive minimax.
//!
//! No pruning and no cache: slow, but its value is the ground truth the
//! pruned and parallel algorithms are tested against.

use crate::board::{Color, LastMove, PackedBoard, INFINITY};
use crate::sync::StopFlag;

use super::{ScoredMove, SearchEngine};

impl SearchEngine {
    pub(super) fn minimax_root(
        &self,
        board: &PackedBoard,
        mover: Color,
        previous: Option<&LastMove>,
        depth: u32,
        stop: &StopFlag,
    ) -> Option<ScoredMove> {
        let moves = board.legal_moves(mover, previous);
        if moves.is_empty() {
            return None;
        }

        let mut best: Option<(i32, crate::board::Move)> = None;
        for mv in moves.iter() {
            if stop.is_stopped() {
                break;
            }
            let mut child = board.clone();
            let last = child.make_move(*mv);
            self.metrics.count_move();
            let score = self.minimax(
                &child,
                mover,
                mover.opponent(),
                Some(&last),
                depth.saturating_sub(1),
                stop,
            );
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, *mv));
            }
        }

        best.map(|(score, mv)| ScoredMove {
            mv,
            score,
            sequence: vec![mv],
        })
    }

    fn minimax(
        &self,
        board: &PackedBoard,
        root: Color,
        to_move: Color,
        previous: Option<&LastMove>,
        depth: u32,
        stop: &StopFlag,
    ) -> i32 {
        if stop.is_stopped() {
            return 0;
        }

        // Leaf: depth exhausted, or no legal moves (mate/stalemate). The
        // evaluator is side-to-move-relative, so flip for the root color.
        let moves = board.legal_moves(to_move, previous);
        if depth == 0 || moves.is_empty() {
            self.metrics.count_eval();
            let relative = self.evaluator.evaluate(board, to_move, previous);
            return if to_move == root { relative } else { -relative };
        }

        let maximizing = to_move == root;
        let mut best = if maximizing { -INFINITY } else { INFINITY };
        for mv in moves.iter() {
            let mut child = board.clone();
            let last = child.make_move(*mv);
            self.metrics.count_move();
            let score = self.minimax(
                &child,
                root,
                to_move.opponent(),
                Some(&last),
                depth - 1,
                stop,
            );
            best = if maximizing {
                best.max(score)
            } else {
                best.min(score)
            };
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Location, Move, PieceKind};
    use crate::search::{Algorithm, EngineConfig, SearchBudget};

    fn quiet_engine() -> SearchEngine {
        SearchEngine::new(EngineConfig {
            quiescence: false,
            use_opening_table: false,
            ..EngineConfig::default()
        })
    }

    #[test]
    fn depth_one_start_position_is_balanced() {
        let engine = quiet_engine();
        let board = PackedBoard::new();
        let stop = StopFlag::new();

        let outcome = engine
            .find_move(
                &board,
                Color::White,
                None,
                SearchBudget::depth(1),
                Algorithm::Minimax,
                &stop,
            )
            .expect("start position has moves");

        // At depth 1 no capture is available, so material never changes.
        assert!(outcome.metrics.moves_considered > 0);
        assert_eq!(outcome.depth_achieved, 1);
    }

    #[test]
    fn prefers_capturing_a_free_queen() {
        let mut board = PackedBoard::empty();
        board.set_piece(Location(0, 4), Color::White, PieceKind::King);
        board.set_piece(Location(7, 4), Color::Black, PieceKind::King);
        board.set_piece(Location(3, 3), Color::White, PieceKind::Rook);
        board.set_piece(Location(3, 6), Color::Black, PieceKind::Queen);

        let engine = quiet_engine();
        let stop = StopFlag::new();
        let outcome = engine
            .find_move(
                &board,
                Color::White,
                None,
                SearchBudget::depth(2),
                Algorithm::Minimax,
                &stop,
            )
            .expect("moves exist");

        assert_eq!(
            outcome.best.mv,
            Move::new(Location(3, 3), Location(3, 6)),
            "rook should take the undefended queen"
        );
    }

    #[test]
    fn checkmated_side_has_no_move() {
        let mut board = PackedBoard::empty();
        board.set_piece(Location(7, 7), Color::Black, PieceKind::King);
        board.set_piece(Location(7, 0), Color::White, PieceKind::Rook);
        board.set_piece(Location(5, 6), Color::White, PieceKind::King);

        let engine = quiet_engine();
        let stop = StopFlag::new();
        let outcome = engine.find_move(
            &board,
            Color::Black,
            None,
            SearchBudget::depth(2),
            Algorithm::Minimax,
            &stop,
        );
        assert!(outcome.is_none());
    }
}
