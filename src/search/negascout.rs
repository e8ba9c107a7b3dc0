//! NegaScout (principal variation search) and quiescence.

use crate::board::{Color, LastMove, PackedBoard, PieceKind, INFINITY};
use crate::sync::StopFlag;

use super::{ScoredMove, SearchEngine};

impl SearchEngine {
    /// NegaScout from the root: the first move is searched with the full
    /// window, later moves with a null window and a full re-search only
    /// when the probe suggests an improvement.
    pub(super) fn negascout_root(
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

        let mut alpha = -INFINITY;
        let beta = INFINITY;
        let mut best_move = moves[0];

        for (i, mv) in moves.iter().enumerate() {
            if stop.is_stopped() {
                break;
            }
            let mut child = board.clone();
            let last = child.make_move(*mv);
            self.metrics.count_move();
            let opp = mover.opponent();

            let score = if i == 0 {
                -self.negascout(&child, opp, Some(&last), depth - 1, -beta, -alpha, stop)
            } else {
                let null_alpha = alpha.saturating_add(1);
                let mut probe =
                    -self.negascout(&child, opp, Some(&last), depth - 1, -null_alpha, -alpha, stop);
                if probe > alpha && probe < beta {
                    probe =
                        -self.negascout(&child, opp, Some(&last), depth - 1, -beta, -probe, stop);
                }
                probe
            };

            if score > alpha {
                alpha = score;
                best_move = *mv;
            }
        }

        Some(ScoredMove {
            mv: best_move,
            score: alpha,
            sequence: vec![best_move],
        })
    }

    fn negascout(
        &self,
        board: &PackedBoard,
        to_move: Color,
        previous: Option<&LastMove>,
        depth: u32,
        mut alpha: i32,
        beta: i32,
        stop: &StopFlag,
    ) -> i32 {
        if stop.is_stopped() {
            return 0;
        }
        if depth == 0 {
            return self.leaf_score(board, to_move, previous, alpha, beta, stop);
        }

        let moves = board.legal_moves(to_move, previous);
        if moves.is_empty() {
            self.metrics.count_eval();
            return self.evaluator.evaluate(board, to_move, previous);
        }

        let mut best = -INFINITY;
        for (i, mv) in moves.iter().enumerate() {
            if stop.is_stopped() {
                return best;
            }
            let mut child = board.clone();
            let last = child.make_move(*mv);
            self.metrics.count_move();
            let opp = to_move.opponent();

            let score = if i == 0 {
                -self.negascout(&child, opp, Some(&last), depth - 1, -beta, -alpha, stop)
            } else {
                let null_alpha = alpha.saturating_add(1);
                let mut probe =
                    -self.negascout(&child, opp, Some(&last), depth - 1, -null_alpha, -alpha, stop);
                if probe > alpha && probe < beta {
                    probe =
                        -self.negascout(&child, opp, Some(&last), depth - 1, -beta, -probe, stop);
                }
                probe
            };

            best = best.max(score);
            alpha = alpha.max(score);
            if alpha >= beta {
                self.metrics.count_ab_prune();
                break;
            }
        }
        best
    }

    /// Quiescence search: extend leaves through capture sequences with a
    /// stand-pat cutoff, so a hard depth cutoff does not misjudge a position
    /// in the middle of an exchange.
    pub(super) fn quiesce(
        &self,
        board: &PackedBoard,
        to_move: Color,
        previous: Option<&LastMove>,
        mut alpha: i32,
        beta: i32,
        qdepth: u32,
        stop: &StopFlag,
    ) -> i32 {
        self.metrics.count_eval();
        let stand_pat = self.evaluator.evaluate(board, to_move, previous);
        if qdepth == 0 || stop.is_stopped() {
            return stand_pat;
        }
        if stand_pat >= beta {
            return stand_pat;
        }
        alpha = alpha.max(stand_pat);

        let moves = board.legal_moves(to_move, previous);
        let mut best = stand_pat;
        for mv in moves.iter() {
            if !is_capture(board, *mv) {
                continue;
            }
            if stop.is_stopped() {
                break;
            }
            let mut child = board.clone();
            let last = child.make_move(*mv);
            self.metrics.count_move();
            let score = -self.quiesce(
                &child,
                to_move.opponent(),
                Some(&last),
                -beta,
                -alpha,
                qdepth - 1,
                stop,
            );
            best = best.max(score);
            alpha = alpha.max(score);
            if alpha >= beta {
                self.metrics.count_ab_prune();
                break;
            }
        }
        best
    }
}

/// A capture: the destination is occupied, or a pawn moves diagonally onto
/// an empty square (en passant).
fn is_capture(board: &PackedBoard, mv: crate::board::Move) -> bool {
    if board.piece_at(mv.to).is_some() {
        return true;
    }
    matches!(board.piece_at(mv.from), Some((_, PieceKind::Pawn)) if mv.from.col() != mv.to.col())
}
