//! Jamboree: speculative parallel principal variation search.
//!
//! The principal child is searched serially with the full window to seed
//! alpha; the remaining children are searched in parallel with a null
//! window. The first sibling to prove a beta cutoff cancels the others
//! through a nested cancel scope; siblings whose probe beats alpha are
//! re-searched serially afterwards with the full window. Live speculative
//! tasks are bounded by a permit counter sized to the configured worker
//! count; siblings beyond the bound are searched inline.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::board::{Color, LastMove, Move, PackedBoard, INFINITY};
use crate::cache::JamboreeEntry;
use crate::sync::{CancelScope, StopFlag};

use super::{order_first, ScoredMove, SearchEngine};

/// Take one speculative-thread permit if any remain.
fn try_acquire(permits: &AtomicUsize) -> bool {
    permits
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |p| p.checked_sub(1))
        .is_ok()
}

impl SearchEngine {
    pub(super) fn jamboree_root(
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

        let tt_move = self
            .jamboree_cache
            .get(&board.hash(), mover)
            .and_then(|e| e.lock().best_move);
        let ordered = order_first(&moves, tt_move);

        let permits = AtomicUsize::new(self.config.workers.saturating_sub(1));
        let cancel = CancelScope::root();

        let (score, best_idx) = self.jamboree_children(
            board, mover, previous, &ordered, depth, -INFINITY, INFINITY, stop, &cancel, &permits,
        );
        let mv = ordered[best_idx];

        if !stop.is_stopped() {
            self.store_jamboree(board, mover, depth, score, mv);
        }

        Some(ScoredMove {
            mv,
            score,
            sequence: self.jamboree_line(board, mover, previous, depth as usize, mv),
        })
    }

    /// Recursive Jamboree node.
    #[allow(clippy::too_many_arguments)]
    fn jamboree(
        &self,
        board: &PackedBoard,
        to_move: Color,
        previous: Option<&LastMove>,
        depth: u32,
        alpha: i32,
        beta: i32,
        stop: &StopFlag,
        cancel: &CancelScope<'_>,
        permits: &AtomicUsize,
    ) -> i32 {
        if stop.is_stopped() || cancel.is_cancelled() {
            return 0;
        }
        if depth == 0 {
            return self.leaf_score(board, to_move, previous, alpha, beta, stop);
        }

        let hash = board.hash();
        let mut tt_move = None;
        if let Some(entry) = self.jamboree_cache.get(&hash, to_move) {
            let e = entry.lock();
            tt_move = e.best_move;
            // Entries are trusted only at the exact requested depth.
            if e.depth == depth {
                self.metrics.count_cache_hit();
                self.metrics.count_tt_prune();
                return e.score;
            }
        }

        let moves = board.legal_moves(to_move, previous);
        if moves.is_empty() {
            self.metrics.count_eval();
            return self.evaluator.evaluate(board, to_move, previous);
        }
        let ordered = order_first(&moves, tt_move);

        let (best, best_idx) = self.jamboree_children(
            board, to_move, previous, &ordered, depth, alpha, beta, stop, cancel, permits,
        );

        // Only completed, exact values are worth publishing: a cached score
        // is reused as the node's value, not as a bound.
        if !stop.is_stopped() && !cancel.is_cancelled() && best > alpha && best < beta {
            self.store_jamboree(board, to_move, depth, best, ordered[best_idx]);
        }
        best
    }

    /// Search an ordered, non-empty child list: principal child serial,
    /// siblings speculative, then the serial re-search pass. Returns the
    /// fail-soft value and the index of the best child.
    #[allow(clippy::too_many_arguments)]
    fn jamboree_children(
        &self,
        board: &PackedBoard,
        to_move: Color,
        previous: Option<&LastMove>,
        moves: &[Move],
        depth: u32,
        alpha: i32,
        beta: i32,
        stop: &StopFlag,
        cancel: &CancelScope<'_>,
        permits: &AtomicUsize,
    ) -> (i32, usize) {
        let opp = to_move.opponent();
        let mut alpha = alpha;

        // Principal child: full window, serial.
        let mut eldest = board.clone();
        let last = eldest.make_move(moves[0]);
        self.metrics.count_move();
        let mut best = -self.jamboree(&eldest, opp, Some(&last), depth - 1, -beta, -alpha, stop, cancel, permits);
        let mut best_idx = 0;
        alpha = alpha.max(best);
        if alpha >= beta {
            self.metrics.count_ab_prune();
            return (best, best_idx);
        }

        // Speculative siblings: null window at the seeded alpha. A sibling
        // that proves a beta cutoff cancels the whole brood.
        let node_cancel = cancel.child();
        let null_alpha = alpha;
        let null_beta = null_alpha.saturating_add(1);
        let mut probes: Vec<(usize, Option<i32>)> = Vec::with_capacity(moves.len() - 1);

        thread::scope(|s| {
            let mut handles = Vec::new();
            for (offset, mv) in moves[1..].iter().enumerate() {
                if stop.is_stopped() || node_cancel.is_cancelled() {
                    break;
                }
                let idx = offset + 1;
                let mut sibling = board.clone();
                let last = sibling.make_move(*mv);
                self.metrics.count_move();
                let nc = &node_cancel;
                let run = move || {
                    let g = -self.jamboree(
                        &sibling,
                        opp,
                        Some(&last),
                        depth - 1,
                        -null_beta,
                        -null_alpha,
                        stop,
                        nc,
                        permits,
                    );
                    // A probe that ran under a cancellation (or the global
                    // stop) may have been cut short; its value is invalid.
                    if nc.is_cancelled() || stop.is_stopped() {
                        return (idx, None);
                    }
                    if g >= beta {
                        // Race to the first proven cutoff: tear down the
                        // rest of the brood.
                        nc.cancel();
                    }
                    (idx, Some(g))
                };
                if try_acquire(permits) {
                    handles.push(s.spawn(move || {
                        let result = run();
                        permits.fetch_add(1, Ordering::Relaxed);
                        result
                    }));
                } else {
                    probes.push(run());
                }
            }
            for handle in handles {
                if let Ok(result) = handle.join() {
                    probes.push(result);
                }
            }
        });

        // Harvest: a proven cutoff ends the node; probes that beat alpha
        // are re-searched serially with the full window for their true
        // value.
        for (idx, g) in probes {
            let Some(g) = g else { continue };
            if g >= beta {
                self.metrics.count_ab_prune();
                if g > best {
                    best = g;
                    best_idx = idx;
                }
                return (best, best_idx);
            }
            if stop.is_stopped() || cancel.is_cancelled() {
                break;
            }
            if g > null_alpha {
                // Fail-high probe: only a lower bound; establish the true
                // value with a serial full-window re-search.
                let mut sibling = board.clone();
                let last = sibling.make_move(moves[idx]);
                self.metrics.count_move();
                let value = -self.jamboree(
                    &sibling,
                    opp,
                    Some(&last),
                    depth - 1,
                    -beta,
                    -alpha,
                    stop,
                    cancel,
                    permits,
                );
                if value > best {
                    best = value;
                    best_idx = idx;
                }
                alpha = alpha.max(value);
                if alpha >= beta {
                    self.metrics.count_ab_prune();
                    return (best, best_idx);
                }
            } else if g > best {
                // Fail-low probe: an upper bound, only relevant when the
                // whole node fails low.
                best = g;
                best_idx = idx;
            }
        }

        (best, best_idx)
    }

    fn store_jamboree(&self, board: &PackedBoard, color: Color, depth: u32, score: i32, mv: Move) {
        let entry = self
            .jamboree_cache
            .get_or_insert_with(&board.hash(), color, || {
                Arc::new(Mutex::new(JamboreeEntry {
                    depth: 0,
                    score: 0,
                    best_move: None,
                }))
            });
        let mut e = entry.lock();
        if depth >= e.depth {
            *e = JamboreeEntry {
                depth,
                score,
                best_move: Some(mv),
            };
        }
    }

    /// Reconstruct the line of cached best moves from this position.
    fn jamboree_line(
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
                .jamboree_cache
                .get(&walk.hash(), color)
                .and_then(|e| e.lock().best_move);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Location, PieceKind};
    use crate::search::{Algorithm, EngineConfig, SearchBudget};

    fn engine(workers: usize) -> SearchEngine {
        SearchEngine::new(EngineConfig {
            workers,
            quiescence: false,
            use_opening_table: false,
            ..EngineConfig::default()
        })
    }

    fn tactical_board() -> PackedBoard {
        let mut board = PackedBoard::empty();
        board.set_piece(Location(0, 4), Color::White, PieceKind::King);
        board.set_piece(Location(7, 4), Color::Black, PieceKind::King);
        board.set_piece(Location(3, 3), Color::White, PieceKind::Rook);
        board.set_piece(Location(3, 6), Color::Black, PieceKind::Queen);
        board.set_piece(Location(5, 6), Color::Black, PieceKind::Pawn);
        board
    }

    #[test]
    fn matches_minimax_value() {
        let board = tactical_board();
        let stop = StopFlag::new();
        let budget = SearchBudget::depth(3);

        let oracle = engine(1)
            .find_move(&board, Color::White, None, budget, Algorithm::Minimax, &stop)
            .expect("moves exist");
        let parallel = engine(4)
            .find_move(&board, Color::White, None, budget, Algorithm::Jamboree, &stop)
            .expect("moves exist");

        assert_eq!(parallel.best.score, oracle.best.score);
        assert_eq!(parallel.depth_achieved, 3);
    }

    #[test]
    fn serial_fallback_matches_parallel() {
        let board = tactical_board();
        let stop = StopFlag::new();
        let budget = SearchBudget::depth(3);

        let serial = engine(1)
            .find_move(&board, Color::White, None, budget, Algorithm::Jamboree, &stop)
            .expect("moves exist");
        let parallel = engine(8)
            .find_move(&board, Color::White, None, budget, Algorithm::Jamboree, &stop)
            .expect("moves exist");

        assert_eq!(serial.best.score, parallel.best.score);
    }

    #[test]
    fn principal_line_is_playable() {
        let board = PackedBoard::new();
        let stop = StopFlag::new();

        let outcome = engine(4)
            .find_move(
                &board,
                Color::White,
                None,
                SearchBudget::depth(3),
                Algorithm::Jamboree,
                &stop,
            )
            .expect("moves exist");

        // Replay the reported sequence from the root; every move must be
        // legal in turn.
        let mut replay = board.clone();
        let mut color = Color::White;
        let mut prev = None;
        for mv in &outcome.best.sequence {
            assert!(replay.legal_moves(color, prev.as_ref()).contains(mv));
            prev = Some(replay.make_move(*mv));
            color = color.opponent();
        }
    }
}
