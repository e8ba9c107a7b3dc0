//! ABDADA parallel search.
//!
//! A fixed pool of workers all search the full tree from the root against
//! the shared transposition cache. Entries carry an active-searcher count:
//! a probe at the same depth while another worker is inside the subtree
//! returns an on-evaluation sentinel, and the caller defers that move to a
//! second pass instead of duplicating the work (young-brothers-wait). The
//! deduplication is best effort, not an exclusivity guarantee.

use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::board::{Color, LastMove, Move, PackedBoard, INFINITY};
use crate::cache::{AbdadaBound, AbdadaEntry};
use crate::sync::StopFlag;

use super::{ScoredMove, SearchEngine};

/// Sentinel returned unnegated when a probe finds the position already
/// being searched at this depth. Distinct from every score in
/// `[-INFINITY, INFINITY]`.
const ON_EVALUATION: i32 = i32::MIN;

/// Outcome of registering at a node's cache entry.
enum Probe {
    /// Another worker is already searching this position at this depth.
    Busy,
    /// A stored bound decides the node outright.
    Cutoff(i32),
    /// Proceed with a (possibly narrowed) window.
    Window {
        alpha: i32,
        beta: i32,
        registered: bool,
    },
}

impl SearchEngine {
    /// Run the worker pool for one depth and return the published result.
    pub(super) fn abdada_depth(
        &self,
        board: &PackedBoard,
        mover: Color,
        previous: Option<&LastMove>,
        depth: u32,
        stop: &StopFlag,
    ) -> Option<ScoredMove> {
        if board.legal_moves(mover, previous).is_empty() {
            return None;
        }

        let workers = self.config.workers.max(1);
        let pool_stop = StopFlag::new();
        let result: Mutex<Option<(i32, Move)>> = Mutex::new(None);

        thread::scope(|s| {
            for worker_id in 0..workers {
                let board = board.clone();
                let pool_stop = &pool_stop;
                let result = &result;
                s.spawn(move || {
                    let outcome =
                        self.abdada_root(&board, mover, previous, depth, worker_id, stop, pool_stop);
                    if let Some((score, mv)) = outcome {
                        let mut guard = result.lock();
                        if guard.is_none() {
                            *guard = Some((score, mv));
                            if self.config.abort_after_first {
                                pool_stop.stop();
                            }
                        }
                    }
                });
            }
        });

        result.into_inner().map(|(score, mv)| ScoredMove {
            mv,
            score,
            sequence: vec![mv],
        })
    }

    /// One worker's root search. Returns `None` when the worker was stopped
    /// before finishing its root move loop.
    fn abdada_root(
        &self,
        board: &PackedBoard,
        mover: Color,
        previous: Option<&LastMove>,
        depth: u32,
        worker_id: usize,
        stop: &StopFlag,
        pool_stop: &StopFlag,
    ) -> Option<(i32, Move)> {
        let moves = board.legal_moves(mover, previous);
        if moves.is_empty() {
            return None;
        }

        // Stagger each worker's root ordering so the pool explores
        // different subtrees first and populates the cache for the others.
        let mut ordered: Vec<Move> = moves.to_vec();
        if worker_id > 0 {
            let len = ordered.len();
            ordered.rotate_left(worker_id % len);
        }

        let mut alpha = -INFINITY;
        let beta = INFINITY;
        let mut best = -INFINITY;
        let mut best_move = ordered[0];
        let mut deferred = Vec::new();
        let opp = mover.opponent();

        for (i, mv) in ordered.iter().enumerate() {
            if stop.is_stopped() || pool_stop.is_stopped() {
                return None;
            }
            let mut child = board.clone();
            let last = child.make_move(*mv);
            self.metrics.count_move();
            let r = self.abdada(&child, opp, Some(&last), depth - 1, -beta, -alpha, i != 0, stop, pool_stop);
            if r == ON_EVALUATION {
                deferred.push(*mv);
                continue;
            }
            let score = -r;
            if score > best {
                best = score;
                best_move = *mv;
            }
            alpha = alpha.max(score);
        }

        for mv in deferred {
            if stop.is_stopped() || pool_stop.is_stopped() {
                return None;
            }
            let mut child = board.clone();
            let last = child.make_move(mv);
            self.metrics.count_move();
            let r = self.abdada(&child, opp, Some(&last), depth - 1, -beta, -alpha, false, stop, pool_stop);
            let score = -r;
            if score > best {
                best = score;
                best_move = mv;
            }
            alpha = alpha.max(score);
        }

        if stop.is_stopped() || pool_stop.is_stopped() {
            return None;
        }
        Some((best, best_move))
    }

    /// The recursive ABDADA search. Returns the (unnegated) sentinel
    /// `ON_EVALUATION` when `exclusive` and the position is already being
    /// searched at this depth; callers defer the move instead of negating.
    #[allow(clippy::too_many_arguments)]
    fn abdada(
        &self,
        board: &PackedBoard,
        to_move: Color,
        previous: Option<&LastMove>,
        depth: u32,
        alpha: i32,
        beta: i32,
        exclusive: bool,
        stop: &StopFlag,
        pool_stop: &StopFlag,
    ) -> i32 {
        if stop.is_stopped() || pool_stop.is_stopped() {
            return 0;
        }
        if depth == 0 {
            return self.leaf_score(board, to_move, previous, alpha, beta, stop);
        }

        // Move generation runs unconditionally; the cache probe never gates
        // it.
        let moves = board.legal_moves(to_move, previous);
        if moves.is_empty() {
            self.metrics.count_eval();
            return self.evaluator.evaluate(board, to_move, previous);
        }

        let hash = board.hash();
        let entry = self
            .abdada_cache
            .get_or_insert_with(&hash, to_move, || {
                Arc::new(Mutex::new(AbdadaEntry::fresh(depth)))
            });

        let (mut alpha, beta, registered) = match self.abdada_enter(&entry, depth, alpha, beta, exclusive)
        {
            Probe::Busy => return ON_EVALUATION,
            Probe::Cutoff(score) => return score,
            Probe::Window {
                alpha,
                beta,
                registered,
            } => (alpha, beta, registered),
        };
        let alpha0 = alpha;

        let mut best = -INFINITY;
        let mut deferred = Vec::new();
        let opp = to_move.opponent();

        let mut pruned = false;
        for (i, mv) in moves.iter().enumerate() {
            if stop.is_stopped() || pool_stop.is_stopped() {
                pruned = true;
                break;
            }
            let mut child = board.clone();
            let last = child.make_move(*mv);
            self.metrics.count_move();
            let r = self.abdada(&child, opp, Some(&last), depth - 1, -beta, -alpha, i != 0, stop, pool_stop);
            if r == ON_EVALUATION {
                deferred.push(*mv);
                continue;
            }
            let score = -r;
            best = best.max(score);
            alpha = alpha.max(score);
            if alpha >= beta {
                self.metrics.count_ab_prune();
                pruned = true;
                break;
            }
        }

        if !pruned {
            // Second pass: moves another worker was busy with, no longer
            // exclusive.
            for mv in deferred {
                if stop.is_stopped() || pool_stop.is_stopped() {
                    break;
                }
                let mut child = board.clone();
                let last = child.make_move(mv);
                self.metrics.count_move();
                let r = self.abdada(&child, opp, Some(&last), depth - 1, -beta, -alpha, false, stop, pool_stop);
                let score = -r;
                best = best.max(score);
                alpha = alpha.max(score);
                if alpha >= beta {
                    self.metrics.count_ab_prune();
                    break;
                }
            }
        }

        let aborted = stop.is_stopped() || pool_stop.is_stopped();
        self.abdada_leave(&entry, depth, best, alpha0, beta, registered, aborted);
        best
    }

    fn abdada_enter(
        &self,
        entry: &Arc<Mutex<AbdadaEntry>>,
        depth: u32,
        alpha: i32,
        beta: i32,
        exclusive: bool,
    ) -> Probe {
        let mut e = entry.lock();

        if e.depth == depth {
            self.metrics.count_cache_hit();
            match e.bound {
                AbdadaBound::Exact => {
                    self.metrics.count_tt_prune();
                    return Probe::Cutoff(e.score);
                }
                AbdadaBound::Lower if e.score >= beta => {
                    self.metrics.count_tt_prune();
                    return Probe::Cutoff(e.score);
                }
                AbdadaBound::Upper if e.score <= alpha => {
                    self.metrics.count_tt_prune();
                    return Probe::Cutoff(e.score);
                }
                _ => {}
            }
            if exclusive && e.active_searchers > 0 {
                return Probe::Busy;
            }
            let (mut alpha, mut beta) = (alpha, beta);
            match e.bound {
                AbdadaBound::Lower => alpha = alpha.max(e.score),
                AbdadaBound::Upper => beta = beta.min(e.score),
                _ => {}
            }
            e.active_searchers += 1;
            Probe::Window {
                alpha,
                beta,
                registered: true,
            }
        } else if e.depth < depth {
            // Shallower entry: repurpose it for this depth.
            *e = AbdadaEntry::fresh(depth);
            e.active_searchers = 1;
            Probe::Window {
                alpha,
                beta,
                registered: true,
            }
        } else {
            // A deeper entry exists; search without touching it.
            Probe::Window {
                alpha,
                beta,
                registered: false,
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn abdada_leave(
        &self,
        entry: &Arc<Mutex<AbdadaEntry>>,
        depth: u32,
        value: i32,
        alpha0: i32,
        beta: i32,
        registered: bool,
        aborted: bool,
    ) {
        let mut e = entry.lock();
        if registered && e.depth == depth {
            e.active_searchers = e.active_searchers.saturating_sub(1);
        }
        if aborted || e.depth != depth {
            return;
        }

        let bound = if value <= alpha0 {
            AbdadaBound::Upper
        } else if value >= beta {
            AbdadaBound::Lower
        } else {
            AbdadaBound::Exact
        };

        match (e.bound, bound) {
            (AbdadaBound::Exact, _) => {}
            (_, AbdadaBound::Exact) => {
                e.bound = AbdadaBound::Exact;
                e.score = value;
            }
            (AbdadaBound::Lower, AbdadaBound::Lower) => e.score = e.score.max(value),
            (AbdadaBound::Upper, AbdadaBound::Upper) => e.score = e.score.min(value),
            _ => {
                e.bound = bound;
                e.score = value;
            }
        }
    }
}
