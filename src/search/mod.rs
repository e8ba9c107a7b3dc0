//! Search algorithms over the packed board.
//!
//! Implements a family of depth-bounded tree searches that agree on the
//! game-theoretic value of a position:
//! - Minimax: exhaustive fail-hard baseline, the correctness oracle
//! - Alpha-beta with memory: fail-soft, cache-narrowed windows
//! - MTDf: null-window convergence driven by iterative deepening
//! - NegaScout (PVS) with optional quiescence extension
//! - ABDADA: a worker pool searching the full tree concurrently
//! - Jamboree: speculative parallel PVS with race-to-cutoff cancellation
//!
//! All algorithms share one engine instance: its evaluator, its sharded
//! transposition caches, and its metrics counters.

mod abdada;
mod alphabeta;
mod jamboree;
mod minimax;
mod negascout;
mod openings;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::board::{
    Color, Evaluator, LastMove, Move, PackedBoard,
};
use crate::cache::{AbEntry, AbdadaEntry, JamboreeEntry, ShardedCache};
use crate::sync::StopFlag;
use crate::timer::DeadlineTimer;

/// The search algorithm families the engine can run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    Minimax,
    AlphaBetaWithMemory,
    Mtdf,
    NegaScout,
    Abdada,
    Jamboree,
}

/// Immutable engine configuration, injected at construction.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Parallel width: the ABDADA worker-pool size and the bound on live
    /// speculative Jamboree tasks.
    pub workers: usize,
    /// Extend leaves with a capture-only quiescence search. Disable to make
    /// every algorithm return the plain fixed-depth value.
    pub quiescence: bool,
    /// Maximum quiescence extension depth.
    pub quiescence_depth: u32,
    /// ABDADA: return as soon as the first worker completes and signal the
    /// rest to stop.
    pub abort_after_first: bool,
    /// Answer the starting position from the fixed first-move table instead
    /// of searching.
    pub use_opening_table: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            workers: std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get),
            quiescence: true,
            quiescence_depth: 4,
            abort_after_first: false,
            use_opening_table: true,
        }
    }
}

/// Depth and time budget for one search.
#[derive(Clone, Copy, Debug)]
pub struct SearchBudget {
    pub max_depth: u32,
    pub max_time: Option<Duration>,
}

impl SearchBudget {
    /// A depth-only budget.
    #[must_use]
    pub fn depth(max_depth: u32) -> Self {
        SearchBudget {
            max_depth,
            max_time: None,
        }
    }

    /// A depth budget with a wall-clock cap.
    #[must_use]
    pub fn timed(max_depth: u32, max_time: Duration) -> Self {
        SearchBudget {
            max_depth,
            max_time: Some(max_time),
        }
    }
}

/// A move with its score and the principal line it heads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoredMove {
    pub mv: Move,
    pub score: i32,
    pub sequence: Vec<Move>,
}

/// Search counters, shared across worker threads.
#[derive(Default)]
pub struct Metrics {
    moves_considered: AtomicU64,
    pruned_alpha_beta: AtomicU64,
    pruned_transposition: AtomicU64,
    cache_hits: AtomicU64,
    evaluations: AtomicU64,
}

impl Metrics {
    #[inline]
    pub(crate) fn count_move(&self) {
        self.moves_considered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn count_ab_prune(&self) {
        self.pruned_alpha_beta.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn count_tt_prune(&self) {
        self.pruned_transposition.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn count_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn count_eval(&self) {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn reset(&self) {
        self.moves_considered.store(0, Ordering::Relaxed);
        self.pruned_alpha_beta.store(0, Ordering::Relaxed);
        self.pruned_transposition.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
        self.evaluations.store(0, Ordering::Relaxed);
    }

    #[must_use]
    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            moves_considered: self.moves_considered.load(Ordering::Relaxed),
            pruned_alpha_beta: self.pruned_alpha_beta.load(Ordering::Relaxed),
            pruned_transposition: self.pruned_transposition.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            evaluations: self.evaluations.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of the search counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub moves_considered: u64,
    pub pruned_alpha_beta: u64,
    pub pruned_transposition: u64,
    pub cache_hits: u64,
    pub evaluations: u64,
}

/// Hook receiving (board, chosen move, player) snapshots for an injected
/// performance-logging sink.
pub type SnapshotHook = Arc<dyn Fn(&PackedBoard, &ScoredMove, Color) + Send + Sync>;

/// The result of a completed (or aborted) search.
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    /// The best scored move found.
    pub best: ScoredMove,
    /// The deepest fully completed depth. Zero for opening-table answers.
    pub depth_achieved: u32,
    /// Counter snapshot for this search.
    pub metrics: MetricsSnapshot,
}

/// The search engine: evaluator, transposition caches, and metrics shared
/// by every algorithm and every worker thread.
pub struct SearchEngine {
    config: EngineConfig,
    evaluator: Evaluator,
    ab_cache: ShardedCache<AbEntry>,
    abdada_cache: ShardedCache<Arc<Mutex<AbdadaEntry>>>,
    jamboree_cache: ShardedCache<Arc<Mutex<JamboreeEntry>>>,
    metrics: Metrics,
    hook: Option<SnapshotHook>,
}

impl SearchEngine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        SearchEngine {
            config,
            evaluator: Evaluator::new(),
            ab_cache: ShardedCache::new(),
            abdada_cache: ShardedCache::new(),
            jamboree_cache: ShardedCache::new(),
            metrics: Metrics::default(),
            hook: None,
        }
    }

    /// Attach a snapshot hook called with (board, scored move, player) after
    /// every completed search.
    #[must_use]
    pub fn with_hook(mut self, hook: SnapshotHook) -> Self {
        self.hook = Some(hook);
        self
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Snapshot of the counters accumulated since the last search started.
    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Drop every transposition entry and cached evaluation. Call between
    /// games; nothing is evicted implicitly during play.
    pub fn clear_caches(&self) {
        self.ab_cache.clear();
        self.abdada_cache.clear();
        self.jamboree_cache.clear();
        self.evaluator.clear_cache();
    }

    /// Find the best move for `mover` under the given budget.
    ///
    /// Returns `None` when `mover` has no legal moves. An exhausted budget
    /// is not an error: the result of the last fully completed depth is
    /// returned, and `depth_achieved` reports how deep the search got.
    pub fn find_move(
        &self,
        board: &PackedBoard,
        mover: Color,
        previous: Option<&LastMove>,
        budget: SearchBudget,
        algorithm: Algorithm,
        stop: &StopFlag,
    ) -> Option<SearchOutcome> {
        self.metrics.reset();

        if self.config.use_opening_table {
            if let Some(mv) = openings::fixed_first_move(board, mover) {
                let best = ScoredMove {
                    mv,
                    score: 0,
                    sequence: vec![mv],
                };
                self.notify(board, &best, mover);
                return Some(SearchOutcome {
                    best,
                    depth_achieved: 0,
                    metrics: self.metrics.snapshot(),
                });
            }
        }

        let timer = budget
            .max_time
            .and_then(|limit| DeadlineTimer::start(limit, stop.clone()));

        let result = match algorithm {
            Algorithm::Minimax => self
                .minimax_root(board, mover, previous, budget.max_depth, stop)
                .map(|best| (best, budget.max_depth)),
            Algorithm::AlphaBetaWithMemory => self
                .alphabeta_best(board, mover, previous, budget.max_depth, stop)
                .map(|best| (best, budget.max_depth)),
            Algorithm::NegaScout => self
                .negascout_root(board, mover, previous, budget.max_depth, stop)
                .map(|best| (best, budget.max_depth)),
            Algorithm::Mtdf | Algorithm::Abdada | Algorithm::Jamboree => {
                self.deepen(board, mover, previous, budget, algorithm, stop)
            }
        };

        if let Some(timer) = timer {
            timer.cancel();
        }

        result.map(|(best, depth_achieved)| {
            self.notify(board, &best, mover);
            SearchOutcome {
                best,
                depth_achieved,
                metrics: self.metrics.snapshot(),
            }
        })
    }

    /// Iterative deepening driver shared by the MTDf, ABDADA, and Jamboree
    /// callers. Deepens until the budget is exhausted; the stop flag is
    /// polled between depths and inside every recursion, and an aborted
    /// depth is discarded in favor of the last completed one.
    fn deepen(
        &self,
        board: &PackedBoard,
        mover: Color,
        previous: Option<&LastMove>,
        budget: SearchBudget,
        algorithm: Algorithm,
        stop: &StopFlag,
    ) -> Option<(ScoredMove, u32)> {
        let mut completed: Option<(ScoredMove, u32)> = None;
        let mut guess = 0;

        for depth in 1..=budget.max_depth {
            if stop.is_stopped() {
                break;
            }

            let result = match algorithm {
                Algorithm::Mtdf => self.mtdf_root(board, mover, previous, depth, guess, stop),
                Algorithm::Abdada => self.abdada_depth(board, mover, previous, depth, stop),
                Algorithm::Jamboree => self.jamboree_root(board, mover, previous, depth, stop),
                _ => unreachable!("deepen drives only MTDf/ABDADA/Jamboree"),
            };

            if stop.is_stopped() {
                // This depth was cut short; its result is unreliable.
                break;
            }

            match result {
                Some(best) => {
                    log::debug!(
                        "{algorithm:?} depth {depth}: {} score {} ({} moves considered)",
                        best.mv,
                        best.score,
                        self.metrics.snapshot().moves_considered
                    );
                    guess = best.score;
                    completed = Some((best, depth));
                }
                None => break,
            }
        }

        completed
    }

    fn notify(&self, board: &PackedBoard, best: &ScoredMove, mover: Color) {
        if let Some(hook) = &self.hook {
            hook(board, best, mover);
        }
    }

    /// Leaf scoring shared by the window-based algorithms: quiescence when
    /// enabled, plain static evaluation otherwise.
    fn leaf_score(
        &self,
        board: &PackedBoard,
        to_move: Color,
        previous: Option<&LastMove>,
        alpha: i32,
        beta: i32,
        stop: &StopFlag,
    ) -> i32 {
        if self.config.quiescence {
            self.quiesce(
                board,
                to_move,
                previous,
                alpha,
                beta,
                self.config.quiescence_depth,
                stop,
            )
        } else {
            self.metrics.count_eval();
            self.evaluator.evaluate(board, to_move, previous)
        }
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        SearchEngine::new(EngineConfig::default())
    }
}

/// Clone the move list with `preferred` (if present and legal) moved to the
/// front, preserving the relative order of the rest.
fn order_first(moves: &[Move], preferred: Option<Move>) -> Vec<Move> {
    let mut ordered = moves.to_vec();
    if let Some(p) = preferred {
        if let Some(pos) = ordered.iter().position(|m| *m == p) {
            let mv = ordered.remove(pos);
            ordered.insert(0, mv);
        }
    }
    ordered
}
