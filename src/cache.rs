//! Sharded concurrent position cache.
//!
//! One cache instance is shared per game/search session: board clones hand
//! the same cache around, which is what makes entries useful across
//! transpositions and across parallel search threads.
//!
//! The cache is split into [`SHARD_COUNT`] independently locked shards so
//! unrelated positions never contend. Within a shard, entries live in a
//! nested map keyed by the four leading 64-bit words of the structural board
//! hash, then by (trailing flags byte, color). All entry payloads share this
//! one infrastructure; only the payload type differs per use.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::board::{BoardHash, Color, Move, INFINITY};

/// Number of independently locked shards.
pub const SHARD_COUNT: usize = 8;

type ShardMap<V> = HashMap<[u64; 4], HashMap<(u8, Color), V>>;

/// A concurrent map from (structural board hash, color) to an arbitrary
/// payload.
///
/// Absence is an `Option`, never an error; concurrent operations never fail.
pub struct ShardedCache<V> {
    shards: [Mutex<ShardMap<V>>; SHARD_COUNT],
}

impl<V: Clone> ShardedCache<V> {
    #[must_use]
    pub fn new() -> Self {
        ShardedCache {
            shards: std::array::from_fn(|_| Mutex::new(HashMap::new())),
        }
    }

    /// Shard selection folds every hash byte mod the shard count. The
    /// structural hash is bijective but not uniformly mixed; the byte fold
    /// is kept deliberately cheap.
    #[inline]
    fn shard_index(hash: &BoardHash) -> usize {
        hash.as_bytes()
            .iter()
            .fold(0usize, |acc, b| acc.wrapping_add(*b as usize))
            % SHARD_COUNT
    }

    /// Look up the entry for (hash, color). `None` is an ordinary miss.
    #[must_use]
    pub fn get(&self, hash: &BoardHash, color: Color) -> Option<V> {
        let shard = self.shards[Self::shard_index(hash)].lock();
        shard
            .get(&hash.words())
            .and_then(|inner| inner.get(&(hash.tail(), color)))
            .cloned()
    }

    /// Insert or overwrite the entry for (hash, color).
    pub fn insert(&self, hash: &BoardHash, color: Color, value: V) {
        let mut shard = self.shards[Self::shard_index(hash)].lock();
        shard
            .entry(hash.words())
            .or_default()
            .insert((hash.tail(), color), value);
    }

    /// Fetch the entry for (hash, color), inserting one built by `make` if
    /// absent. Used for payloads that carry their own entry lock.
    pub fn get_or_insert_with(
        &self,
        hash: &BoardHash,
        color: Color,
        make: impl FnOnce() -> V,
    ) -> V {
        let mut shard = self.shards[Self::shard_index(hash)].lock();
        shard
            .entry(hash.words())
            .or_default()
            .entry((hash.tail(), color))
            .or_insert_with(make)
            .clone()
    }

    /// Atomically read-modify-write the entry for (hash, color).
    ///
    /// The closure receives the current entry (or `None` on a miss) and
    /// returns the value to store; returning `None` leaves the cache
    /// unchanged.
    pub fn update(
        &self,
        hash: &BoardHash,
        color: Color,
        f: impl FnOnce(Option<&V>) -> Option<V>,
    ) {
        let mut shard = self.shards[Self::shard_index(hash)].lock();
        let inner = shard.entry(hash.words()).or_default();
        let key = (hash.tail(), color);
        if let Some(value) = f(inner.get(&key)) {
            inner.insert(key, value);
        }
    }

    /// Drop every entry in every shard.
    pub fn clear(&self) {
        for shard in &self.shards {
            shard.lock().clear();
        }
    }

    /// Total number of entries across all shards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.lock().values().map(HashMap::len).sum::<usize>())
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> Default for ShardedCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Alpha-beta-with-memory entry: a fail-soft bound pair plus the best move
/// found, valid at exactly the stored depth.
#[derive(Clone, Copy, Debug)]
pub struct AbEntry {
    pub depth: u32,
    pub lower: i32,
    pub upper: i32,
    pub best_move: Option<Move>,
}

impl AbEntry {
    /// An entry with open bounds at the given depth.
    #[must_use]
    pub fn open(depth: u32) -> Self {
        AbEntry {
            depth,
            lower: -INFINITY,
            upper: INFINITY,
            best_move: None,
        }
    }
}

/// Score classification for ABDADA entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbdadaBound {
    /// Entry exists only to count active searchers; no score stored yet.
    Unset,
    /// Stored score is an upper bound (search failed low).
    Upper,
    /// Stored score is a lower bound (search failed high).
    Lower,
    /// Stored score is the exact value.
    Exact,
}

/// ABDADA entry. Stored behind a per-entry mutex; `active_searchers` is the
/// young-brothers-wait signal that lets a probing thread defer work another
/// thread is already doing at the same depth.
#[derive(Clone, Copy, Debug)]
pub struct AbdadaEntry {
    pub depth: u32,
    pub bound: AbdadaBound,
    pub score: i32,
    pub active_searchers: u32,
}

impl AbdadaEntry {
    /// An entry with no score and no registered searchers yet.
    #[must_use]
    pub fn fresh(depth: u32) -> Self {
        AbdadaEntry {
            depth,
            bound: AbdadaBound::Unset,
            score: 0,
            active_searchers: 0,
        }
    }
}

/// Jamboree entry: a simple overwritable exact score, consulted only when
/// the cached depth matches the requested depth exactly.
#[derive(Clone, Copy, Debug)]
pub struct JamboreeEntry {
    pub depth: u32,
    pub score: i32,
    pub best_move: Option<Move>,
}
