//! Storage collaborator interface.
//!
//! The ranking engine never owns item data. It reads neighbours and writes
//! ranks through a [`RankStore`], which is scoped to exactly one ordering
//! domain (for example all cards of one project). [`MemoryRankStore`] is the
//! in-process implementation; the SQLite one lives in [`crate::db::store`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Bound;

use crate::error::RankError;
use crate::rank::Rank;
use crate::space::PrecisionPolicy;

/// Read/write access to the ranks of one collection.
///
/// Implementations must be consistent within one call sequence: a rank
/// written by [`RankStore::set_rank`] is visible to the next read.
pub trait RankStore {
    /// Identity of an item inside the collection.
    type Key: Clone + Ord + fmt::Debug + fmt::Display;

    /// Number of ranked items.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    fn count(&self) -> Result<u64, RankError>;

    /// Current rank of `key`, or `None` when it has not been ranked yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    fn rank_of(&self, key: &Self::Key) -> Result<Option<Rank>, RankError>;

    /// Smallest rank strictly greater than `rank`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    fn next_greater(&self, rank: &Rank) -> Result<Option<Rank>, RankError>;

    /// Largest rank strictly less than `rank`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    fn next_lesser(&self, rank: &Rank) -> Result<Option<Rank>, RankError>;

    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    fn min_rank(&self) -> Result<Option<Rank>, RankError>;

    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    fn max_rank(&self) -> Result<Option<Rank>, RankError>;

    /// All keys ordered by rank, ties broken by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    fn keys_in_rank_order(&self) -> Result<Vec<Self::Key>, RankError>;

    /// Insert or update the rank of a single item.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    fn set_rank(&mut self, key: &Self::Key, rank: &Rank) -> Result<(), RankError>;

    /// Rewrite many ranks at once. Used only by redistribution.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    fn set_ranks(&mut self, assignments: &[(Self::Key, Rank)]) -> Result<(), RankError>;

    /// Precision the backing column can retain.
    fn precision_policy(&self) -> PrecisionPolicy {
        PrecisionPolicy::Unlimited
    }
}

/// In-memory [`RankStore`] keeping a rank index alongside the key map.
#[derive(Debug, Clone)]
pub struct MemoryRankStore<K> {
    ranks: BTreeMap<K, Rank>,
    index: BTreeMap<Rank, BTreeSet<K>>,
    precision: PrecisionPolicy,
}

impl<K: Clone + Ord> MemoryRankStore<K> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ranks: BTreeMap::new(),
            index: BTreeMap::new(),
            precision: PrecisionPolicy::Unlimited,
        }
    }

    /// Simulate a backend with a finite numeric column.
    #[must_use]
    pub fn with_precision(mut self, precision: PrecisionPolicy) -> Self {
        self.precision = precision;
        self
    }

    /// Seed items with explicit ranks, bypassing the engine.
    #[must_use]
    pub fn seeded(items: impl IntoIterator<Item = (K, Rank)>) -> Self {
        let mut store = Self::new();
        for (key, rank) in items {
            store.put(key, rank);
        }
        store
    }

    /// `(key, rank)` pairs in rank order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Rank)> {
        self.index
            .iter()
            .flat_map(|(rank, keys)| keys.iter().map(move |key| (key, rank)))
    }

    fn put(&mut self, key: K, rank: Rank) {
        if let Some(previous) = self.ranks.insert(key.clone(), rank.clone()) {
            self.unindex(&previous, &key);
        }
        self.index.entry(rank).or_default().insert(key);
    }

    fn unindex(&mut self, rank: &Rank, key: &K) {
        if let Some(keys) = self.index.get_mut(rank) {
            keys.remove(key);
            if keys.is_empty() {
                self.index.remove(rank);
            }
        }
    }
}

impl<K: Clone + Ord> Default for MemoryRankStore<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> RankStore for MemoryRankStore<K>
where
    K: Clone + Ord + fmt::Debug + fmt::Display,
{
    type Key = K;

    fn count(&self) -> Result<u64, RankError> {
        Ok(self.ranks.len() as u64)
    }

    fn rank_of(&self, key: &K) -> Result<Option<Rank>, RankError> {
        Ok(self.ranks.get(key).cloned())
    }

    fn next_greater(&self, rank: &Rank) -> Result<Option<Rank>, RankError> {
        Ok(self
            .index
            .range((Bound::Excluded(rank), Bound::Unbounded))
            .next()
            .map(|(r, _)| r.clone()))
    }

    fn next_lesser(&self, rank: &Rank) -> Result<Option<Rank>, RankError> {
        Ok(self
            .index
            .range((Bound::Unbounded, Bound::Excluded(rank)))
            .next_back()
            .map(|(r, _)| r.clone()))
    }

    fn min_rank(&self) -> Result<Option<Rank>, RankError> {
        Ok(self.index.keys().next().cloned())
    }

    fn max_rank(&self) -> Result<Option<Rank>, RankError> {
        Ok(self.index.keys().next_back().cloned())
    }

    fn keys_in_rank_order(&self) -> Result<Vec<K>, RankError> {
        Ok(self.iter().map(|(key, _)| key.clone()).collect())
    }

    fn set_rank(&mut self, key: &K, rank: &Rank) -> Result<(), RankError> {
        self.put(key.clone(), rank.clone());
        Ok(())
    }

    fn set_ranks(&mut self, assignments: &[(K, Rank)]) -> Result<(), RankError> {
        for (key, rank) in assignments {
            self.put(key.clone(), rank.clone());
        }
        Ok(())
    }

    fn precision_policy(&self) -> PrecisionPolicy {
        self.precision
    }
}
