//! Ranked collections: neighbour queries and redistribution.
//!
//! A [`RankedCollection`] binds a [`RankSpace`] to the [`RankStore`] of one
//! ordering domain. It answers "what interval surrounds this item" and is the
//! only place allowed to rewrite more than one rank at a time.
//!
//! # Redistribution
//!
//! When an interval collapses below the space threshold, every item is
//! re-ranked in current order to integer values evenly spaced across
//! `[MIN, MAX / 2)`:
//!
//! ```text
//! range    = MAX / 2 - MIN
//! interval = trunc(range / (count + 1))
//! rank_i   = MIN + interval * (i + 1)
//! ```
//!
//! The upper half of the space stays empty so that appending after a
//! redistribution has plenty of room.
//!
//! The collection does no locking. Callers serialize all ranking operations
//! against one collection (see [`crate::db::with_write_transaction`]).

use bigdecimal::BigDecimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::RankError;
use crate::item::RankedItem;
use crate::rank::Rank;
use crate::space::RankSpace;
use crate::store::RankStore;

/// Which side of an item an interval extends to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// From the item's rank up to the next strictly greater rank (or `MAX`).
    Leading,
    /// From the next strictly lesser rank (or `MIN`) up to the item's rank.
    Following,
}

/// Outcome of one reposition call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankChange<K> {
    pub key: K,
    /// Rank before the call; `None` for an item ranked for the first time.
    pub old_rank: Option<Rank>,
    pub new_rank: Rank,
    /// A full redistribution ran before the targeted write.
    pub redistributed: bool,
    /// Nothing was written because the item was already in place.
    pub no_op: bool,
}

impl<K> RankChange<K> {
    /// Returns `true` when the persisted rank differs from the old one.
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.no_op && self.old_rank.as_ref() != Some(&self.new_rank)
    }
}

/// Hook invoked after a reposition publishes a rank change.
///
/// A failing listener fails the reposition, so an audit write and the rank
/// write can share one transaction.
pub trait RankListener<K> {
    /// # Errors
    ///
    /// Returns an error if the listener cannot record the change.
    fn on_rank_changed(&self, change: &RankChange<K>) -> Result<(), RankError>;
}

impl<K, F> RankListener<K> for F
where
    F: Fn(&RankChange<K>) -> Result<(), RankError>,
{
    fn on_rank_changed(&self, change: &RankChange<K>) -> Result<(), RankError> {
        self(change)
    }
}

/// The items of one ordering domain, viewed through a [`RankStore`].
pub struct RankedCollection<'l, S: RankStore> {
    space: RankSpace,
    store: S,
    listeners: Vec<Box<dyn RankListener<S::Key> + 'l>>,
    emit_on_no_op: bool,
    redistributions: u64,
}

impl<'l, S: RankStore> RankedCollection<'l, S> {
    /// Bind `store` to `space`. The store's precision policy replaces the
    /// space's, since only the storage knows what it can retain.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::InsufficientPrecision`] when the store keeps too
    /// few significant digits to order ranks anywhere in `space`.
    pub fn new(space: RankSpace, store: S) -> Result<Self, RankError> {
        let precision = store.precision_policy();
        Ok(Self {
            space: space.with_precision(precision)?,
            store,
            listeners: Vec::new(),
            emit_on_no_op: false,
            redistributions: 0,
        })
    }

    /// Also notify listeners about repositions that changed nothing.
    #[must_use]
    pub fn with_emit_on_no_op(mut self, emit: bool) -> Self {
        self.emit_on_no_op = emit;
        self
    }

    /// Register a listener for published rank changes.
    pub fn add_listener(&mut self, listener: impl RankListener<S::Key> + 'l) {
        self.listeners.push(Box::new(listener));
    }

    #[must_use]
    pub const fn space(&self) -> &RankSpace {
        &self.space
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Consume the collection, handing the store back to the caller.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Number of redistributions performed through this handle.
    #[must_use]
    pub const fn redistributions(&self) -> u64 {
        self.redistributions
    }

    #[must_use]
    pub const fn emit_on_no_op(&self) -> bool {
        self.emit_on_no_op
    }

    /// Reposition handle for `key`, which may or may not be ranked yet.
    pub fn item(&mut self, key: S::Key) -> RankedItem<'_, 'l, S> {
        RankedItem::new(self, key)
    }

    /// Number of ranked items.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn count(&self) -> Result<u64, RankError> {
        self.store.count()
    }

    /// Maximum rank in the collection, or `None` when it is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn last_rank(&self) -> Result<Option<Rank>, RankError> {
        self.store.max_rank()
    }

    /// Current rank of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::NotInCollection`] if `key` has no rank.
    pub fn rank_of(&self, key: &S::Key) -> Result<Rank, RankError> {
        self.store
            .rank_of(key)?
            .ok_or_else(|| RankError::not_in_collection(key))
    }

    /// The interval adjoining `key` in `direction`, extended to the next
    /// actual neighbour or to the space bound when there is none.
    ///
    /// Items sharing a rank are skipped over: neighbours are strictly
    /// greater or strictly lesser, so tied items all report the same
    /// interval.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::NotInCollection`] if `key` has no rank.
    pub fn neighboring_ranks(
        &self,
        key: &S::Key,
        direction: Direction,
    ) -> Result<(Rank, Rank), RankError> {
        let rank = self.rank_of(key)?;
        let (min, max) = match direction {
            Direction::Leading => {
                let max = self
                    .store
                    .next_greater(&rank)?
                    .unwrap_or_else(|| self.space.max().clone());
                (rank, max)
            }
            Direction::Following => {
                let min = self
                    .store
                    .next_lesser(&rank)?
                    .unwrap_or_else(|| self.space.min().clone());
                (min, rank)
            }
        };
        debug!(%key, ?direction, %min, %max, "neighboring ranks");
        Ok((min, max))
    }

    /// Rank halfway between `key` and its lesser neighbour.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::NotInCollection`] if `key` has no rank.
    pub fn calculate_preceding_rank(&self, key: &S::Key) -> Result<Rank, RankError> {
        let (min, max) = self.neighboring_ranks(key, Direction::Following)?;
        Ok(self.space.midpoint(&min, &max))
    }

    /// Rank halfway between `key` and its greater neighbour.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::NotInCollection`] if `key` has no rank.
    pub fn calculate_succeeding_rank(&self, key: &S::Key) -> Result<Rank, RankError> {
        let (min, max) = self.neighboring_ranks(key, Direction::Leading)?;
        Ok(self.space.midpoint(&min, &max))
    }

    /// Returns `true` when the interval next to `key` is too narrow to split.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::NotInCollection`] if `key` has no rank.
    pub fn should_redistribute(
        &self,
        key: &S::Key,
        direction: Direction,
    ) -> Result<bool, RankError> {
        let (min, max) = self.neighboring_ranks(key, direction)?;
        Ok(self.space.collides_with_bounds(&min, &max))
    }

    /// Re-rank every item to evenly spaced integers in `[MIN, MAX / 2)`,
    /// keeping the current order. Returns the number of items rewritten.
    pub(crate) fn redistribute_all(&mut self) -> Result<usize, RankError> {
        let keys = self.store.keys_in_rank_order()?;
        let count = keys.len();

        let range = self.space.max().half().minus(self.space.min());
        let slots = BigDecimal::from(count as u64 + 1);
        let exact = Rank::new(range.into_decimal() / slots);
        let truncated = exact.trunc();
        // Tiny custom spaces cannot fit integer steps.
        let interval = if truncated == Rank::from(0_i64) {
            exact
        } else {
            truncated
        };

        let mut next = self.space.min().clone();
        let assignments: Vec<(S::Key, Rank)> = keys
            .into_iter()
            .map(|key| {
                next = next.plus(&interval);
                (key, self.space.reduce(&next))
            })
            .collect();

        self.store.set_ranks(&assignments)?;
        self.redistributions += 1;
        info!(count, %interval, "redistributed collection ranks");
        Ok(count)
    }

    pub(crate) fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub(crate) fn publish(&self, change: &RankChange<S::Key>) -> Result<(), RankError> {
        if change.no_op && !self.emit_on_no_op {
            return Ok(());
        }
        for listener in &self.listeners {
            listener.on_rank_changed(change)?;
        }
        Ok(())
    }
}
