//! The reposition protocol for a single item.
//!
//! Rank arithmetic is the only convention here: `insert_before(target)`
//! gives the item a rank *smaller* than the target's, `insert_after(target)`
//! a *larger* one. Boards render ascending rank top to bottom, so "move above
//! X" maps to `insert_before(X)` and "move below X" to `insert_after(X)`.
//!
//! Each call performs one targeted write, preceded by a full redistribution
//! when the interval it needs has collapsed.

use tracing::debug;

use crate::collection::{Direction, RankChange, RankedCollection};
use crate::error::RankError;
use crate::rank::Rank;
use crate::store::RankStore;

/// `place_last` redistributes at most once; a second collision means the
/// redistribution invariant is broken.
const MAX_PLACE_LAST_ATTEMPTS: usize = 2;

/// Reposition handle for one item of a [`RankedCollection`].
pub struct RankedItem<'c, 'l, S: RankStore> {
    collection: &'c mut RankedCollection<'l, S>,
    key: S::Key,
}

impl<'c, 'l, S: RankStore> RankedItem<'c, 'l, S> {
    pub(crate) fn new(collection: &'c mut RankedCollection<'l, S>, key: S::Key) -> Self {
        Self { collection, key }
    }

    #[must_use]
    pub const fn key(&self) -> &S::Key {
        &self.key
    }

    /// Current rank, or `None` if the item has never been ranked.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn rank(&self) -> Result<Option<Rank>, RankError> {
        self.collection.store().rank_of(&self.key)
    }

    /// Give the item a rank above every other item.
    ///
    /// An empty collection starts at the middle of the space. Otherwise the
    /// item lands halfway between the current maximum and `MAX`,
    /// redistributing first if that gap is exhausted.
    ///
    /// # Errors
    ///
    /// Returns a storage error, or [`RankError::HeadroomExhausted`] if the
    /// gap is still exhausted after redistributing.
    pub fn place_last(&mut self) -> Result<RankChange<S::Key>, RankError> {
        let old = self.rank()?;
        let mut last = self.collection.last_rank()?;
        if old.is_some() && old == last {
            return self.skip(old);
        }

        let mut redistributed = false;
        for attempt in 1..=MAX_PLACE_LAST_ATTEMPTS {
            let space = self.collection.space();
            let exhausted = last
                .as_ref()
                .is_some_and(|last_rank| space.collides_with_bounds(last_rank, space.max()));

            if !exhausted {
                let new_rank = match &last {
                    None => space.midpoint(space.min(), space.max()),
                    Some(last_rank) => space.midpoint(last_rank, space.max()),
                };
                return self.commit(old, new_rank, redistributed);
            }
            if attempt == MAX_PLACE_LAST_ATTEMPTS {
                break;
            }

            self.collection.redistribute_all()?;
            redistributed = true;
            last = self.collection.last_rank()?;
        }

        Err(RankError::HeadroomExhausted {
            last: last.map_or_else(|| "none".to_string(), |rank| rank.to_plain_string()),
        })
    }

    /// Give the item a rank just below `target`'s.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::NotInCollection`] if `target` has no rank.
    pub fn insert_before(&mut self, target: &S::Key) -> Result<RankChange<S::Key>, RankError> {
        self.insert_next_to(target, Direction::Following)
    }

    /// Give the item a rank just above `target`'s.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::NotInCollection`] if `target` has no rank.
    pub fn insert_after(&mut self, target: &S::Key) -> Result<RankChange<S::Key>, RankError> {
        self.insert_next_to(target, Direction::Leading)
    }

    fn insert_next_to(
        &mut self,
        target: &S::Key,
        direction: Direction,
    ) -> Result<RankChange<S::Key>, RankError> {
        let target_rank = self.collection.rank_of(target)?;
        let old = self.rank()?;

        if *target == self.key || self.already_adjacent(old.as_ref(), &target_rank, direction)? {
            return self.skip(old);
        }

        let mut redistributed = false;
        if self.collection.should_redistribute(target, direction)? {
            self.collection.redistribute_all()?;
            redistributed = true;
        }

        // Neighbours are re-read, so a redistribution above is reflected here.
        let new_rank = match direction {
            Direction::Following => self.collection.calculate_preceding_rank(target)?,
            Direction::Leading => self.collection.calculate_succeeding_rank(target)?,
        };
        self.commit(old, new_rank, redistributed)
    }

    /// The item already sits immediately on the requested side of the target.
    fn already_adjacent(
        &self,
        old: Option<&Rank>,
        target_rank: &Rank,
        direction: Direction,
    ) -> Result<bool, RankError> {
        let Some(old) = old else {
            return Ok(false);
        };
        let store = self.collection.store();
        Ok(match direction {
            Direction::Following => {
                old < target_rank && store.next_greater(old)?.as_ref() == Some(target_rank)
            }
            Direction::Leading => {
                old > target_rank && store.next_lesser(old)?.as_ref() == Some(target_rank)
            }
        })
    }

    fn commit(
        &mut self,
        old: Option<Rank>,
        new_rank: Rank,
        redistributed: bool,
    ) -> Result<RankChange<S::Key>, RankError> {
        if !redistributed && old.as_ref() == Some(&new_rank) {
            return self.skip(old);
        }

        debug_assert!(self.collection.space().contains(&new_rank));
        self.collection
            .store_mut()
            .set_rank(&self.key, &new_rank)?;
        debug!(key = %self.key, %new_rank, redistributed, "rank assigned");

        let change = RankChange {
            key: self.key.clone(),
            old_rank: old,
            new_rank,
            redistributed,
            no_op: false,
        };
        self.collection.publish(&change)?;
        Ok(change)
    }

    fn skip(&self, old: Option<Rank>) -> Result<RankChange<S::Key>, RankError> {
        let current = match old {
            Some(rank) => rank,
            None => return Err(RankError::not_in_collection(&self.key)),
        };
        debug!(key = %self.key, rank = %current, "reposition is a no-op");

        let change = RankChange {
            key: self.key.clone(),
            old_rank: Some(current.clone()),
            new_rank: current,
            redistributed: false,
            no_op: true,
        };
        self.collection.publish(&change)?;
        Ok(change)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::collection::{RankChange, RankedCollection};
    use crate::error::RankError;
    use crate::rank::Rank;
    use crate::space::RankSpace;
    use crate::store::{MemoryRankStore, RankStore};

    fn r(v: i64) -> Rank {
        Rank::from(v)
    }

    fn collection(
        items: impl IntoIterator<Item = (u32, Rank)>,
    ) -> RankedCollection<'static, MemoryRankStore<u32>> {
        RankedCollection::new(RankSpace::default(), MemoryRankStore::seeded(items)).unwrap()
    }

    fn order(coll: &RankedCollection<'_, MemoryRankStore<u32>>) -> Vec<u32> {
        coll.store().keys_in_rank_order().unwrap()
    }

    #[test]
    fn first_item_lands_mid_space() {
        let mut coll = collection([]);
        let change = coll.item(1).place_last().unwrap();
        assert_eq!(change.new_rank, r(0));
        assert_eq!(change.old_rank, None);
        assert!(change.changed());
    }

    #[test]
    fn place_last_goes_halfway_to_max() {
        let mut coll = collection([(1, r(0))]);
        let change = coll.item(2).place_last().unwrap();
        assert_eq!(change.new_rank, coll.space().max().half());
        assert_eq!(order(&coll), vec![1, 2]);
    }

    #[test]
    fn place_last_on_current_last_is_a_no_op() {
        let mut coll = collection([(1, r(0)), (2, r(5))]);
        let change = coll.item(2).place_last().unwrap();
        assert!(change.no_op);
        assert_eq!(change.new_rank, r(5));
    }

    #[test]
    fn place_last_redistributes_when_top_is_exhausted() {
        let space = RankSpace::default();
        let crowded = space.max().minus(&"0.0000001".parse::<Rank>().unwrap());
        let mut coll = collection([(1, r(0)), (2, crowded)]);

        let change = coll.item(3).place_last().unwrap();
        assert!(change.redistributed);
        assert_eq!(coll.redistributions(), 1);
        assert_eq!(order(&coll), vec![1, 2, 3]);
        assert!(coll.space().contains(&change.new_rank));
    }

    #[test]
    fn insert_before_between_neighbours() {
        let mut coll = collection([(1, r(10)), (2, r(20))]);
        let change = coll.item(3).insert_before(&2).unwrap();
        assert_eq!(change.new_rank, r(15));
        assert_eq!(order(&coll), vec![1, 3, 2]);
    }

    #[test]
    fn insert_after_between_neighbours() {
        let mut coll = collection([(1, r(10)), (2, r(20))]);
        let change = coll.item(3).insert_after(&1).unwrap();
        assert_eq!(change.new_rank, r(15));
        assert_eq!(order(&coll), vec![1, 3, 2]);
    }

    #[test]
    fn insert_before_first_item_heads_toward_min() {
        let mut coll = collection([(1, r(10))]);
        coll.item(2).insert_before(&1).unwrap();
        assert_eq!(order(&coll), vec![2, 1]);
    }

    #[test]
    fn moving_an_existing_item_reorders() {
        let mut coll = collection([(1, r(10)), (2, r(20)), (3, r(30))]);
        coll.item(3).insert_before(&1).unwrap();
        assert_eq!(order(&coll), vec![3, 1, 2]);
        coll.item(3).insert_after(&2).unwrap();
        assert_eq!(order(&coll), vec![1, 2, 3]);
    }

    #[test]
    fn unknown_target_is_not_in_collection() {
        let mut coll = collection([(1, r(10))]);
        let err = coll.item(2).insert_before(&9).expect_err("9 is unranked");
        assert!(matches!(err, RankError::NotInCollection { .. }));
        assert_eq!(coll.count().unwrap(), 1);
    }

    #[test]
    fn self_target_and_adjacent_moves_are_no_ops() {
        let mut coll = collection([(1, r(10)), (2, r(20)), (3, r(30))]);
        assert!(coll.item(2).insert_before(&2).unwrap().no_op);
        assert!(coll.item(1).insert_before(&2).unwrap().no_op);
        assert!(coll.item(3).insert_after(&2).unwrap().no_op);
        assert!(!coll.item(3).insert_before(&2).unwrap().no_op);
        assert_eq!(order(&coll), vec![1, 3, 2]);
    }

    #[test]
    fn unranked_self_target_is_not_in_collection() {
        let mut coll = collection([(1, r(10))]);
        assert!(coll.item(5).insert_before(&5).is_err());
    }

    #[test]
    fn listeners_see_changes_but_not_no_ops_by_default() {
        let seen: Rc<RefCell<Vec<RankChange<u32>>>> = Rc::default();
        let sink = Rc::clone(&seen);
        let mut coll = collection([(1, r(10)), (2, r(20))]);
        coll.add_listener(move |change: &RankChange<u32>| -> Result<(), RankError> {
            sink.borrow_mut().push(change.clone());
            Ok(())
        });

        coll.item(1).insert_before(&2).unwrap();
        coll.item(3).insert_after(&2).unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].key, 3);
        assert_eq!(seen[0].old_rank, None);
    }

    #[test]
    fn emit_on_no_op_reports_every_call() {
        let seen: Rc<RefCell<Vec<bool>>> = Rc::default();
        let sink = Rc::clone(&seen);
        let mut coll = collection([(1, r(10)), (2, r(20))]).with_emit_on_no_op(true);
        coll.add_listener(move |change: &RankChange<u32>| -> Result<(), RankError> {
            sink.borrow_mut().push(change.no_op);
            Ok(())
        });

        coll.item(1).insert_before(&2).unwrap();
        coll.item(2).insert_before(&1).unwrap();
        assert_eq!(*seen.borrow(), vec![true, false]);
    }

    #[test]
    fn failing_listener_fails_the_reposition() {
        let mut coll = collection([(1, r(10))]);
        coll.add_listener(|change: &RankChange<u32>| -> Result<(), RankError> {
            Err(RankError::not_in_collection(change.key))
        });
        assert!(coll.item(2).place_last().is_err());
    }
}
