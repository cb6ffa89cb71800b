//! cardrank-core library.
//!
//! Fractional ranking for ordered card lists: each card carries a decimal
//! [`Rank`], and moving a card writes a single new rank halfway between its
//! new neighbours. When an interval becomes too narrow, the whole
//! collection is re-spread.
//!
//! ```
//! use cardrank_core::{MemoryRankStore, RankSpace, RankedCollection};
//!
//! let mut board = RankedCollection::new(RankSpace::default(), MemoryRankStore::<u32>::new())?;
//! board.item(1).place_last()?;
//! board.item(2).place_last()?;
//! board.item(3).insert_before(&2)?;
//! assert_eq!(board.store().keys_in_rank_order()?, vec![1, 3, 2]);
//! # use cardrank_core::RankStore;
//! # Ok::<(), cardrank_core::RankError>(())
//! ```

pub mod collection;
pub mod config;
pub mod db;
pub mod error;
pub mod item;
pub mod rank;
pub mod space;
pub mod store;

// Conventions
//
// - Errors: ranking operations return `Result<_, RankError>`; the `db` and
//   `config` layers use `anyhow::Result` with context.
// - Logging: `tracing` macros (`info!`, `warn!`, `debug!`).

pub use collection::{Direction, RankChange, RankListener, RankedCollection};
pub use error::{ErrorCode, RankError};
pub use item::RankedItem;
pub use rank::Rank;
pub use space::{PrecisionPolicy, RankSpace};
pub use store::{MemoryRankStore, RankStore};
