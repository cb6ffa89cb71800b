//! SQLite-backed [`RankStore`] for one collection.
//!
//! Neighbour lookups are indexed range scans over
//! `(collection_id, sort_key, card_number)`. Writes go through the borrowed
//! connection, so callers decide the transaction boundary; wrap a whole
//! reposition in [`super::with_write_transaction`].

use rusqlite::types::ToSql;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use std::fmt::Write as _;
use serde::Serialize;

use super::sort_key;
use crate::error::RankError;
use crate::rank::Rank;
use crate::space::PrecisionPolicy;
use crate::store::RankStore;

/// Identity of a card inside its collection.
pub type CardNumber = i64;

/// A stored card rank row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedCard {
    pub card_number: CardNumber,
    pub rank: Rank,
    pub updated_at_us: i64,
}

/// [`RankStore`] over the `ranked_cards` table, scoped to one collection.
pub struct SqliteRankStore<'c> {
    conn: &'c Connection,
    collection: String,
    precision: PrecisionPolicy,
}

impl<'c> SqliteRankStore<'c> {
    /// Scope a store to `collection`. Ranks are stored losslessly as text,
    /// so the default precision policy is unlimited.
    pub fn new(conn: &'c Connection, collection: impl Into<String>) -> Self {
        Self {
            conn,
            collection: collection.into(),
            precision: PrecisionPolicy::Unlimited,
        }
    }

    /// Pin the precision reported to the ranking engine.
    #[must_use]
    pub const fn with_precision(mut self, precision: PrecisionPolicy) -> Self {
        self.precision = precision;
        self
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// All cards of the collection in rank order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored rank is malformed.
    pub fn ranked_cards(&self) -> Result<Vec<RankedCard>, RankError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT card_number, rank, updated_at_us FROM ranked_cards \
             WHERE collection_id = ?1 ORDER BY sort_key ASC, card_number ASC",
        )?;
        let rows = stmt.query_map(params![self.collection], |row| {
            Ok((
                row.get::<_, CardNumber>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut cards = Vec::new();
        for row in rows {
            let (card_number, rank, updated_at_us) = row?;
            cards.push(RankedCard {
                card_number,
                rank: rank.parse()?,
                updated_at_us,
            });
        }
        Ok(cards)
    }

    /// Remove a card from the collection. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn remove(&self, card: CardNumber) -> Result<bool, RankError> {
        let deleted = self.conn.execute(
            "DELETE FROM ranked_cards WHERE collection_id = ?1 AND card_number = ?2",
            params![self.collection, card],
        )?;
        Ok(deleted > 0)
    }

    fn query_rank(&self, sql: &str, bound: Option<&str>) -> Result<Option<Rank>, RankError> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let text: Option<String> = match bound {
            Some(key) => stmt
                .query_row(params![self.collection, key], |row| row.get(0))
                .optional()?,
            None => stmt
                .query_row(params![self.collection], |row| row.get(0))
                .optional()?,
        };
        text.map(|t| t.parse()).transpose()
    }

    fn upsert(&self, card: CardNumber, rank: &Rank, now_us: i64) -> Result<(), RankError> {
        let key = sort_key::encode(rank)?;
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO ranked_cards (collection_id, card_number, rank, sort_key, updated_at_us) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(collection_id, card_number) DO UPDATE SET \
             rank = excluded.rank, sort_key = excluded.sort_key, \
             updated_at_us = excluded.updated_at_us",
        )?;
        stmt.execute(params![
            self.collection,
            card,
            rank.to_plain_string(),
            key,
            now_us
        ])?;
        Ok(())
    }
}

/// Rows per redistribution statement; three bound values each, well under
/// SQLite's variable limit.
const BULK_UPDATE_ROWS: usize = 500;

/// One `UPDATE ... FROM` joining `ranked_cards` to `rows` literal rows.
/// `?1` is the collection, `?2` the timestamp, then `(card, rank, sort_key)`
/// triples.
fn bulk_update_sql(rows: usize) -> String {
    let mut values = String::new();
    for row in 0..rows {
        let first = 3 + row * 3;
        if row > 0 {
            values.push_str(", ");
        }
        let _ = write!(values, "(?{first}, ?{}, ?{})", first + 1, first + 2);
    }
    format!(
        "WITH v(card_number, rank, sort_key) AS (VALUES {values}) \
         UPDATE ranked_cards SET rank = v.rank, sort_key = v.sort_key, updated_at_us = ?2 \
         FROM v WHERE ranked_cards.collection_id = ?1 \
         AND ranked_cards.card_number = v.card_number"
    )
}

fn now_us() -> i64 {
    chrono::Utc::now().timestamp_micros()
}

impl RankStore for SqliteRankStore<'_> {
    type Key = CardNumber;

    fn count(&self) -> Result<u64, RankError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM ranked_cards WHERE collection_id = ?1",
            params![self.collection],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn rank_of(&self, key: &CardNumber) -> Result<Option<Rank>, RankError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT rank FROM ranked_cards WHERE collection_id = ?1 AND card_number = ?2",
        )?;
        let text: Option<String> = stmt
            .query_row(params![self.collection, key], |row| row.get(0))
            .optional()?;
        text.map(|t| t.parse()).transpose()
    }

    fn next_greater(&self, rank: &Rank) -> Result<Option<Rank>, RankError> {
        let key = sort_key::encode(rank)?;
        self.query_rank(
            "SELECT rank FROM ranked_cards WHERE collection_id = ?1 AND sort_key > ?2 \
             ORDER BY sort_key ASC LIMIT 1",
            Some(&key),
        )
    }

    fn next_lesser(&self, rank: &Rank) -> Result<Option<Rank>, RankError> {
        let key = sort_key::encode(rank)?;
        self.query_rank(
            "SELECT rank FROM ranked_cards WHERE collection_id = ?1 AND sort_key < ?2 \
             ORDER BY sort_key DESC LIMIT 1",
            Some(&key),
        )
    }

    fn min_rank(&self) -> Result<Option<Rank>, RankError> {
        self.query_rank(
            "SELECT rank FROM ranked_cards WHERE collection_id = ?1 \
             ORDER BY sort_key ASC LIMIT 1",
            None,
        )
    }

    fn max_rank(&self) -> Result<Option<Rank>, RankError> {
        self.query_rank(
            "SELECT rank FROM ranked_cards WHERE collection_id = ?1 \
             ORDER BY sort_key DESC LIMIT 1",
            None,
        )
    }

    fn keys_in_rank_order(&self) -> Result<Vec<CardNumber>, RankError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT card_number FROM ranked_cards WHERE collection_id = ?1 \
             ORDER BY sort_key ASC, card_number ASC",
        )?;
        let keys = stmt
            .query_map(params![self.collection], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<CardNumber>>>()?;
        Ok(keys)
    }

    fn set_rank(&mut self, key: &CardNumber, rank: &Rank) -> Result<(), RankError> {
        self.upsert(*key, rank, now_us())
    }

    fn set_ranks(&mut self, assignments: &[(CardNumber, Rank)]) -> Result<(), RankError> {
        let now = now_us();
        for chunk in assignments.chunks(BULK_UPDATE_ROWS) {
            let mut param_values: Vec<Box<dyn ToSql>> = Vec::with_capacity(2 + chunk.len() * 3);
            param_values.push(Box::new(self.collection.clone()));
            param_values.push(Box::new(now));
            for (card, rank) in chunk {
                param_values.push(Box::new(*card));
                param_values.push(Box::new(rank.to_plain_string()));
                param_values.push(Box::new(sort_key::encode(rank)?));
            }
            let params_ref: Vec<&dyn ToSql> = param_values.iter().map(AsRef::as_ref).collect();

            let mut stmt = self.conn.prepare_cached(&bulk_update_sql(chunk.len()))?;
            stmt.execute(params_from_iter(params_ref))?;
        }
        Ok(())
    }

    fn precision_policy(&self) -> PrecisionPolicy {
        self.precision
    }
}
