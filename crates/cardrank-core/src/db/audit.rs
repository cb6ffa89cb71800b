//! Append-only audit log of published rank changes.

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use serde::Serialize;

use super::store::CardNumber;
use crate::collection::{RankChange, RankListener};
use crate::error::RankError;

/// Listener that appends every published change to `rank_changes`.
///
/// It writes through the same connection as the rank store, so inside
/// [`super::with_write_transaction`] the audit row and the rank commit or
/// roll back together.
pub struct SqliteAuditLog<'c> {
    conn: &'c Connection,
    collection: String,
}

impl<'c> SqliteAuditLog<'c> {
    pub fn new(conn: &'c Connection, collection: impl Into<String>) -> Self {
        Self {
            conn,
            collection: collection.into(),
        }
    }
}

impl RankListener<CardNumber> for SqliteAuditLog<'_> {
    fn on_rank_changed(&self, change: &RankChange<CardNumber>) -> Result<(), RankError> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO rank_changes \
             (collection_id, card_number, old_rank, new_rank, redistributed, no_op, changed_at_us) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        stmt.execute(params![
            self.collection,
            change.key,
            change.old_rank.as_ref().map(|rank| rank.to_plain_string()),
            change.new_rank.to_plain_string(),
            change.redistributed,
            change.no_op,
            chrono::Utc::now().timestamp_micros(),
        ])?;
        Ok(())
    }
}

/// One row of a card's rank history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    pub change_id: i64,
    pub card_number: CardNumber,
    pub old_rank: Option<String>,
    pub new_rank: String,
    pub redistributed: bool,
    pub no_op: bool,
    pub changed_at_us: i64,
}

/// Rank history of `card` in `collection`, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn history(conn: &Connection, collection: &str, card: CardNumber) -> Result<Vec<AuditEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT change_id, card_number, old_rank, new_rank, redistributed, no_op, changed_at_us \
             FROM rank_changes WHERE collection_id = ?1 AND card_number = ?2 \
             ORDER BY change_id DESC",
        )
        .context("prepare rank history query")?;

    let rows = stmt
        .query_map(params![collection, card], |row| {
            Ok(AuditEntry {
                change_id: row.get(0)?,
                card_number: row.get(1)?,
                old_rank: row.get(2)?,
                new_rank: row.get(3)?,
                redistributed: row.get(4)?,
                no_op: row.get(5)?,
                changed_at_us: row.get(6)?,
            })
        })
        .context("execute rank history query")?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("read rank history rows")
}
