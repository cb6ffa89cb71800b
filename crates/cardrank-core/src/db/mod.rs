//! SQLite rank database utilities.
//!
//! Runtime defaults:
//! - `journal_mode = WAL` so readers never block the single writer
//! - `busy_timeout = 5s` to absorb short lock contention between processes
//! - every reposition runs inside `BEGIN IMMEDIATE`, which takes the write
//!   lock up front and serializes ranking operations per database

pub mod audit;
pub mod migrations;
pub mod schema;
pub mod sort_key;
pub mod store;

use anyhow::{Context, Result};
use rusqlite::{Connection, TransactionBehavior};
use std::{path::Path, time::Duration};
use tracing::warn;

/// Busy timeout used for rank DB connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the rank database, apply runtime pragmas, and migrate
/// schema to the latest version.
///
/// # Errors
///
/// Returns an error if opening/configuring/migrating the database fails.
pub fn open_rank_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create rank db directory {}", parent.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("open rank database {}", path.display()))?;

    configure_connection(&conn).context("configure sqlite pragmas")?;
    migrations::migrate(&mut conn).context("apply rank db migrations")?;

    Ok(conn)
}

/// Open the rank database if it exists and is readable.
///
/// Returns `Ok(None)` when the file is missing or cannot be opened, so
/// callers can report an uninitialized project instead of a raw I/O error.
///
/// # Errors
///
/// Currently infallible; the `Result` leaves room for stricter checks.
pub fn try_open_rank_db(path: &Path) -> Result<Option<Connection>> {
    if !path.exists() {
        return Ok(None);
    }

    match open_rank_db(path) {
        Ok(conn) => Ok(Some(conn)),
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "failed to open rank database"
            );
            Ok(None)
        }
    }
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

/// Run `f` inside a `BEGIN IMMEDIATE` transaction.
///
/// The transaction commits when `f` returns `Ok` and rolls back otherwise,
/// so a reposition together with its redistribution and audit rows is
/// all-or-nothing.
///
/// # Errors
///
/// Returns the error from `f`, or an error if the transaction cannot be
/// started or committed.
pub fn with_write_transaction<T, F>(conn: &mut Connection, f: F) -> Result<T>
where
    F: FnOnce(&Connection) -> Result<T>,
{
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .context("begin immediate transaction")?;
    let value = f(&*tx)?;
    tx.commit().context("commit rank transaction")?;
    Ok(value)
}
