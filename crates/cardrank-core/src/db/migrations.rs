//! Versioned schema upgrades for the rank database, tracked in
//! `PRAGMA user_version`.

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, types::Type};
use tracing::info;

use super::schema;

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "ranked_cards",
        sql: schema::MIGRATION_V1_SQL,
    },
    Migration {
        version: 2,
        name: "rank_changes audit log",
        sql: schema::MIGRATION_V2_SQL,
    },
];

/// Schema version written by this binary.
pub const LATEST_SCHEMA_VERSION: u32 = 2;

/// Read `PRAGMA user_version`.
///
/// # Errors
///
/// Returns an error if the pragma query fails or the stored value is
/// negative or wider than `u32`.
pub fn current_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    u32::try_from(version)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(e)))
}

/// Bring the database up to [`LATEST_SCHEMA_VERSION`] and return the
/// resulting version.
///
/// Every pending step commits on its own together with its `user_version`
/// bump, so an interrupted upgrade resumes where it stopped.
///
/// # Errors
///
/// Returns an error if a step fails, or if the database was written by a
/// newer cardrank whose schema this binary does not know.
pub fn migrate(conn: &mut Connection) -> Result<u32> {
    let mut current = current_schema_version(conn).context("read schema version")?;
    if current > LATEST_SCHEMA_VERSION {
        bail!(
            "rank database is at schema v{current}, newer than the v{LATEST_SCHEMA_VERSION} \
             this cardrank understands; upgrade cardrank"
        );
    }

    for step in MIGRATIONS.iter().filter(move |m| m.version > current) {
        let tx = conn.transaction()?;
        tx.execute_batch(step.sql)
            .with_context(|| format!("apply migration v{} ({})", step.version, step.name))?;
        tx.pragma_update(None, "user_version", i64::from(step.version))?;
        tx.commit()?;

        info!(version = step.version, name = step.name, "migrated rank database");
        current = step.version;
    }

    Ok(current)
}
