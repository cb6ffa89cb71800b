//! Canonical SQLite schema for stored card ranks.
//!
//! - `ranked_cards` holds one row per card and collection; `rank` is the
//!   canonical decimal text and `sort_key` its order-preserving encoding
//! - `rank_changes` is the append-only audit log of published rank changes
//!
//! The schema version lives in `PRAGMA user_version`.

/// Migration v1: ranked cards and their sort index.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS ranked_cards (
    collection_id TEXT NOT NULL CHECK (length(trim(collection_id)) > 0),
    card_number INTEGER NOT NULL,
    rank TEXT NOT NULL,
    sort_key TEXT NOT NULL,
    updated_at_us INTEGER NOT NULL,
    PRIMARY KEY (collection_id, card_number)
);

CREATE INDEX IF NOT EXISTS idx_ranked_cards_sort
    ON ranked_cards(collection_id, sort_key, card_number);
";

/// Migration v2: audit log of rank changes.
pub const MIGRATION_V2_SQL: &str = r"
CREATE TABLE IF NOT EXISTS rank_changes (
    change_id INTEGER PRIMARY KEY AUTOINCREMENT,
    collection_id TEXT NOT NULL,
    card_number INTEGER NOT NULL,
    old_rank TEXT,
    new_rank TEXT NOT NULL,
    redistributed INTEGER NOT NULL DEFAULT 0 CHECK (redistributed IN (0, 1)),
    no_op INTEGER NOT NULL DEFAULT 0 CHECK (no_op IN (0, 1)),
    changed_at_us INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_rank_changes_card
    ON rank_changes(collection_id, card_number, change_id);
";

/// Indexes expected by neighbour and history queries.
pub const REQUIRED_INDEXES: &[&str] = &["idx_ranked_cards_sort", "idx_rank_changes_card"];
