//! `cardrank remove`: take a card off the board.

use super::{Project, fail};
use crate::output::{OutputMode, render_mode};
use cardrank_core::db::store::CardNumber;
use cardrank_core::db::with_write_transaction;
use cardrank_core::{RankError, RankStore};
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use tracing::info;

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Card number to remove.
    pub card: CardNumber,
}

#[derive(Debug, Serialize)]
pub struct Removal {
    pub ok: bool,
    pub collection: String,
    pub card: CardNumber,
    /// Rank the card held when it was removed.
    pub rank: String,
}

impl Removal {
    fn write_text(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{}  {}  removed", self.card, self.rank)
    }

    fn write_pretty(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "✓ Removed card {} (rank {}) from '{}'",
            self.card, self.rank, self.collection
        )
    }
}

/// Execute `cardrank remove`.
///
/// Other cards keep their ranks, and the card's history stays readable.
///
/// # Errors
///
/// Returns an error if the card is not ranked in the collection or the
/// delete fails.
pub fn run_remove(
    args: &RemoveArgs,
    collection: &str,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let mut project = Project::open(project_root, output)?;
    let config = &project.config;
    let card = args.card;

    let removed = with_write_transaction(&mut project.conn, |tx| {
        let store = Project::store(tx, config, collection);
        let rank = store
            .rank_of(&card)?
            .ok_or_else(|| RankError::not_in_collection(card))?;
        store.remove(card)?;
        Ok(rank)
    });
    let rank = removed.map_err(|e| fail(output, e))?;
    info!(card, collection, %rank, "removed card");

    let removal = Removal {
        ok: true,
        collection: collection.to_string(),
        card,
        rank: rank.to_string(),
    };
    render_mode(
        output,
        &removal,
        |r, w| r.write_text(w),
        |r, w| r.write_pretty(w),
    )
}
