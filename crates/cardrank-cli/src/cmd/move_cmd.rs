//! `cardrank move`: reposition a ranked card.
//!
//! Lists render smallest rank first, so `--before X` puts the card directly
//! above X on the board and `--after X` directly below it.

use super::{Project, fail};
use crate::output::{OutputMode, render_mode};
use cardrank_core::db::store::CardNumber;
use clap::{ArgGroup, Args};
use std::path::Path;
use tracing::debug;

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("position").required(true).args(["before", "after", "last"])))]
pub struct MoveArgs {
    /// Card number to move.
    pub card: CardNumber,

    /// Move directly above this card (smaller rank).
    #[arg(long, value_name = "CARD")]
    pub before: Option<CardNumber>,

    /// Move directly below this card (larger rank).
    #[arg(long, value_name = "CARD")]
    pub after: Option<CardNumber>,

    /// Move to the bottom of the list.
    #[arg(long)]
    pub last: bool,
}

/// Execute `cardrank move`.
///
/// # Errors
///
/// Returns an error if the card or its anchor is not in the collection, or
/// if the database write fails.
pub fn run_move(
    args: &MoveArgs,
    collection: &str,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let mut project = Project::open(project_root, output)?;

    debug!(card = args.card, collection, "moving card");
    let card = args.card;
    let result = project.reposition(collection, card, |coll| {
        // Only cards that are already ranked can move.
        coll.rank_of(&card)?;

        let mut item = coll.item(card);
        let change = match (args.before, args.after) {
            (Some(target), _) => item.insert_before(&target)?,
            (None, Some(target)) => item.insert_after(&target)?,
            (None, None) => item.place_last()?,
        };
        Ok(change)
    });
    let moved = result.map_err(|e| fail(output, e))?;

    render_mode(
        output,
        &moved,
        |r, w| r.write_text(w),
        |r, w| r.write_pretty(w, "Moved"),
    )
}
