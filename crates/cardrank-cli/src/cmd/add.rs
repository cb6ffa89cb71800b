//! `cardrank add`: rank a card for the first time.

use super::{Project, fail};
use crate::output::{CliError, OutputMode, render_error, render_mode};
use cardrank_core::RankStore;
use cardrank_core::db::store::CardNumber;
use clap::Args;
use std::path::Path;
use tracing::debug;

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Card number to rank.
    pub card: CardNumber,

    /// Place the new card directly above this card (smaller rank).
    #[arg(long, value_name = "CARD", conflicts_with = "after")]
    pub before: Option<CardNumber>,

    /// Place the new card directly below this card (larger rank).
    #[arg(long, value_name = "CARD")]
    pub after: Option<CardNumber>,
}

/// Execute `cardrank add`.
///
/// Without `--before`/`--after` the card goes to the bottom of the list.
///
/// # Errors
///
/// Returns an error if the card is already ranked, the anchor card is not
/// in the collection, or the database write fails.
pub fn run_add(
    args: &AddArgs,
    collection: &str,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let mut project = Project::open(project_root, output)?;

    let existing = Project::store(&project.conn, &project.config, collection);
    if let Some(rank) = existing.rank_of(&args.card)? {
        let message = format!(
            "card {} is already ranked in '{collection}' at {rank}",
            args.card
        );
        render_error(
            output,
            &CliError {
                message: message.clone(),
                suggestion: Some(format!(
                    "Use `cardrank move {} --before <card>` to reposition it.",
                    args.card
                )),
                error_code: Some("already_ranked".to_string()),
            },
        )?;
        anyhow::bail!(message);
    }

    debug!(card = args.card, collection, "adding card");
    let card = args.card;
    let result = project.reposition(collection, card, |coll| {
        let mut item = coll.item(card);
        let change = match (args.before, args.after) {
            (Some(target), _) => item.insert_before(&target)?,
            (None, Some(target)) => item.insert_after(&target)?,
            (None, None) => item.place_last()?,
        };
        Ok(change)
    });
    let added = result.map_err(|e| fail(output, e))?;

    render_mode(
        output,
        &added,
        |r, w| r.write_text(w),
        |r, w| r.write_pretty(w, "Added"),
    )
}
