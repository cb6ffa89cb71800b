//! `cardrank history`: audit trail of a card's rank changes.

use super::{Project, fail};
use crate::output::{OutputMode, pretty_section, render_mode};
use cardrank_core::db::audit::{self, AuditEntry};
use cardrank_core::db::store::CardNumber;
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Card number whose history to show.
    pub card: CardNumber,

    /// Show at most this many entries (newest first).
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct History {
    pub collection: String,
    pub card_number: CardNumber,
    pub entries: Vec<AuditEntry>,
}

fn format_time(us: i64) -> String {
    chrono::DateTime::from_timestamp_micros(us).map_or_else(
        || us.to_string(),
        |at| at.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

fn flags(entry: &AuditEntry) -> &'static str {
    match (entry.redistributed, entry.no_op) {
        (true, _) => "redistributed",
        (false, true) => "no-op",
        (false, false) => "",
    }
}

impl History {
    fn write_text(&self, w: &mut dyn Write) -> io::Result<()> {
        for entry in &self.entries {
            writeln!(
                w,
                "{}  {}  {}  {}  {}",
                entry.change_id,
                entry.changed_at_us,
                entry.old_rank.as_deref().unwrap_or("-"),
                entry.new_rank,
                flags(entry)
            )?;
        }
        Ok(())
    }

    fn write_pretty(&self, w: &mut dyn Write) -> io::Result<()> {
        pretty_section(
            w,
            &format!(
                "History of card {} in '{}'",
                self.card_number, self.collection
            ),
        )?;
        if self.entries.is_empty() {
            return writeln!(w, "No recorded rank changes.");
        }
        for entry in &self.entries {
            let old = entry.old_rank.as_deref().unwrap_or("(new)");
            let note = flags(entry);
            if note.is_empty() {
                writeln!(
                    w,
                    "{}  {old} → {}",
                    format_time(entry.changed_at_us),
                    entry.new_rank
                )?;
            } else {
                writeln!(
                    w,
                    "{}  {old} → {}  [{note}]",
                    format_time(entry.changed_at_us),
                    entry.new_rank
                )?;
            }
        }
        Ok(())
    }
}

/// Execute `cardrank history`.
///
/// An unranked card with no history prints an empty list; history outlives
/// a card's removal from the board.
///
/// # Errors
///
/// Returns an error if the project cannot be opened or the query fails.
pub fn run_history(
    args: &HistoryArgs,
    collection: &str,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let mut entries = audit::history(&project.conn, collection, args.card)
        .map_err(|e| fail(output, e))?;
    if let Some(limit) = args.limit {
        entries.truncate(limit);
    }

    let history = History {
        collection: collection.to_string(),
        card_number: args.card,
        entries,
    };
    render_mode(
        output,
        &history,
        |h, w| h.write_text(w),
        |h, w| h.write_pretty(w),
    )
}
