//! `cardrank show`: one card's rank and its neighbours on the board.

use super::{Project, fail};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use cardrank_core::RankError;
use cardrank_core::db::store::{CardNumber, RankedCard};
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Card number to show.
    pub card: CardNumber,
}

#[derive(Debug, Serialize)]
pub struct Neighbour {
    pub card_number: CardNumber,
    pub rank: String,
}

impl From<&RankedCard> for Neighbour {
    fn from(card: &RankedCard) -> Self {
        Self {
            card_number: card.card_number,
            rank: card.rank.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CardView {
    pub collection: String,
    pub card_number: CardNumber,
    pub rank: String,
    pub position: usize,
    pub count: usize,
    pub above: Option<Neighbour>,
    pub below: Option<Neighbour>,
    pub updated_at_us: i64,
}

impl CardView {
    /// Locate `card` in an already rank-ordered list.
    fn locate(collection: &str, card: CardNumber, cards: &[RankedCard]) -> Option<Self> {
        let idx = cards.iter().position(|c| c.card_number == card)?;
        let this = &cards[idx];
        Some(Self {
            collection: collection.to_string(),
            card_number: card,
            rank: this.rank.to_string(),
            position: idx + 1,
            count: cards.len(),
            above: idx.checked_sub(1).map(|i| Neighbour::from(&cards[i])),
            below: cards.get(idx + 1).map(Neighbour::from),
            updated_at_us: this.updated_at_us,
        })
    }

    fn write_text(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}  {}  {}/{}",
            self.card_number, self.rank, self.position, self.count
        )
    }

    fn write_pretty(&self, w: &mut dyn Write) -> io::Result<()> {
        pretty_section(w, &format!("Card {}", self.card_number))?;
        pretty_kv(w, "Collection", &self.collection)?;
        pretty_kv(w, "Rank", &self.rank)?;
        pretty_kv(w, "Position", format!("{} of {}", self.position, self.count))?;
        let describe = |n: &Option<Neighbour>| {
            n.as_ref().map_or_else(
                || "(none)".to_string(),
                |n| format!("{} (rank {})", n.card_number, n.rank),
            )
        };
        pretty_kv(w, "Above", describe(&self.above))?;
        pretty_kv(w, "Below", describe(&self.below))?;
        if let Some(at) = chrono::DateTime::from_timestamp_micros(self.updated_at_us) {
            pretty_kv(w, "Updated", at.format("%Y-%m-%d %H:%M:%S UTC").to_string())?;
        }
        Ok(())
    }
}

/// Execute `cardrank show`.
///
/// # Errors
///
/// Returns an error if the card is not ranked in the collection.
pub fn run_show(
    args: &ShowArgs,
    collection: &str,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let store = Project::store(&project.conn, &project.config, collection);
    let cards = store
        .ranked_cards()
        .map_err(|e| fail(output, anyhow::Error::new(e)))?;

    let Some(view) = CardView::locate(collection, args.card, &cards) else {
        return Err(fail(
            output,
            anyhow::Error::new(RankError::not_in_collection(args.card)),
        ));
    };

    render_mode(
        output,
        &view,
        |v, w| v.write_text(w),
        |v, w| v.write_pretty(w),
    )
}
