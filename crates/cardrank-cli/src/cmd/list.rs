//! `cardrank list`: print a collection in rank order.

use super::{Project, fail};
use crate::output::{OutputMode, pretty_section, render_mode};
use cardrank_core::db::store::CardNumber;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct ListedCard {
    pub position: usize,
    pub card_number: CardNumber,
    pub rank: String,
}

#[derive(Debug, Serialize)]
pub struct Listing {
    pub collection: String,
    pub count: usize,
    pub cards: Vec<ListedCard>,
}

impl Listing {
    fn write_text(&self, w: &mut dyn Write) -> io::Result<()> {
        if self.cards.is_empty() {
            return writeln!(w, "advice  list.empty  Add cards with `cardrank add <card>`");
        }
        writeln!(w, "POS  CARD  RANK")?;
        for card in &self.cards {
            writeln!(w, "{}  {}  {}", card.position, card.card_number, card.rank)?;
        }
        Ok(())
    }

    fn write_pretty(&self, w: &mut dyn Write) -> io::Result<()> {
        pretty_section(
            w,
            &format!("Collection '{}' ({} cards)", self.collection, self.count),
        )?;
        if self.cards.is_empty() {
            return writeln!(w, "No ranked cards. Add one with `cardrank add <card>`.");
        }
        let card_width = self
            .cards
            .iter()
            .map(|c| c.card_number.to_string().len())
            .max()
            .unwrap_or(4)
            .max(4);
        writeln!(w, "{:>4}  {:>card_width$}  RANK", "#", "CARD")?;
        for card in &self.cards {
            writeln!(
                w,
                "{:>4}  {:>card_width$}  {}",
                card.position, card.card_number, card.rank
            )?;
        }
        Ok(())
    }
}

/// Execute `cardrank list`.
///
/// # Errors
///
/// Returns an error if the project cannot be opened or a stored rank is
/// malformed.
pub fn run_list(collection: &str, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let store = Project::store(&project.conn, &project.config, collection);
    let cards = store
        .ranked_cards()
        .map_err(|e| fail(output, anyhow::Error::new(e)))?;

    let listing = Listing {
        collection: collection.to_string(),
        count: cards.len(),
        cards: cards
            .into_iter()
            .enumerate()
            .map(|(idx, card)| ListedCard {
                position: idx + 1,
                card_number: card.card_number,
                rank: card.rank.to_string(),
            })
            .collect(),
    };

    render_mode(
        output,
        &listing,
        |l, w| l.write_text(w),
        |l, w| l.write_pretty(w),
    )
}
