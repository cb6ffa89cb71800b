//! `cardrank check`: bounds and headroom report for one collection.

use super::{Project, fail};
use crate::output::{OutputMode, render_mode};
use cardrank_core::RankSpace;
use cardrank_core::db::store::{CardNumber, RankedCard};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub ok: bool,
    pub collection: String,
    pub count: usize,
    /// Cards whose rank lies outside `[min, max]`.
    pub out_of_bounds: Vec<CardNumber>,
    /// Groups of cards sharing one rank.
    pub ties: Vec<Vec<CardNumber>>,
    /// Smallest gap between two adjacent distinct ranks.
    pub min_headroom: Option<String>,
    /// Adjacent distinct-rank pairs too close to split.
    pub exhausted_pairs: usize,
}

impl CheckReport {
    fn build(space: &RankSpace, collection: &str, cards: &[RankedCard]) -> Self {
        let out_of_bounds = cards
            .iter()
            .filter(|c| !space.contains(&c.rank))
            .map(|c| c.card_number)
            .collect::<Vec<_>>();

        let mut ties: Vec<Vec<CardNumber>> = Vec::new();
        let mut min_headroom = None;
        let mut exhausted_pairs = 0;
        for pair in cards.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev.rank == next.rank {
                match ties.last_mut() {
                    Some(group) if group.last() == Some(&prev.card_number) => {
                        group.push(next.card_number);
                    }
                    _ => ties.push(vec![prev.card_number, next.card_number]),
                }
                continue;
            }
            let gap = next.rank.minus(&prev.rank);
            if min_headroom.as_ref().is_none_or(|min| &gap < min) {
                min_headroom = Some(gap);
            }
            if space.collides_with_bounds(&prev.rank, &next.rank) {
                exhausted_pairs += 1;
            }
        }

        Self {
            ok: out_of_bounds.is_empty(),
            collection: collection.to_string(),
            count: cards.len(),
            out_of_bounds,
            ties,
            min_headroom: min_headroom.map(|gap| gap.to_string()),
            exhausted_pairs,
        }
    }

    fn write_text(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "check  {}  {}", if self.ok { "ok" } else { "failed" }, self.count)?;
        for card in &self.out_of_bounds {
            writeln!(w, "out_of_bounds  {card}")?;
        }
        for group in &self.ties {
            writeln!(w, "tie  {}", join(group))?;
        }
        if let Some(ref min) = self.min_headroom {
            writeln!(w, "min_headroom  {min}")?;
        }
        writeln!(w, "exhausted_pairs  {}", self.exhausted_pairs)
    }

    fn write_pretty(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "Rank check for '{}'", self.collection)?;
        writeln!(w, "{:<24} {:>24}  Status", "Metric", "Value")?;
        writeln!(w, "{}", "-".repeat(56))?;
        let bounds_status = if self.ok { "✓ in bounds" } else { "✗ out of bounds" };
        writeln!(
            w,
            "{:<24} {:>24}  {bounds_status}",
            "out_of_bounds",
            self.out_of_bounds.len()
        )?;
        let tie_status = if self.ties.is_empty() { "✓ none" } else { "⚠ ties" };
        writeln!(w, "{:<24} {:>24}  {tie_status}", "tie_groups", self.ties.len())?;
        writeln!(
            w,
            "{:<24} {:>24}",
            "min_headroom",
            self.min_headroom.as_deref().unwrap_or("-")
        )?;
        let exhausted_status = if self.exhausted_pairs == 0 {
            "✓ room to split"
        } else {
            "◐ next insert redistributes"
        };
        writeln!(
            w,
            "{:<24} {:>24}  {exhausted_status}",
            "exhausted_pairs", self.exhausted_pairs
        )?;
        for card in &self.out_of_bounds {
            writeln!(w, "  card {card} lies outside the rank space")?;
        }
        for group in &self.ties {
            writeln!(w, "  cards {} share a rank", join(group))?;
        }
        Ok(())
    }
}

fn join(cards: &[CardNumber]) -> String {
    cards
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Execute `cardrank check`.
///
/// Ties and exhausted pairs are reported but tolerated; a rank outside the
/// configured space fails the check.
///
/// # Errors
///
/// Returns an error if any rank is out of bounds or the project cannot be
/// read.
pub fn run_check(collection: &str, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let store = Project::store(&project.conn, &project.config, collection);
    let cards = store
        .ranked_cards()
        .map_err(|e| fail(output, anyhow::Error::new(e)))?;

    let report = CheckReport::build(&project.space, collection, &cards);
    if !report.ties.is_empty() {
        warn!(collection, groups = report.ties.len(), "collection has tied ranks");
    }

    render_mode(
        output,
        &report,
        |r, w| r.write_text(w),
        |r, w| r.write_pretty(w),
    )?;
    if !report.ok {
        anyhow::bail!("check: failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardrank_core::{PrecisionPolicy, Rank};

    fn cards(ranks: &[(CardNumber, &str)]) -> Vec<RankedCard> {
        ranks
            .iter()
            .map(|(card, rank)| RankedCard {
                card_number: *card,
                rank: rank.parse().unwrap(),
                updated_at_us: 0,
            })
            .collect()
    }

    fn space() -> RankSpace {
        RankSpace::new(
            Rank::from(-100_i64),
            Rank::from(100_i64),
            "0.5".parse().unwrap(),
            PrecisionPolicy::Unlimited,
        )
        .unwrap()
    }

    #[test]
    fn healthy_collection_passes() {
        let report = CheckReport::build(
            &space(),
            "default",
            &cards(&[(1, "-10"), (2, "0"), (3, "4")]),
        );
        assert!(report.ok);
        assert!(report.ties.is_empty());
        assert_eq!(report.min_headroom.as_deref(), Some("4"));
        assert_eq!(report.exhausted_pairs, 0);
    }

    #[test]
    fn out_of_bounds_fails() {
        let report =
            CheckReport::build(&space(), "default", &cards(&[(1, "-10"), (2, "101")]));
        assert!(!report.ok);
        assert_eq!(report.out_of_bounds, vec![2]);
    }

    #[test]
    fn ties_are_grouped() {
        let report = CheckReport::build(
            &space(),
            "default",
            &cards(&[(1, "1"), (2, "1"), (3, "1"), (4, "2"), (5, "3"), (6, "3")]),
        );
        assert!(report.ok);
        assert_eq!(report.ties, vec![vec![1, 2, 3], vec![5, 6]]);
        assert_eq!(report.min_headroom.as_deref(), Some("1"));
    }

    #[test]
    fn close_pairs_are_counted_as_exhausted() {
        let report = CheckReport::build(
            &space(),
            "default",
            &cards(&[(1, "0"), (2, "0.5"), (3, "10")]),
        );
        assert_eq!(report.exhausted_pairs, 1);
        assert_eq!(report.min_headroom.as_deref(), Some("0.5"));
    }
}
