pub mod add;
pub mod check;
pub mod completions;
pub mod history;
pub mod init;
pub mod list;
pub mod move_cmd;
pub mod remove;
pub mod show;

use crate::output::{CliError, OutputMode, render_error};
use anyhow::Context as _;
use cardrank_core::config::{self, RankingConfig};
use cardrank_core::db::audit::SqliteAuditLog;
use cardrank_core::db::store::{CardNumber, SqliteRankStore};
use cardrank_core::db::{try_open_rank_db, with_write_transaction};
use cardrank_core::{ErrorCode, RankChange, RankSpace, RankedCollection};
use rusqlite::Connection;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

/// Everything a command needs to rank cards in one project.
pub struct Project {
    pub conn: Connection,
    pub config: RankingConfig,
    pub space: RankSpace,
}

impl Project {
    /// Open the project rooted at `project_root`, reporting failures in
    /// `output` mode before returning them.
    pub fn open(project_root: &Path, output: OutputMode) -> anyhow::Result<Self> {
        let config = match config::load_config(project_root) {
            Ok(config) => config,
            Err(e) => {
                render_error(
                    output,
                    &CliError::with_code(format!("{e:#}"), ErrorCode::ConfigParseError),
                )?;
                return Err(e);
            }
        };
        let space = config
            .rank_space()
            .context("load [space] from .cardrank/config.toml");
        let space = match space {
            Ok(space) => space,
            Err(e) => return Err(fail(output, e)),
        };

        let db_path = config::db_path(project_root);
        let Some(conn) = try_open_rank_db(&db_path)? else {
            let message = format!("rank database not found at {}", db_path.display());
            render_error(
                output,
                &CliError::with_code(&message, ErrorCode::NotInitialized),
            )?;
            anyhow::bail!(message);
        };

        Ok(Self {
            conn,
            config,
            space,
        })
    }

    /// Store view over `collection`, honouring a pinned `sig_figs`.
    pub fn store<'c>(
        conn: &'c Connection,
        config: &RankingConfig,
        collection: &str,
    ) -> SqliteRankStore<'c> {
        SqliteRankStore::new(conn, collection).with_precision(config.precision())
    }

    /// Run one reposition of `card` inside a write transaction, with the
    /// audit log attached.
    pub fn reposition<F>(
        &mut self,
        collection: &str,
        card: CardNumber,
        f: F,
    ) -> anyhow::Result<Reposition>
    where
        F: FnOnce(
            &mut RankedCollection<'_, SqliteRankStore<'_>>,
        ) -> anyhow::Result<RankChange<CardNumber>>,
    {
        let config = &self.config;
        let space = &self.space;
        with_write_transaction(&mut self.conn, |tx| {
            let store = Self::store(tx, config, collection);
            let mut coll = RankedCollection::new(space.clone(), store)?
                .with_emit_on_no_op(config.events.emit_on_no_op);
            coll.add_listener(SqliteAuditLog::new(tx, collection));

            let change = f(&mut coll)?;
            Ok(Reposition::new(collection, card, &change))
        })
    }
}

/// Result of `add` or `move`, as rendered to the user.
#[derive(Debug, Serialize)]
pub struct Reposition {
    pub ok: bool,
    pub collection: String,
    pub card: CardNumber,
    pub old_rank: Option<String>,
    pub new_rank: String,
    pub redistributed: bool,
    pub no_op: bool,
}

impl Reposition {
    fn new(collection: &str, card: CardNumber, change: &RankChange<CardNumber>) -> Self {
        Self {
            ok: true,
            collection: collection.to_string(),
            card,
            old_rank: change.old_rank.as_ref().map(ToString::to_string),
            new_rank: change.new_rank.to_string(),
            redistributed: change.redistributed,
            no_op: change.no_op,
        }
    }

    pub fn write_text(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}  {}  {}{}",
            self.card,
            self.new_rank,
            if self.no_op { "unchanged" } else { "ranked" },
            if self.redistributed { "  redistributed" } else { "" }
        )
    }

    pub fn write_pretty(&self, w: &mut dyn Write, verb: &str) -> io::Result<()> {
        if self.no_op {
            writeln!(w, "✓ Card {} already in place (rank {})", self.card, self.new_rank)?;
        } else {
            writeln!(w, "✓ {verb} card {} → rank {}", self.card, self.new_rank)?;
        }
        if self.redistributed {
            writeln!(w, "  collection '{}' was redistributed", self.collection)?;
        }
        Ok(())
    }
}

/// Render `err` to stderr and hand it back for propagation.
pub fn fail(output: OutputMode, err: anyhow::Error) -> anyhow::Error {
    if let Err(render_err) = render_error(output, &CliError::from(&err)) {
        return render_err;
    }
    err
}
