//! `cardrank init`: create the `.cardrank/` state directory.

use crate::output::{OutputMode, pretty_kv, render_mode};
use anyhow::Context as _;
use cardrank_core::config::{self, RankingConfig};
use cardrank_core::db::{migrations, open_rank_db};
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use tracing::info;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Reinitialize even if `.cardrank/` already exists. Existing ranks are
    /// kept; the config file is reset to defaults.
    #[arg(long)]
    pub force: bool,
}

const GITIGNORE: &str = "ranks.db\nranks.db-wal\nranks.db-shm\n";

#[derive(Debug, Serialize)]
pub struct InitOutput {
    pub ok: bool,
    pub path: String,
    pub schema_version: u32,
}

impl InitOutput {
    fn write_text(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "initialized  {}  schema={}", self.path, self.schema_version)
    }

    fn write_pretty(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "✓ Initialized {}", self.path)?;
        writeln!(w)?;
        pretty_kv(w, "Config", format!("{}/{}", config::STATE_DIR, config::CONFIG_FILE))?;
        pretty_kv(w, "Database", format!("{}/{}", config::STATE_DIR, config::DB_FILE))?;
        pretty_kv(w, "Schema", self.schema_version.to_string())?;
        writeln!(w)?;
        writeln!(w, "Next steps:")?;
        writeln!(w, "  cardrank add 1")?;
        writeln!(w, "  cardrank add 2 --before 1")
    }
}

/// Execute `cardrank init`. Creates:
///
/// ```text
/// .cardrank/
///   config.toml   (default rank space and event settings)
///   ranks.db      (migrated rank database)
///   .gitignore    (database files)
/// ```
///
/// # Errors
///
/// Returns an error if `.cardrank/` already exists and `--force` is not set,
/// or if any filesystem or database operation fails.
pub fn run_init(args: &InitArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let state_dir = config::state_dir(project_root);
    if state_dir.exists() && !args.force {
        anyhow::bail!(
            "{} already exists. Use `cardrank init --force` to reinitialize.",
            config::STATE_DIR
        );
    }

    config::write_config(project_root, &RankingConfig::default())?;

    let gitignore_path = state_dir.join(".gitignore");
    std::fs::write(&gitignore_path, GITIGNORE)
        .with_context(|| format!("Failed to write .gitignore: {}", gitignore_path.display()))?;

    let db_path = config::db_path(project_root);
    let conn = open_rank_db(&db_path)?;
    let schema_version = migrations::current_schema_version(&conn)
        .context("read schema version of the new rank database")?;
    info!(path = %state_dir.display(), schema_version, "initialized cardrank project");

    let payload = InitOutput {
        ok: true,
        path: state_dir.display().to_string(),
        schema_version,
    };
    render_mode(
        output,
        &payload,
        |p, w| p.write_text(w),
        |p, w| p.write_pretty(w),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardrank_core::db::migrations::LATEST_SCHEMA_VERSION;

    #[test]
    fn fresh_init_creates_structure() {
        let root = tempfile::tempdir().unwrap();
        run_init(&InitArgs { force: false }, OutputMode::Json, root.path())
            .expect("init should succeed");

        assert!(root.path().join(".cardrank/config.toml").is_file());
        assert!(root.path().join(".cardrank/ranks.db").is_file());
        assert!(root.path().join(".cardrank/.gitignore").is_file());

        let conn = open_rank_db(&config::db_path(root.path())).unwrap();
        assert_eq!(
            migrations::current_schema_version(&conn).unwrap(),
            LATEST_SCHEMA_VERSION
        );
        assert_eq!(
            config::load_config(root.path()).unwrap(),
            RankingConfig::default()
        );
    }

    #[test]
    fn reinit_without_force_fails() {
        let root = tempfile::tempdir().unwrap();
        run_init(&InitArgs { force: false }, OutputMode::Json, root.path()).unwrap();
        let result = run_init(&InitArgs { force: false }, OutputMode::Json, root.path());
        assert!(result.is_err(), "reinit without --force must fail");
    }

    #[test]
    fn reinit_with_force_succeeds() {
        let root = tempfile::tempdir().unwrap();
        run_init(&InitArgs { force: false }, OutputMode::Json, root.path()).unwrap();
        run_init(&InitArgs { force: true }, OutputMode::Json, root.path())
            .expect("reinit with --force should succeed");
    }
}
