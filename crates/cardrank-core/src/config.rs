use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::RankError;
use crate::rank::Rank;
use crate::space::{PrecisionPolicy, RankSpace};

/// Project state directory, relative to the project root.
pub const STATE_DIR: &str = ".cardrank";
/// Config file name inside [`STATE_DIR`].
pub const CONFIG_FILE: &str = "config.toml";
/// Rank database file name inside [`STATE_DIR`].
pub const DB_FILE: &str = "ranks.db";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RankingConfig {
    #[serde(default)]
    pub space: SpaceConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

/// Rank space bounds, kept as decimal strings so no precision is lost in
/// TOML's float type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceConfig {
    #[serde(default = "default_min")]
    pub min: String,
    #[serde(default = "default_max")]
    pub max: String,
    #[serde(default = "default_threshold")]
    pub threshold: String,
    /// `0` means unlimited precision.
    #[serde(default)]
    pub sig_figs: u64,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            min: default_min(),
            max: default_max(),
            threshold: default_threshold(),
            sig_figs: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EventsConfig {
    #[serde(default)]
    pub emit_on_no_op: bool,
}

impl RankingConfig {
    /// Build and validate the configured rank space.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::InvalidRank`] for an unparsable bound,
    /// [`RankError::InvalidBounds`] when the bounds are inconsistent, and
    /// [`RankError::InsufficientPrecision`] when `sig_figs` is too small for
    /// them.
    pub fn rank_space(&self) -> Result<RankSpace, RankError> {
        RankSpace::new(
            self.space.min.parse::<Rank>()?,
            self.space.max.parse::<Rank>()?,
            self.space.threshold.parse::<Rank>()?,
            self.precision(),
        )
    }

    #[must_use]
    pub const fn precision(&self) -> PrecisionPolicy {
        PrecisionPolicy::from_sig_figs(self.space.sig_figs)
    }
}

/// `<project_root>/.cardrank`
#[must_use]
pub fn state_dir(project_root: &Path) -> PathBuf {
    project_root.join(STATE_DIR)
}

/// `<project_root>/.cardrank/ranks.db`
#[must_use]
pub fn db_path(project_root: &Path) -> PathBuf {
    state_dir(project_root).join(DB_FILE)
}

/// Load `.cardrank/config.toml`; a missing file yields the defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(project_root: &Path) -> Result<RankingConfig> {
    let path = state_dir(project_root).join(CONFIG_FILE);
    if !path.exists() {
        return Ok(RankingConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<RankingConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Write `config` to `.cardrank/config.toml`, creating the directory.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_config(project_root: &Path, config: &RankingConfig) -> Result<PathBuf> {
    let dir = state_dir(project_root);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join(CONFIG_FILE);
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn default_min() -> String {
    "-18446744073709551616".to_string()
}

fn default_max() -> String {
    "18446744073709551616".to_string()
}

fn default_threshold() -> String {
    "0.0000001".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(dir.path()).expect("load should succeed");
        assert_eq!(cfg, RankingConfig::default());
        assert!(!cfg.events.emit_on_no_op);
        assert_eq!(cfg.precision(), PrecisionPolicy::Unlimited);
    }

    #[test]
    fn default_config_builds_default_space() {
        let space = RankingConfig::default().rank_space().expect("valid space");
        assert_eq!(space, RankSpace::default());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: RankingConfig = toml::from_str(
            r#"
[space]
threshold = "0.5"
sig_figs = 24

[events]
emit_on_no_op = true
"#,
        )
        .expect("parse");

        assert_eq!(cfg.space.min, "-18446744073709551616");
        assert_eq!(cfg.space.threshold, "0.5");
        assert_eq!(cfg.precision().sig_figs(), 24);
        assert!(cfg.events.emit_on_no_op);
        assert!(cfg.rank_space().is_ok());
    }

    #[test]
    fn sig_figs_too_small_for_bounds_are_rejected() {
        let mut cfg = RankingConfig::default();
        cfg.space.sig_figs = 12;
        let err = cfg.rank_space().expect_err("12 digits cannot resolve 2^64");
        assert!(matches!(
            err,
            RankError::InsufficientPrecision {
                sig_figs: 12,
                required: 28
            }
        ));
        assert_eq!(err.code(), crate::error::ErrorCode::InvalidBounds);

        cfg.space.sig_figs = 28;
        assert!(cfg.rank_space().is_ok());
    }

    #[test]
    fn inconsistent_bounds_are_rejected() {
        let mut cfg = RankingConfig::default();
        cfg.space.min = "100".to_string();
        cfg.space.max = "10".to_string();
        assert!(matches!(
            cfg.rank_space(),
            Err(RankError::InvalidBounds { .. })
        ));

        cfg.space.max = "ten".to_string();
        assert!(matches!(cfg.rank_space(), Err(RankError::InvalidRank(_))));
    }

    #[test]
    fn malformed_toml_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = state_dir(dir.path());
        std::fs::create_dir_all(&state).expect("mkdir");
        std::fs::write(state.join(CONFIG_FILE), "[space\nmin = 1").expect("write");

        let err = load_config(dir.path()).expect_err("malformed");
        assert!(format!("{err:#}").contains("config.toml"));
    }

    #[test]
    fn written_config_loads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cfg = RankingConfig::default();
        cfg.space.sig_figs = 30;

        let path = write_config(dir.path(), &cfg).expect("write");
        assert!(path.ends_with(".cardrank/config.toml"));
        assert_eq!(load_config(dir.path()).expect("load"), cfg);
    }
}
