//! cohortgrade configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level cohortgrade configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortgradeConfig {
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Report formats written by `evaluate` when `--format` is omitted.
    #[serde(default = "default_format")]
    pub default_format: String,
    /// Max cohorts evaluated concurrently.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Minimum change in a student's average reported by `compare`.
    #[serde(default = "default_regression_threshold")]
    pub regression_threshold: f64,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./cohortgrade-results")
}
fn default_format() -> String {
    "json".to_string()
}
fn default_parallelism() -> usize {
    4
}
fn default_regression_threshold() -> f64 {
    0.5
}

impl Default for CohortgradeConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            default_format: default_format(),
            parallelism: default_parallelism(),
            regression_threshold: default_regression_threshold(),
        }
    }
}

fn global_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".config/cohortgrade/config.toml"))
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order:
/// 1. `cohortgrade.toml` in the current directory
/// 2. `~/.config/cohortgrade/config.toml`
///
/// Environment variable overrides: `COHORTGRADE_OUTPUT_DIR`, `COHORTGRADE_PARALLELISM`.
pub fn load_config_from(path: Option<&Path>) -> Result<CohortgradeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("cohortgrade.toml");
        if local.exists() {
            Some(local)
        } else {
            global_config_path().filter(|p| p.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<CohortgradeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => CohortgradeConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

    anyhow::ensure!(config.parallelism >= 1, "parallelism must be at least 1");
    anyhow::ensure!(
        config.regression_threshold >= 0.0,
        "regression_threshold must not be negative"
    );

    Ok(config)
}

fn apply_env_overrides(
    config: &mut CohortgradeConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(dir) = lookup("COHORTGRADE_OUTPUT_DIR") {
        config.output_dir = PathBuf::from(dir);
    }
    if let Some(value) = lookup("COHORTGRADE_PARALLELISM") {
        config.parallelism = value
            .trim()
            .parse()
            .with_context(|| format!("invalid COHORTGRADE_PARALLELISM: '{value}'"))?;
    }
    Ok(())
}
