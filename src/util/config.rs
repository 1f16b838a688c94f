//! Configuration file support for sasbuild.
//!
//! sasbuild supports two tool configuration file locations:
//! - Global: `~/.sasbuild/config.toml` - User-wide defaults
//! - Project: `.sasbuild/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. Build inputs
//! (targets, folders, service vars) live in `sasbuild.toml`, not here.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// sasbuild tool configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Target to build when none is given on the command line
    pub default_target: Option<String>,

    /// Number of units compiled in parallel (None = auto-detect)
    pub jobs: Option<usize>,

    /// Date after which `<h4> Dependencies </h4>` headings are rejected
    pub deprecation_cutover: Option<NaiveDate>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.build.default_target.is_some() {
            self.build.default_target = other.build.default_target;
        }
        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }
        if other.build.deprecation_cutover.is_some() {
            self.build.deprecation_cutover = other.build.deprecation_cutover;
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.sasbuild/config.toml)
/// 2. Global config (~/.sasbuild/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        let global = Config::load_or_default(global_path);
        config.merge(global);
    }

    if project_path.exists() {
        let project = Config::load_or_default(project_path);
        config.merge(project);
    }

    config
}

/// Get the global sasbuild config directory (~/.sasbuild).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".sasbuild"))
}
