//! Configuration file support for monosplit.
//!
//! Two optional TOML files are read:
//! - Global: `~/.monosplit/config.toml` - User-wide defaults
//! - Project: `.monosplit/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. Settings that belong
//! to the Composer project itself (`extra.git-split.repos`, `sort-packages`,
//! `bin-dir`) are read from composer.json, not from here.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::util::platform::{DownloadDescriptor, DownloadTable, Platform};

/// Default binary name of the subtree splitter.
pub const DEFAULT_SPLITSH_BIN: &str = "splitsh-lite";

/// monosplit configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Manifest pruning policy
    pub policy: PolicyConfig,

    /// External commands
    pub commands: CommandsConfig,

    /// splitsh-lite installation
    pub splitsh: SplitshConfig,
}

/// How the test runner prunes composer.json.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PolicyConfig {
    /// Keep `repositories` entries whose type is not `path` (default: true)
    pub keep_non_path_repositories: Option<bool>,

    /// Keep deselected components that a selected component requires (default: false)
    pub keep_required_siblings: Option<bool>,

    /// Keep `path` repositories that point at no component (default: true)
    pub keep_unmatched_path_repositories: Option<bool>,
}

/// Commands run by the test runner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    /// Dependency update, e.g. `["composer", "update", "--no-interaction"]`
    pub update: Option<Vec<String>>,

    /// Test suite, e.g. `["vendor/bin/phpunit"]`
    pub test: Option<Vec<String>>,
}

/// Where and how splitsh-lite is installed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SplitshConfig {
    /// Binary file name inside the bin dir
    pub binary_name: Option<String>,

    /// Per-platform download overrides, keyed by `Linux` / `Darwin`
    pub downloads: BTreeMap<String, DownloadDescriptor>,
}

/// Resolved pruning policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrunePolicy {
    pub keep_non_path_repositories: bool,
    pub keep_required_siblings: bool,
    pub keep_unmatched_path_repositories: bool,
}

impl Default for PrunePolicy {
    fn default() -> Self {
        PrunePolicy {
            keep_non_path_repositories: true,
            keep_required_siblings: false,
            keep_unmatched_path_repositories: true,
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file is missing or broken.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.policy.keep_non_path_repositories.is_some() {
            self.policy.keep_non_path_repositories = other.policy.keep_non_path_repositories;
        }
        if other.policy.keep_required_siblings.is_some() {
            self.policy.keep_required_siblings = other.policy.keep_required_siblings;
        }
        if other.policy.keep_unmatched_path_repositories.is_some() {
            self.policy.keep_unmatched_path_repositories =
                other.policy.keep_unmatched_path_repositories;
        }

        if other.commands.update.is_some() {
            self.commands.update = other.commands.update;
        }
        if other.commands.test.is_some() {
            self.commands.test = other.commands.test;
        }

        if other.splitsh.binary_name.is_some() {
            self.splitsh.binary_name = other.splitsh.binary_name;
        }
        self.splitsh.downloads.extend(other.splitsh.downloads);
    }

    pub fn policy(&self) -> PrunePolicy {
        let defaults = PrunePolicy::default();
        PrunePolicy {
            keep_non_path_repositories: self
                .policy
                .keep_non_path_repositories
                .unwrap_or(defaults.keep_non_path_repositories),
            keep_required_siblings: self
                .policy
                .keep_required_siblings
                .unwrap_or(defaults.keep_required_siblings),
            keep_unmatched_path_repositories: self
                .policy
                .keep_unmatched_path_repositories
                .unwrap_or(defaults.keep_unmatched_path_repositories),
        }
    }

    pub fn update_command(&self) -> Vec<String> {
        non_empty_or(&self.commands.update, &["composer", "update", "--no-interaction"])
    }

    pub fn test_command(&self) -> Vec<String> {
        non_empty_or(&self.commands.test, &["vendor/bin/phpunit"])
    }

    pub fn binary_name(&self) -> &str {
        self.splitsh
            .binary_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_SPLITSH_BIN)
    }

    /// Build the download table: built-in defaults plus configured overrides.
    ///
    /// Entries with an unknown platform key or an unparsable URL are skipped
    /// with a warning.
    pub fn download_table(&self) -> DownloadTable {
        let mut table = DownloadTable::default();
        for (key, descriptor) in &self.splitsh.downloads {
            let platform = match key.parse::<Platform>() {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!("ignoring splitsh download entry: {}", e);
                    continue;
                }
            };
            if let Err(e) = url::Url::parse(&descriptor.url) {
                tracing::warn!(
                    "ignoring splitsh download for {}: invalid url `{}`: {}",
                    platform,
                    descriptor.url,
                    e
                );
                continue;
            }
            table.insert(platform, descriptor.clone());
        }
        table
    }
}

fn non_empty_or(value: &Option<Vec<String>>, default: &[&str]) -> Vec<String> {
    match value {
        Some(argv) if !argv.is_empty() => argv.clone(),
        _ => default.iter().map(|s| s.to_string()).collect(),
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.monosplit/config.toml)
/// 2. Global config (~/.monosplit/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global monosplit config directory (~/.monosplit).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".monosplit"))
}

/// Get the global config path (~/.monosplit/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.monosplit/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".monosplit").join("config.toml")
}
