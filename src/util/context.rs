//! Global context for monosplit operations.
//!
//! Provides centralized access to the working directory, the project
//! manifest location, the Composer bin dir and the tool configuration.
//! Everything an operation needs is handed to it through this value.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::manifest::{Manifest, MANIFEST_FILE};
use crate::util::config::{global_config_path, load_config, project_config_path, Config};

/// Environment variable Composer uses to override `config.bin-dir`.
pub const BIN_DIR_ENV: &str = "COMPOSER_BIN_DIR";

/// Global context containing paths and environment.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Explicit manifest path (`--manifest`)
    manifest_override: Option<PathBuf>,

    /// Global config file, if any
    global_config: Option<PathBuf>,

    /// `COMPOSER_BIN_DIR` value
    bin_dir_override: Option<PathBuf>,
}

impl GlobalContext {
    /// Create a new GlobalContext from the process environment.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(GlobalContext {
            cwd,
            manifest_override: None,
            global_config: global_config_path(),
            bin_dir_override: std::env::var_os(BIN_DIR_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        })
    }

    /// Create a context for `cwd` that ignores the environment and the global config.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        GlobalContext {
            cwd,
            manifest_override: None,
            global_config: None,
            bin_dir_override: None,
        }
    }

    /// Use an explicit manifest instead of searching for one.
    pub fn with_manifest(mut self, manifest: Option<PathBuf>) -> Self {
        self.manifest_override = manifest.map(|m| {
            if m.is_absolute() {
                m
            } else {
                self.cwd.join(m)
            }
        });
        self
    }

    /// Override the bin dir (as `COMPOSER_BIN_DIR` does).
    pub fn with_bin_dir(mut self, bin_dir: Option<PathBuf>) -> Self {
        self.bin_dir_override = bin_dir;
        self
    }

    /// Find composer.json, starting from cwd and searching upward.
    pub fn find_manifest(&self) -> Result<PathBuf> {
        if let Some(ref manifest) = self.manifest_override {
            if !manifest.is_file() {
                bail!("manifest not found: {}", manifest.display());
            }
            return Ok(manifest.clone());
        }

        let mut current = self.cwd.clone();
        loop {
            let candidate = current.join(MANIFEST_FILE);
            if candidate.is_file() {
                return Ok(candidate);
            }
            if !current.pop() {
                bail!(
                    "could not find `{}` in `{}` or any parent directory",
                    MANIFEST_FILE,
                    self.cwd.display()
                );
            }
        }
    }

    /// Load the project manifest.
    pub fn load_manifest(&self) -> Result<Manifest> {
        Manifest::load(&self.find_manifest()?)
    }

    /// Load merged global and project configuration for `project_root`.
    pub fn load_config(&self, project_root: &Path) -> Config {
        load_config(
            self.global_config.as_deref(),
            &project_config_path(project_root),
        )
    }

    /// Resolve the Composer bin dir for the project.
    pub fn bin_dir(&self, manifest: &Manifest) -> PathBuf {
        let root = manifest.root();
        match self.bin_dir_override {
            Some(ref dir) => root.join(dir),
            None => root.join(manifest.bin_dir()),
        }
    }
}
