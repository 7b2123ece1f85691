//! Command implementations

pub mod completions;
pub mod components;
pub mod install_bin;
pub mod split;

use std::path::PathBuf;

use monosplit::core::Manifest;
use monosplit::ops::InstallOptions;
use monosplit::util::{Config, GlobalContext};

/// Installation options for the splitter, from the manifest and config.
pub fn install_options(ctx: &GlobalContext, manifest: &Manifest, config: &Config) -> InstallOptions {
    InstallOptions {
        bin_dir: ctx.bin_dir(manifest),
        binary_name: config.binary_name().to_string(),
        os: std::env::consts::OS.to_string(),
        downloads: config.download_table(),
        project_root: project_root(manifest),
    }
}

pub fn project_root(manifest: &Manifest) -> PathBuf {
    manifest.root().to_path_buf()
}
