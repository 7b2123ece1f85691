//! High-level operations.
//!
//! This module contains the implementation of monosplit commands.

pub mod install_bin;
pub mod select;
pub mod split;

pub use install_bin::{extract_binary, install_bin, InstallOptions, InstalledBinary};
pub use select::{
    component_registry, prune_manifest, run_tests, PrunePlan, SelectOptions, SelectReport,
};
pub use split::{current_ref, split_all, split_targets, SplitOptions, SplitOutcome, SplitReport};
