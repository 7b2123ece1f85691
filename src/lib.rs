//! Monosplit - tooling for PHP monorepos that publish their components as
//! read-only repositories.
//!
//! This crate provides the library side of the `monosplit` binary: reading
//! the Composer manifest, running the test suite against a subset of
//! components, and splitting component subtrees out to their remotes.

pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Test utilities and mocks for monosplit unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides scripted process, HTTP and package-source
/// implementations plus on-disk monorepo fixtures.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{
    errors::exit_code_for, ComponentRegistry, Manifest, MonosplitError, SplitTarget, TargetRef,
};
pub use crate::util::context::GlobalContext;
