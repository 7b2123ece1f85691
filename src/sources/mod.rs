//! Package sources.
//!
//! A source answers one question for the component registry: which Composer
//! package(s) live at a given monorepo path.

pub mod path;
pub mod source;

pub use path::PathSource;
pub use source::{ComponentPackage, PackageSource};
