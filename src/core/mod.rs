//! Core data structures.

pub mod errors;
pub mod manifest;
pub mod registry;
pub mod split_target;

pub use errors::MonosplitError;
pub use manifest::Manifest;
pub use registry::{Component, ComponentRegistry};
pub use split_target::{SplitState, SplitTarget, TargetRef};
