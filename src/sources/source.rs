//! Source trait - common interface for package lookups.

use anyhow::Result;

/// A package found at a component path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentPackage {
    /// Composer package name (`vendor/name`)
    pub name: String,

    /// Names listed in the package's own `require` section
    pub requires: Vec<String>,
}

impl ComponentPackage {
    pub fn new(name: impl Into<String>) -> Self {
        ComponentPackage {
            name: name.into(),
            requires: Vec::new(),
        }
    }

    pub fn with_requires<I, S>(mut self, requires: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires = requires.into_iter().map(Into::into).collect();
        self
    }
}

/// A source of package definitions.
pub trait PackageSource {
    /// Get the source name for display.
    fn name(&self) -> &str;

    /// List the packages declared at `path` (relative to the project root).
    fn packages(&mut self, path: &str) -> Result<Vec<ComponentPackage>>;
}
