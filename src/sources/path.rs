//! Path source - reads a component's own composer.json.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::manifest::{Manifest, MANIFEST_FILE};
use crate::sources::{ComponentPackage, PackageSource};

/// A source for components living in subdirectories of the project.
pub struct PathSource {
    /// The project root
    root: PathBuf,
}

impl PathSource {
    /// Create a path source rooted at the monorepo root.
    pub fn new(root: impl AsRef<Path>) -> Self {
        PathSource {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Manifest path of the component at `path`.
    pub fn manifest_path(&self, path: &str) -> PathBuf {
        self.root.join(path).join(MANIFEST_FILE)
    }
}

impl PackageSource for PathSource {
    fn name(&self) -> &str {
        "path"
    }

    fn packages(&mut self, path: &str) -> Result<Vec<ComponentPackage>> {
        let manifest_path = self.manifest_path(path);
        let manifest = Manifest::load(&manifest_path)
            .with_context(|| format!("failed to read the package definition in `{}`", path))?;

        // A manifest without a name declares no package.
        let packages = manifest
            .name()
            .map(|name| ComponentPackage::new(name).with_requires(manifest.requires()))
            .into_iter()
            .collect();

        Ok(packages)
    }
}
