//! Component registry: which package lives at which monorepo path.
//!
//! Built fresh on every run from `extra.git-split.repos` by asking a
//! [`PackageSource`] what each configured path declares. Nothing is cached.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};

use crate::core::errors::MonosplitError;
use crate::sources::PackageSource;
use crate::util::fs::normalize_rel;

/// A package provided by one of the split paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Composer package name
    pub name: String,

    /// Path relative to the project root, normalised (`lib/repo1`)
    pub path: String,

    /// Remote the path is split to
    pub remote: String,

    /// Packages this component requires
    pub requires: Vec<String>,
}

/// Mapping from package name to component.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    components: BTreeMap<String, Component>,
}

impl ComponentRegistry {
    /// Query `source` for every configured `(path, remote)` pair.
    ///
    /// Every path must declare at least one package, and no package may be
    /// declared by two different paths.
    pub fn build(repos: &[(String, String)], source: &mut dyn PackageSource) -> Result<Self> {
        let mut components: BTreeMap<String, Component> = BTreeMap::new();

        for (path, remote) in repos {
            let packages = source
                .packages(path)
                .with_context(|| format!("failed to query {} source for `{}`", source.name(), path))?;

            if packages.is_empty() {
                return Err(MonosplitError::NoPackagesAtPath { path: path.into() }.into());
            }

            let path = normalize_rel(path);
            for package in packages {
                if let Some(existing) = components.get(&package.name) {
                    if existing.path == path {
                        continue;
                    }
                    return Err(MonosplitError::DuplicatePackage {
                        name: package.name,
                        first: existing.path.clone(),
                        second: path,
                    }
                    .into());
                }

                tracing::debug!("component {} -> {}", package.name, path);
                let component = Component {
                    name: package.name.clone(),
                    path: path.clone(),
                    remote: remote.clone(),
                    requires: package.requires,
                };
                components.insert(package.name, component);
            }
        }

        Ok(ComponentRegistry { components })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Component> {
        self.components.get(name)
    }

    /// Components sorted by package name.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// All component paths.
    pub fn paths(&self) -> BTreeSet<&str> {
        self.components.values().map(|c| c.path.as_str()).collect()
    }

    /// Check that every requested name is a component.
    ///
    /// Fails on the first unknown name, in argument order.
    pub fn validate_selection(&self, names: &[String]) -> Result<BTreeSet<String>, MonosplitError> {
        let mut selection = BTreeSet::new();
        for name in names {
            if !self.contains(name) {
                return Err(MonosplitError::InvalidPackage { name: name.clone() });
            }
            selection.insert(name.clone());
        }
        Ok(selection)
    }

    /// The selection plus every component it requires, transitively.
    pub fn with_required_siblings(&self, selection: &BTreeSet<String>) -> BTreeSet<String> {
        let mut closure = selection.clone();
        let mut queue: Vec<&str> = selection.iter().map(String::as_str).collect();

        while let Some(name) = queue.pop() {
            let Some(component) = self.get(name) else {
                continue;
            };
            for dep in &component.requires {
                if self.contains(dep) && closure.insert(dep.clone()) {
                    queue.push(dep.as_str());
                }
            }
        }

        closure
    }

    /// Paths of the given package names.
    pub fn paths_of<'a>(&'a self, names: &BTreeSet<String>) -> BTreeSet<&'a str> {
        names
            .iter()
            .filter_map(|n| self.get(n))
            .map(|c| c.path.as_str())
            .collect()
    }
}
