//! composer.json manifest access.
//!
//! The manifest is kept as a JSON object so every key monosplit does not know
//! about survives a rewrite untouched, in its original order. Only the
//! sections the test runner and the splitter need get typed accessors:
//! `require`, `require-dev`, `repositories`, `config.sort-packages`,
//! `config.bin-dir` and `extra.git-split.repos`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::errors::MonosplitError;
use crate::util::fs::{read_to_string, write_string};

/// Manifest file name.
pub const MANIFEST_FILE: &str = "composer.json";

/// Default Composer bin dir, relative to the project root.
pub const DEFAULT_BIN_DIR: &str = "vendor/bin";

/// A parsed composer.json.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    path: PathBuf,
    data: Map<String, Value>,
}

/// A `repositories` entry, viewed as `type` + `url`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositoryRef<'a> {
    pub kind: Option<&'a str>,
    pub url: Option<&'a str>,
}

impl<'a> RepositoryRef<'a> {
    pub fn from_value(value: &'a Value) -> Self {
        RepositoryRef {
            kind: value.get("type").and_then(Value::as_str),
            url: value.get("url").and_then(Value::as_str),
        }
    }

    pub fn is_path(&self) -> bool {
        self.kind == Some("path")
    }
}

impl Manifest {
    /// Load a manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = read_to_string(path)?;
        Self::parse(path, &contents)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))
    }

    /// Parse manifest contents; `path` is only recorded for saving and messages.
    pub fn parse(path: &Path, contents: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(contents)?;
        match value {
            Value::Object(data) => Ok(Manifest {
                path: path.to_path_buf(),
                data,
            }),
            _ => Err(MonosplitError::ManifestShape {
                message: "top-level value is not an object".to_string(),
            }
            .into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the manifest.
    pub fn root(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }

    /// Package name (`name`).
    pub fn name(&self) -> Option<&str> {
        self.data.get("name").and_then(Value::as_str)
    }

    /// Package names listed under `require`, in declaration order.
    pub fn requires(&self) -> Vec<String> {
        self.section_keys("require")
    }

    /// The `require-dev` mapping, empty if absent.
    pub fn require_dev(&self) -> Map<String, Value> {
        self.data
            .get("require-dev")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }

    /// Replace the `require-dev` mapping, keeping its position in the document.
    pub fn set_require_dev(&mut self, require_dev: Map<String, Value>) {
        self.data
            .insert("require-dev".to_string(), Value::Object(require_dev));
    }

    /// `extra.git-split.repos` as ordered `(path, remote)` pairs.
    ///
    /// A missing or empty section is [`MonosplitError::MissingSplitConfig`].
    pub fn split_repos(&self) -> Result<Vec<(String, String)>, MonosplitError> {
        let repos = self
            .data
            .get("extra")
            .and_then(|e| e.get("git-split"))
            .and_then(|g| g.get("repos"));

        let repos = match repos {
            Some(Value::Object(map)) if !map.is_empty() => map,
            Some(Value::Object(_)) | Some(Value::Null) | None => {
                return Err(MonosplitError::MissingSplitConfig)
            }
            Some(Value::Array(list)) if list.is_empty() => {
                return Err(MonosplitError::MissingSplitConfig)
            }
            Some(_) => {
                return Err(MonosplitError::ManifestShape {
                    message: "extra.git-split.repos must map paths to remote URLs".to_string(),
                })
            }
        };

        repos
            .iter()
            .map(|(path, remote)| match remote.as_str() {
                Some(remote) => Ok((path.clone(), remote.to_string())),
                None => Err(MonosplitError::ManifestShape {
                    message: format!("extra.git-split.repos.{} is not a string", path),
                }),
            })
            .collect()
    }

    /// `config.sort-packages`.
    pub fn sort_packages(&self) -> bool {
        self.config_value("sort-packages")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// `config.bin-dir`, defaulting to `vendor/bin`.
    pub fn bin_dir(&self) -> &str {
        self.config_value("bin-dir")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_BIN_DIR)
    }

    /// Iterate over `repositories` entries (list or keyed-object form).
    pub fn repositories(&self) -> Vec<&Value> {
        match self.data.get("repositories") {
            Some(Value::Array(list)) => list.iter().collect(),
            Some(Value::Object(map)) => map.values().collect(),
            _ => Vec::new(),
        }
    }

    /// Keep only the `repositories` entries for which `keep` returns true.
    ///
    /// Returns how many entries were dropped.
    pub fn retain_repositories<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Value) -> bool,
    {
        match self.data.get_mut("repositories") {
            Some(Value::Array(list)) => {
                let before = list.len();
                list.retain(|repo| keep(repo));
                before - list.len()
            }
            Some(Value::Object(map)) => {
                let before = map.len();
                map.retain(|_, repo| keep(repo));
                before - map.len()
            }
            _ => 0,
        }
    }

    /// Serialize the way Composer's `JsonFile` writes: 4-space indent,
    /// unescaped slashes and unicode, trailing newline.
    pub fn to_json_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.data
            .serialize(&mut ser)
            .context("failed to serialize manifest")?;
        let mut out = String::from_utf8(buf).context("manifest is not valid UTF-8")?;
        out.push('\n');
        Ok(out)
    }

    /// Write the manifest back to the path it was loaded from.
    pub fn save(&self) -> Result<()> {
        write_string(&self.path, &self.to_json_string()?)
    }

    fn config_value(&self, key: &str) -> Option<&Value> {
        self.data.get("config").and_then(|c| c.get(key))
    }

    fn section_keys(&self, section: &str) -> Vec<String> {
        self.data
            .get(section)
            .and_then(Value::as_object)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }
}
