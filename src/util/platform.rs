//! Host platform detection and the splitsh-lite download table.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::MonosplitError;

/// Default splitsh-lite release tarballs.
pub const SPLITSH_LINUX_URL: &str =
    "https://github.com/splitsh/lite/releases/download/v1.0.1/lite_linux_amd64.tar.gz";
pub const SPLITSH_DARWIN_URL: &str =
    "https://github.com/splitsh/lite/releases/download/v1.0.1/lite_darwin_amd64.tar.gz";

/// Operating systems splitsh-lite is distributed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Platform {
    Linux,
    Darwin,
}

impl Platform {
    /// Normalise an OS identifier (`linux`, `macos`, `Darwin`, ...).
    pub fn from_os(os: &str) -> Result<Self, MonosplitError> {
        os.parse().map_err(|_| MonosplitError::UnsupportedPlatform {
            binary: "splitsh-lite".to_string(),
            os: os.to_string(),
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux => "Linux",
            Platform::Darwin => "Darwin",
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linux" => Ok(Platform::Linux),
            "darwin" | "macos" => Ok(Platform::Darwin),
            _ => Err(format!("unsupported platform '{}'", s)),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Archive format of a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveFormat {
    #[default]
    TarGz,
}

/// Where to fetch the binary for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadDescriptor {
    pub url: String,

    #[serde(default)]
    pub format: ArchiveFormat,

    /// Expected SHA256 of the archive (hex), verified when present.
    #[serde(default)]
    pub sha256: Option<String>,
}

impl DownloadDescriptor {
    pub fn tar_gz(url: impl Into<String>) -> Self {
        DownloadDescriptor {
            url: url.into(),
            format: ArchiveFormat::TarGz,
            sha256: None,
        }
    }
}

/// Mapping from platform to download descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTable {
    entries: BTreeMap<Platform, DownloadDescriptor>,
}

impl DownloadTable {
    /// An empty table.
    pub fn new() -> Self {
        DownloadTable {
            entries: BTreeMap::new(),
        }
    }

    /// Add or replace the descriptor for a platform.
    pub fn insert(&mut self, platform: Platform, descriptor: DownloadDescriptor) {
        self.entries.insert(platform, descriptor);
    }

    pub fn get(&self, platform: Platform) -> Option<&DownloadDescriptor> {
        self.entries.get(&platform)
    }

    /// Resolve the descriptor for `platform`, or fail as unsupported.
    pub fn resolve(
        &self,
        platform: Platform,
        binary: &str,
    ) -> Result<&DownloadDescriptor, MonosplitError> {
        self.get(platform)
            .ok_or_else(|| MonosplitError::UnsupportedPlatform {
                binary: binary.to_string(),
                os: platform.to_string(),
            })
    }
}

impl Default for DownloadTable {
    fn default() -> Self {
        let mut table = DownloadTable::new();
        table.insert(Platform::Linux, DownloadDescriptor::tar_gz(SPLITSH_LINUX_URL));
        table.insert(Platform::Darwin, DownloadDescriptor::tar_gz(SPLITSH_DARWIN_URL));
        table
    }
}
