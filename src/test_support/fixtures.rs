//! Test fixtures for common test scenarios.
//!
//! Builds throwaway monorepos on disk and release archives in memory.

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::json;
use tempfile::TempDir;

use crate::core::manifest::{Manifest, MANIFEST_FILE};

/// Root manifest of [`MonorepoFixture::standard`].
///
/// `require-dev` interleaves component and third-party entries, and the
/// path repositories are written in the spellings Composer accepts.
pub const STANDARD_MANIFEST: &str = r#"{
    "name": "acme/monorepo",
    "description": "Acme components",
    "require": {
        "php": ">=8.1"
    },
    "require-dev": {
        "acme/repo1": "*",
        "phpunit/phpunit": "^9.5",
        "acme/repo2": "*",
        "symfony/var-dumper": "^6.0",
        "acme/repo3": "*"
    },
    "repositories": [
        {
            "type": "path",
            "url": "lib/repo1"
        },
        {
            "type": "path",
            "url": "./lib/repo2"
        },
        {
            "type": "path",
            "url": "lib/repo3/"
        },
        {
            "type": "path",
            "url": "tools/helper"
        },
        {
            "type": "vcs",
            "url": "https://github.com/acme/fork"
        }
    ],
    "config": {
        "bin-dir": "vendor/bin"
    },
    "extra": {
        "git-split": {
            "repos": {
                "lib/repo1": "git@github.com:acme/repo1.git",
                "lib/repo2": "git@github.com:acme/repo2.git",
                "lib/repo3": "git@github.com:acme/repo3.git"
            }
        }
    }
}
"#;

/// A monorepo laid out in a temporary directory.
///
/// Dropping the fixture deletes the directory.
pub struct MonorepoFixture {
    tmp: TempDir,
}

impl MonorepoFixture {
    /// Three components under `lib/` plus a non-component `tools/helper`.
    pub fn standard() -> Self {
        let fixture = MonorepoFixture::with_manifest(STANDARD_MANIFEST);
        for n in 1..=3 {
            write_component(
                fixture.root(),
                &format!("lib/repo{}", n),
                &format!("acme/repo{}", n),
                &["php"],
            );
        }
        write_component(fixture.root(), "tools/helper", "acme/helper", &[]);
        fixture
    }

    /// A project containing only the given root manifest.
    pub fn with_manifest(contents: &str) -> Self {
        let tmp = TempDir::new().expect("failed to create temp dir");
        std::fs::write(tmp.path().join(MANIFEST_FILE), contents).expect("failed to write manifest");
        MonorepoFixture { tmp }
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root().join(MANIFEST_FILE)
    }

    /// Load the root manifest as it currently is on disk.
    pub fn manifest(&self) -> Manifest {
        Manifest::load(&self.manifest_path()).expect("failed to load fixture manifest")
    }
}

/// Write `<root>/<path>/composer.json` declaring `name` with `requires`.
pub fn write_component(root: &Path, path: &str, name: &str, requires: &[&str]) {
    let dir = root.join(path);
    std::fs::create_dir_all(dir.join("src")).expect("failed to create component dir");

    let require: serde_json::Map<String, serde_json::Value> = requires
        .iter()
        .map(|r| (r.to_string(), json!("*")))
        .collect();
    let manifest = json!({ "name": name, "require": require });
    std::fs::write(
        dir.join(MANIFEST_FILE),
        serde_json::to_string_pretty(&manifest).expect("failed to serialize component"),
    )
    .expect("failed to write component manifest");
    std::fs::write(dir.join("src/.gitkeep"), "").expect("failed to write placeholder");
}

/// Build a `.tar.gz` holding `(path, contents, mode)` entries.
pub fn tar_gz(entries: &[(&str, &[u8], u32)]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (path, contents, mode) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(*mode);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        builder
            .append_data(&mut header, path, *contents)
            .expect("failed to append tar entry");
    }

    let mut encoder = builder.into_inner().expect("failed to finish tar");
    encoder.flush().expect("failed to flush gzip stream");
    encoder.finish().expect("failed to finish gzip stream")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_fixture_layout() {
        let fixture = MonorepoFixture::standard();
        let manifest = fixture.manifest();

        assert_eq!(manifest.name(), Some("acme/monorepo"));
        assert_eq!(manifest.split_repos().unwrap().len(), 3);
        assert_eq!(manifest.repositories().len(), 5);
        for path in ["lib/repo1", "lib/repo2", "lib/repo3", "tools/helper"] {
            assert!(fixture.root().join(path).join(MANIFEST_FILE).is_file());
        }
    }

    #[test]
    fn test_tar_gz_is_readable() {
        let bytes = tar_gz(&[("dir/file", b"hello".as_slice(), 0o755)]);
        let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(bytes.as_slice()));
        let names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().display().to_string())
            .collect();
        assert_eq!(names, ["dir/file"]);
    }
}
