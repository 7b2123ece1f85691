//! Installation of the splitsh-lite binary into the Composer bin dir.
//!
//! An executable already in place is reused as-is (no version check). A file
//! that is present but not executable is deleted and fetched again.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use tar::Archive;

use crate::core::errors::MonosplitError;
use crate::util::download::Downloader;
use crate::util::fs::{ensure_dir, is_executable, move_file, relative_path, set_mode};
use crate::util::hash::verify_sha256;
use crate::util::platform::{ArchiveFormat, DownloadTable, Platform};
use crate::util::shell::{Shell, Status};

/// Options for installing the subtree splitter.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Directory the binary lives in
    pub bin_dir: PathBuf,

    /// File name of the binary
    pub binary_name: String,

    /// Host OS identifier, e.g. `std::env::consts::OS`
    pub os: String,

    /// Platform download descriptors
    pub downloads: DownloadTable,

    /// Project root, used to shorten displayed paths
    pub project_root: PathBuf,
}

/// Result of [`install_bin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledBinary {
    pub path: PathBuf,

    /// Whether the binary was downloaded by this call
    pub freshly_installed: bool,
}

/// Ensure the binary is present and executable, downloading it if needed.
pub fn install_bin(
    opts: &InstallOptions,
    downloader: &mut dyn Downloader,
    shell: &Shell,
) -> Result<InstalledBinary> {
    ensure_dir(&opts.bin_dir)?;

    let bin_path = opts.bin_dir.join(&opts.binary_name);
    let display_path = relative_path(&opts.project_root, &bin_path);

    if bin_path.exists() {
        if is_executable(&bin_path) {
            shell.note(format!(
                "{} already installed at {}",
                opts.binary_name,
                display_path.display()
            ));
            return Ok(InstalledBinary {
                path: bin_path,
                freshly_installed: false,
            });
        }

        shell.status(
            Status::Warning,
            format!("{} is not executable, downloading it again", display_path.display()),
        );
        std::fs::remove_file(&bin_path)
            .with_context(|| format!("failed to remove {}", bin_path.display()))?;
    }

    let platform = Platform::from_os(&opts.os).map_err(|_| MonosplitError::UnsupportedPlatform {
        binary: opts.binary_name.clone(),
        os: opts.os.clone(),
    })?;
    let descriptor = opts.downloads.resolve(platform, &opts.binary_name)?;

    let tmp = tempfile::tempdir().context("failed to create temporary directory")?;
    let archive_path = tmp.path().join(format!("{}.tar.gz", opts.binary_name));

    shell.status(Status::Fetching, &descriptor.url);
    {
        let file = File::create(&archive_path)
            .with_context(|| format!("failed to create {}", archive_path.display()))?;
        let mut writer = BufWriter::new(file);
        downloader.download(&descriptor.url, &mut writer)?;
        writer
            .flush()
            .with_context(|| format!("failed to write {}", archive_path.display()))?;
    }

    if let Some(ref expected) = descriptor.sha256 {
        verify_sha256(&archive_path, expected)?;
    }

    shell.status(Status::Unpacking, archive_path.display());
    let unpacked = match descriptor.format {
        ArchiveFormat::TarGz => extract_binary(&archive_path, &opts.binary_name, tmp.path())?,
    };

    move_file(&unpacked, &bin_path)?;
    set_mode(&bin_path, 0o755)
        .with_context(|| format!("failed to set permissions for {}", bin_path.display()))?;

    if !is_executable(&bin_path) {
        return Err(MonosplitError::BinaryNotExecutable { path: bin_path }.into());
    }

    shell.status(
        Status::Installed,
        format!("{} to {}", descriptor.url, display_path.display()),
    );

    Ok(InstalledBinary {
        path: bin_path,
        freshly_installed: true,
    })
}

/// Extract the entry named `binary_name` from a `.tar.gz` into `dest_dir`.
///
/// The entry may sit in a subdirectory of the archive.
pub fn extract_binary(archive_path: &Path, binary_name: &str, dest_dir: &Path) -> Result<PathBuf> {
    let file = File::open(archive_path)
        .with_context(|| format!("failed to open {}", archive_path.display()))?;
    let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));

    for entry in archive
        .entries()
        .with_context(|| format!("failed to read archive {}", archive_path.display()))?
    {
        let mut entry = entry.context("failed to read archive entry")?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let is_binary = entry
            .path()
            .context("failed to get entry path")?
            .file_name()
            .map(|name| name == binary_name)
            .unwrap_or(false);
        if !is_binary {
            continue;
        }

        let output = dest_dir.join(binary_name);
        entry
            .unpack(&output)
            .with_context(|| format!("failed to extract {}", output.display()))?;
        return Ok(output);
    }

    bail!(
        "archive {} does not contain `{}`",
        archive_path.display(),
        binary_name
    )
}
