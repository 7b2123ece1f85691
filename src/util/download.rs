//! HTTP downloads.

use std::io::{Read, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::util::shell::Shell;

/// Capability to fetch a URL into a writer.
pub trait Downloader {
    /// Stream the body of `url` into `dest`, returning the number of bytes written.
    fn download(&mut self, url: &str, dest: &mut dyn Write) -> Result<u64>;
}

/// Blocking reqwest client with a byte progress bar.
pub struct HttpDownloader {
    shell: Arc<Shell>,
}

impl HttpDownloader {
    pub fn new(shell: Arc<Shell>) -> Self {
        HttpDownloader { shell }
    }
}

impl Downloader for HttpDownloader {
    fn download(&mut self, url: &str, dest: &mut dyn Write) -> Result<u64> {
        tracing::debug!("GET {}", url);
        let mut response = reqwest::blocking::get(url)
            .with_context(|| format!("failed to download {}", url))?;

        if !response.status().is_success() {
            bail!("failed to download {}: HTTP {}", url, response.status());
        }

        let mut progress = self.shell.bytes_progress("Downloading", response.content_length());
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = response
                .read(&mut buf)
                .with_context(|| format!("failed to read response body from {}", url))?;
            if n == 0 {
                break;
            }
            dest.write_all(&buf[..n])
                .context("failed to write downloaded data")?;
            progress.inc(n as u64);
        }
        progress.finish();

        Ok(progress.position())
    }
}
