//! Test utilities and mocks for monosplit unit tests.
//!
//! Provides scripted implementations of the capabilities operations receive
//! (process execution, HTTP downloads, package sources) plus fixtures that
//! lay out a small monorepo on disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use monosplit::test_support::{MockProcessOutput, MockRunner, MonorepoFixture};
//!
//! #[test]
//! fn test_example() {
//!     let fixture = MonorepoFixture::standard();
//!
//!     let mut runner = MockRunner::new();
//!     runner.expect("git rev-parse --symbolic-full-name --abbrev-ref HEAD",
//!         MockProcessOutput::success("main\n"));
//!
//!     // Hand `fixture.manifest()` and `&mut runner` to an operation...
//! }
//! ```

pub mod fixtures;

use std::collections::{BTreeMap, HashMap};
use std::io::Write;

use anyhow::{bail, Result};

use crate::sources::{ComponentPackage, PackageSource};
use crate::util::download::Downloader;
use crate::util::fs::normalize_rel;
use crate::util::process::{CommandRunner, ProcessBuilder, ProcessOutput};

pub use fixtures::*;

/// Mock process output for testing command execution.
#[derive(Debug, Clone)]
pub struct MockProcessOutput {
    /// Exit status code (0 = success).
    pub status: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl MockProcessOutput {
    /// Create a successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Create a failure output with the given stderr and status code.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

impl Default for MockProcessOutput {
    fn default() -> Self {
        MockProcessOutput::success("")
    }
}

impl From<MockProcessOutput> for ProcessOutput {
    fn from(mock: MockProcessOutput) -> Self {
        ProcessOutput {
            code: Some(mock.status),
            stdout: mock.stdout,
            stderr: mock.stderr,
        }
    }
}

/// Pattern for matching commands in MockRunner.
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command starts with prefix.
    StartsWith(String),
    /// Match if command contains substring.
    Contains(String),
}

impl CommandPattern {
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s),
        }
    }
}

/// Scripted [`CommandRunner`].
///
/// Commands are matched by their displayed form (`program arg arg...`).
/// Expectations are checked in the order they were added; unmatched
/// commands get the default output, or fail when none is set.
#[derive(Debug, Default)]
pub struct MockRunner {
    expectations: Vec<(CommandPattern, MockProcessOutput)>,
    calls: Vec<String>,
    default_output: Option<MockProcessOutput>,
}

impl MockRunner {
    pub fn new() -> Self {
        MockRunner::default()
    }

    /// Add an expectation for an exact command match.
    pub fn expect(&mut self, cmd: &str, output: MockProcessOutput) -> &mut Self {
        self.expectations
            .push((CommandPattern::Exact(cmd.to_string()), output));
        self
    }

    /// Add an expectation for a command starting with a prefix.
    pub fn expect_prefix(&mut self, prefix: &str, output: MockProcessOutput) -> &mut Self {
        self.expectations
            .push((CommandPattern::StartsWith(prefix.to_string()), output));
        self
    }

    /// Add an expectation for a command containing a substring.
    pub fn expect_contains(&mut self, substring: &str, output: MockProcessOutput) -> &mut Self {
        self.expectations
            .push((CommandPattern::Contains(substring.to_string()), output));
        self
    }

    /// Set a default output for commands that don't match any expectation.
    pub fn set_default(&mut self, output: MockProcessOutput) -> &mut Self {
        self.default_output = Some(output);
        self
    }

    /// Get all commands that were run, in order.
    pub fn calls(&self) -> &[String] {
        &self.calls
    }
}

impl CommandRunner for MockRunner {
    fn run(&mut self, cmd: &ProcessBuilder) -> Result<ProcessOutput> {
        let full_cmd = cmd.display_command();
        self.calls.push(full_cmd.clone());

        for (pattern, output) in &self.expectations {
            if pattern.matches(&full_cmd) {
                return Ok(output.clone().into());
            }
        }

        if let Some(ref default) = self.default_output {
            return Ok(default.clone().into());
        }

        bail!("unexpected command: {}", full_cmd)
    }
}

/// Mock HTTP response for testing downloads.
#[derive(Debug, Clone)]
pub struct MockHttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl MockHttpResponse {
    /// Create a successful response with the given body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        MockHttpResponse {
            status: 200,
            body: body.into(),
        }
    }

    /// Create a not found response.
    pub fn not_found() -> Self {
        MockHttpResponse {
            status: 404,
            body: b"Not Found".to_vec(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Scripted [`Downloader`] keyed by URL.
#[derive(Debug, Default)]
pub struct MockDownloader {
    responses: HashMap<String, MockHttpResponse>,
    requests: Vec<String>,
}

impl MockDownloader {
    pub fn new() -> Self {
        MockDownloader::default()
    }

    /// Add a response for a URL.
    pub fn mock_url(&mut self, url: &str, response: MockHttpResponse) -> &mut Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    /// Get all requested URLs.
    pub fn requests(&self) -> &[String] {
        &self.requests
    }
}

impl Downloader for MockDownloader {
    fn download(&mut self, url: &str, dest: &mut dyn Write) -> Result<u64> {
        self.requests.push(url.to_string());

        let Some(response) = self.responses.get(url) else {
            bail!("no mock response for URL: {}", url);
        };
        if !response.is_success() {
            bail!("HTTP error {}: {}", response.status, url);
        }
        dest.write_all(&response.body)?;
        Ok(response.body.len() as u64)
    }
}

/// In-memory [`PackageSource`] mapping paths to declared packages.
#[derive(Debug, Default)]
pub struct StaticSource {
    packages: BTreeMap<String, Vec<ComponentPackage>>,
}

impl StaticSource {
    pub fn new() -> Self {
        StaticSource::default()
    }

    /// Declare the packages found at `path`.
    pub fn with(mut self, path: &str, packages: Vec<ComponentPackage>) -> Self {
        self.packages.insert(normalize_rel(path), packages);
        self
    }
}

impl PackageSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    fn packages(&mut self, path: &str) -> Result<Vec<ComponentPackage>> {
        match self.packages.get(&normalize_rel(path)) {
            Some(packages) => Ok(packages.clone()),
            None => bail!("no package definition at `{}`", path),
        }
    }
}
