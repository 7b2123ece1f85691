//! Typed errors for monosplit operations.
//!
//! Operations return `anyhow::Result`, but every failure the CLI needs to
//! tell apart (configuration, validation, external tool exit codes) is raised
//! as a [`MonosplitError`] so `main` can downcast it.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the test runner, the splitter and the binary installer.
#[derive(Debug, Error)]
pub enum MonosplitError {
    #[error("no repos found in composer.json 'extra.git-split' section")]
    MissingSplitConfig,

    #[error("there's no {binary} version for {os} operating system")]
    UnsupportedPlatform { binary: String, os: String },

    #[error("invalid package '{name}'")]
    InvalidPackage { name: String },

    #[error("no package found in `{}` (listed in extra.git-split.repos)", path.display())]
    NoPackagesAtPath { path: PathBuf },

    #[error("package '{name}' is declared by both `{first}` and `{second}` in extra.git-split.repos")]
    DuplicatePackage {
        name: String,
        first: String,
        second: String,
    },

    #[error("package '{name}' is not listed in composer.json require-dev")]
    NotInRequireDev { name: String },

    #[error("`{command}` failed with exit code {code}")]
    ToolFailed { command: String, code: i32 },

    #[error("`{}` exists but is not executable", path.display())]
    BinaryNotExecutable { path: PathBuf },

    #[error("malformed composer.json: {message}")]
    ManifestShape { message: String },
}

impl MonosplitError {
    /// Exit code the process should terminate with for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            MonosplitError::ToolFailed { code, .. } => *code,
            _ => 1,
        }
    }
}

/// Extract the exit code to use for an error chain.
///
/// Tool failures propagate the tool's own code; anything else exits with 1.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<MonosplitError>())
        .map(MonosplitError::exit_code)
        .unwrap_or(1)
}
