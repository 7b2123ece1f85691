//! Subprocess execution utilities.
//!
//! Every external tool (git, composer, the test suite, splitsh-lite) is
//! described by a [`ProcessBuilder`] and executed through a [`CommandRunner`],
//! so operations can be exercised against a scripted runner in tests.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

use crate::core::errors::MonosplitError;
use crate::util::shell::Shell;

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    capture: bool,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    ///
    /// Output is inherited from the parent by default; call [`capture`](Self::capture)
    /// when the caller needs to read stdout.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
            capture: false,
        }
    }

    /// Build a process from a `[program, args...]` list, as stored in config.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(ProcessBuilder::new(program).args(args))
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Capture stdout/stderr instead of passing them through.
    pub fn capture(mut self) -> Self {
        self.capture = true;
        self
    }

    /// Whether output is captured.
    pub fn is_captured(&self) -> bool {
        self.capture
    }

    /// Build the Command.
    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }

    /// Display the command with `root` shortened to `.`.
    pub fn display_relative(&self, root: &Path) -> String {
        let root = root.display().to_string();
        if root.is_empty() {
            return self.display_command();
        }
        self.display_command().replace(&root, ".")
    }

    fn spawn_context(&self) -> String {
        let program = self.program.display();
        let bare = self.program.components().count() == 1;
        if bare && find_executable(&self.program.to_string_lossy()).is_none() {
            format!("failed to execute `{}`: not found in PATH", program)
        } else {
            format!("failed to execute `{}`", program)
        }
    }
}

/// Result of running an external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    /// Captured stdout (empty when output was passed through).
    pub stdout: String,
    /// Captured stderr (empty when output was passed through).
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the process exited with status 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code to propagate; signals map to 1.
    pub fn exit_code(&self) -> i32 {
        self.code.unwrap_or(1)
    }
}

/// Capability to execute external commands.
///
/// Implementations block until the command finishes. The exit code is the
/// only signal the callers look at.
pub trait CommandRunner {
    /// Run the command and return its exit code and captured output.
    fn run(&mut self, cmd: &ProcessBuilder) -> Result<ProcessOutput>;
}

/// Runs commands as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner {
    /// Send passed-through stdout to our stderr, keeping stdout for JSON events
    stdout_to_stderr: bool,
}

impl SystemRunner {
    pub fn new() -> Self {
        SystemRunner::default()
    }

    /// A runner whose child output cannot interleave with the shell's JSON events.
    pub fn for_shell(shell: &Shell) -> Self {
        SystemRunner {
            stdout_to_stderr: shell.is_json(),
        }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&mut self, cmd: &ProcessBuilder) -> Result<ProcessOutput> {
        tracing::debug!("running `{}`", cmd.display_command());
        let mut command = cmd.build_command();

        if cmd.is_captured() {
            command.stdout(Stdio::piped());
            command.stderr(Stdio::piped());
            let output = command
                .output()
                .with_context(|| cmd.spawn_context())?;
            Ok(ProcessOutput {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        } else {
            if self.stdout_to_stderr {
                command.stdout(io::stderr());
            }
            let status = command
                .status()
                .with_context(|| cmd.spawn_context())?;
            Ok(ProcessOutput {
                code: status.code(),
                ..ProcessOutput::default()
            })
        }
    }
}

/// Run a command and turn a non-zero exit into [`MonosplitError::ToolFailed`].
pub fn run_checked(runner: &mut dyn CommandRunner, cmd: &ProcessBuilder) -> Result<ProcessOutput> {
    let output = runner.run(cmd)?;
    if !output.success() {
        if !output.stderr.is_empty() {
            tracing::debug!("stderr of `{}`:\n{}", cmd.display_command(), output.stderr);
        }
        return Err(MonosplitError::ToolFailed {
            command: cmd.display_command(),
            code: output.exit_code(),
        }
        .into());
    }
    Ok(output)
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}
