//! Repo splitter.
//!
//! For every `extra.git-split.repos` entry, extracts the subtree history of
//! the path into `refs/splits/<path>` with splitsh-lite and force-pushes it
//! to the path's remote under the branch or tag currently checked out.
//!
//! The first failing command aborts the whole batch. Remotes already pushed
//! stay pushed; re-running is the recovery path, and force-push makes every
//! target idempotent.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::core::manifest::Manifest;
use crate::core::split_target::{SplitState, SplitTarget, TargetRef};
use crate::ops::install_bin::{install_bin, InstallOptions, InstalledBinary};
use crate::util::download::Downloader;
use crate::util::process::{run_checked, CommandRunner, ProcessBuilder};
use crate::util::shell::{Shell, Status};

/// Options for [`split_all`].
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Project root; git commands run here
    pub project_root: PathBuf,

    /// How to find or install splitsh-lite
    pub install: InstallOptions,
}

/// Final state of one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOutcome {
    pub target: SplitTarget,
    pub state: SplitState,
}

/// Outcome of a successful [`split_all`].
#[derive(Debug, Clone)]
pub struct SplitReport {
    pub binary: InstalledBinary,

    /// Output of `git rev-parse --abbrev-ref HEAD`, trimmed
    pub current_ref: String,

    pub target_ref: TargetRef,

    pub targets: Vec<SplitOutcome>,
}

/// Read the split targets from the manifest, in declaration order.
pub fn split_targets(manifest: &Manifest) -> Result<Vec<SplitTarget>> {
    let repos = manifest.split_repos()?;
    Ok(repos
        .into_iter()
        .map(|(path, remote)| SplitTarget::new(path, remote))
        .collect())
}

/// Name of the currently checked-out branch (or CI tag branch).
pub fn current_ref(runner: &mut dyn CommandRunner, opts: &SplitOptions) -> Result<String> {
    let cmd = ProcessBuilder::new("git")
        .args(["rev-parse", "--symbolic-full-name", "--abbrev-ref", "HEAD"])
        .cwd(&opts.project_root)
        .capture();
    let output = run_checked(runner, &cmd)?;
    Ok(output.stdout.trim().to_string())
}

/// Split every configured path and push it to its remote.
pub fn split_all(
    manifest: &Manifest,
    opts: &SplitOptions,
    runner: &mut dyn CommandRunner,
    downloader: &mut dyn Downloader,
    shell: &Arc<Shell>,
) -> Result<SplitReport> {
    let targets = split_targets(manifest)?;

    let binary = install_bin(&opts.install, downloader, shell)?;

    let current = current_ref(runner, opts)?;
    let target_ref = TargetRef::from_current_ref(&current);
    tracing::debug!("current ref {} -> pushing to {}", current, target_ref);

    let mut outcomes: Vec<SplitOutcome> = targets
        .into_iter()
        .map(|target| SplitOutcome {
            target,
            state: SplitState::Pending,
        })
        .collect();

    for index in 0..outcomes.len() {
        if let Err(err) = split_one(
            &mut outcomes[index],
            &binary,
            &current,
            &target_ref,
            opts,
            runner,
            shell,
        ) {
            outcomes[index].state = SplitState::Aborted;
            for outcome in &outcomes {
                tracing::info!("{}: {}", outcome.target.path, outcome.state);
                emit_event(shell, outcome);
            }
            return Err(err);
        }
        emit_event(shell, &outcomes[index]);
    }

    Ok(SplitReport {
        binary,
        current_ref: current,
        target_ref,
        targets: outcomes,
    })
}

fn split_one(
    outcome: &mut SplitOutcome,
    binary: &InstalledBinary,
    current: &str,
    target_ref: &TargetRef,
    opts: &SplitOptions,
    runner: &mut dyn CommandRunner,
    shell: &Arc<Shell>,
) -> Result<()> {
    let root = &opts.project_root;
    let target = &outcome.target;
    let span = shell.span(
        Status::Splitting,
        format!(
            "{} for Git reference {} to {}",
            target.path, current, target.remote
        ),
    );

    let split = ProcessBuilder::new(&binary.path)
        .arg(format!("--prefix={}", target.prefix()))
        .arg(format!("--target={}", target.local_ref()))
        .cwd(root);
    shell.command(split.display_relative(root));
    run_checked(runner, &split)?;
    outcome.state = SplitState::Extracted;

    let target = &outcome.target;
    let push = ProcessBuilder::new("git")
        .args(["push", "--force"])
        .arg(&target.remote)
        .arg(target.refspec(target_ref))
        .cwd(root);
    shell.command(push.display_relative(root));
    run_checked(runner, &push)?;
    outcome.state = SplitState::Pushed;

    span.finish_with_message(Status::Pushed, format!("{} to {}", target_ref, target.remote));
    Ok(())
}

fn emit_event(shell: &Shell, outcome: &SplitOutcome) {
    shell.json_event(&serde_json::json!({
        "reason": "split-target",
        "path": outcome.target.path,
        "remote": outcome.target.remote,
        "state": outcome.state.as_str(),
    }));
}
