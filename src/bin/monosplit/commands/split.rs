//! `monosplit split` command

use std::sync::Arc;

use anyhow::Result;

use super::{install_options, project_root};
use crate::cli::SplitArgs;
use monosplit::ops::{split_all, SplitOptions};
use monosplit::util::shell::{Shell, Status};
use monosplit::util::{GlobalContext, HttpDownloader, SystemRunner};

pub fn execute(_args: SplitArgs, ctx: &GlobalContext, shell: &Arc<Shell>) -> Result<()> {
    let manifest = ctx.load_manifest()?;
    let config = ctx.load_config(manifest.root());

    let opts = SplitOptions {
        project_root: project_root(&manifest),
        install: install_options(ctx, &manifest, &config),
    };

    let mut downloader = HttpDownloader::new(Arc::clone(shell));
    let mut runner = SystemRunner::for_shell(shell);
    let report = split_all(&manifest, &opts, &mut runner, &mut downloader, shell)?;

    shell.status(
        Status::Finished,
        format!(
            "{} component(s) pushed to {}",
            report.targets.len(),
            report.target_ref
        ),
    );

    Ok(())
}
