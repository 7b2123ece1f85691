//! `monosplit install-bin` command

use std::sync::Arc;

use anyhow::Result;

use super::install_options;
use crate::cli::InstallBinArgs;
use monosplit::ops::install_bin;
use monosplit::util::shell::Shell;
use monosplit::util::{GlobalContext, HttpDownloader};

pub fn execute(_args: InstallBinArgs, ctx: &GlobalContext, shell: &Arc<Shell>) -> Result<()> {
    let manifest = ctx.load_manifest()?;
    let config = ctx.load_config(manifest.root());
    let opts = install_options(ctx, &manifest, &config);

    let mut downloader = HttpDownloader::new(Arc::clone(shell));
    let installed = install_bin(&opts, &mut downloader, shell)?;

    if shell.is_json() {
        shell.json_event(&serde_json::json!({
            "reason": "binary-installed",
            "path": installed.path,
            "fresh": installed.freshly_installed,
        }));
    } else {
        println!("{}", installed.path.display());
    }

    Ok(())
}
