//! `monosplit components` command
//!
//! Lists the component registry without touching anything.

use std::sync::Arc;

use anyhow::Result;

use crate::cli::ComponentsArgs;
use monosplit::ops::component_registry;
use monosplit::sources::PathSource;
use monosplit::util::shell::Shell;
use monosplit::util::GlobalContext;

pub fn execute(_args: ComponentsArgs, ctx: &GlobalContext, shell: &Arc<Shell>) -> Result<()> {
    let manifest = ctx.load_manifest()?;
    let registry = component_registry(&manifest, &mut PathSource::new(manifest.root()))?;

    if shell.is_json() {
        for component in registry.components() {
            shell.json_event(&serde_json::json!({
                "reason": "component",
                "name": component.name,
                "path": component.path,
                "remote": component.remote,
            }));
        }
        return Ok(());
    }

    let width = registry
        .components()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(0);
    for component in registry.components() {
        println!(
            "{:<width$}  {}  {}",
            component.name,
            component.path,
            component.remote,
            width = width
        );
    }

    Ok(())
}
