//! Monosplit CLI - test and publish the components of a PHP monorepo

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands, MessageFormat};
use monosplit::exit_code_for;
use monosplit::util::shell::Shell;
use monosplit::util::GlobalContext;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(exit_code_for(&e));
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("monosplit=debug")
    } else {
        EnvFilter::new("monosplit=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let shell = Arc::new(Shell::from_flags(
        cli.quiet,
        cli.verbose,
        cli.color,
        cli.message_format == MessageFormat::Json,
    ));

    let manifest = cli.manifest;
    let context = move || GlobalContext::new().map(|ctx| ctx.with_manifest(manifest));

    match cli.command {
        Commands::Test(args) => commands::test::execute(args, &context()?, &shell),
        Commands::Split(args) => commands::split::execute(args, &context()?, &shell),
        Commands::Components(args) => commands::components::execute(args, &context()?, &shell),
        Commands::InstallBin(args) => commands::install_bin::execute(args, &context()?, &shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
