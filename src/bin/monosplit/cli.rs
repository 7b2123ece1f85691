//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use monosplit::util::shell::ColorChoice;

/// Monosplit - run a PHP monorepo's tests per component and publish each
/// component to its own repository
#[derive(Parser)]
#[command(name = "monosplit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Print nothing but errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    /// Output format for progress events
    #[arg(long, global = true, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,

    /// Path to composer.json (defaults to searching upward from the current directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the test suite, optionally pruned to the given components
    Test(TestArgs),

    /// Split every configured component and force-push it to its remote
    Split(SplitArgs),

    /// List the components declared in extra.git-split
    Components(ComponentsArgs),

    /// Install the subtree splitter into the Composer bin dir
    InstallBin(InstallBinArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct TestArgs {
    /// Component package names to keep; every other component is removed.
    /// Without names, the full suite runs untouched.
    pub packages: Vec<String>,
}

#[derive(Args)]
pub struct SplitArgs {}

#[derive(Args)]
pub struct ComponentsArgs {}

#[derive(Args)]
pub struct InstallBinArgs {}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
