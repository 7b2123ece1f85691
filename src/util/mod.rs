//! Shared utilities

pub mod config;
pub mod context;
pub mod download;
pub mod fs;
pub mod hash;
pub mod platform;
pub mod process;
pub mod shell;

pub use config::Config;
pub use context::GlobalContext;
pub use download::{Downloader, HttpDownloader};
pub use process::{CommandRunner, ProcessBuilder, ProcessOutput, SystemRunner};
pub use shell::Shell;
