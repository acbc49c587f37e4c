//! cli
//!
//! Command-line interface layer for `ggp`.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the log subscriber
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! [`crate::repo::Repository`] methods. Nothing here talks to the engine
//! directly.

pub mod args;
pub mod commands;

pub use args::Cli;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::repo::{Repository, CONTROL_DIR};
use crate::ui::output::Verbosity;

/// Execution context shared by every command handler.
#[derive(Debug, Clone)]
pub struct Context {
    /// Directory given with `--cwd`, if any.
    pub cwd: Option<PathBuf>,
    pub verbosity: Verbosity,
    /// Print listings as JSON.
    pub json: bool,
}

impl Context {
    /// The directory commands run in.
    pub fn workdir(&self) -> Result<PathBuf> {
        match &self.cwd {
            Some(cwd) => Ok(cwd.clone()),
            None => std::env::current_dir().context("Failed to read the current directory"),
        }
    }

    /// Open the repository containing the working directory.
    pub fn open_repo(&self) -> Result<Repository> {
        let start = self.workdir()?;
        let root = discover(&start).unwrap_or(start);
        Repository::open(&root).with_context(|| format!("Failed to open repository at {}", root.display()))
    }
}

/// Nearest ancestor of `start` (inclusive) holding a repository.
pub fn discover(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONTROL_DIR).is_dir())
        .map(Path::to_path_buf)
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);
    // Another subscriber may already be installed by an embedding program.
    let _ = tracing_subscriber::fmt()
        .with_max_level(verbosity.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    let ctx = Context {
        cwd: cli.cwd.clone(),
        verbosity,
        json: cli.json,
    };

    commands::dispatch(cli.command, &ctx)
}
