//! error
//!
//! Error taxonomy for repository operations.
//!
//! Every variant is a local, recoverable condition. Variants that stem from
//! an engine call keep the captured engine output verbatim; use
//! [`Error::output`] to get at it regardless of the variant.
//!
//! # Example
//!
//! ```no_run
//! # use geogig_porcelain::{Repository, Result};
//! # fn main() -> Result<()> {
//! let repo = Repository::open("/data/parks")?;
//! match repo.merge("feature", false, None) {
//!     Ok(()) => {}
//!     Err(e) if e.is_interrupted_operation() => {
//!         for conflict in repo.conflicts()? {
//!             println!("conflicted: {}", conflict.path);
//!         }
//!     }
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::core::config::ConfigError;
use crate::parse::ParseError;
use crate::transport::TransportError;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The engine exited with a failure status.
    #[error("engine command '{command}' failed{}", last_line(.output))]
    Engine {
        /// The command line that was run
        command: String,
        /// Captured engine output
        output: Vec<String>,
    },

    /// A merge, rebase, cherry-pick or pull stopped on conflicting changes.
    ///
    /// The repository is now in an interrupted state; inspect it with
    /// `conflicts()`, then resolve and continue, or abort.
    #[error("operation stopped with conflicts{}", last_line(.output))]
    Conflict { output: Vec<String> },

    /// Commit failed because no author name or email is configured.
    #[error("author identity is not configured (set user.name and user.email)")]
    UnconfiguredIdentity { output: Vec<String> },

    /// A reference or date could not be resolved to a commit.
    #[error("cannot resolve '{reference}'")]
    ReferenceResolution {
        reference: String,
        output: Vec<String>,
    },

    /// The location has no repository control directory.
    #[error("not a repository: {}", .path.display())]
    NotARepository { path: PathBuf },

    /// Init was asked to create a repository where one already exists.
    #[error("a repository already exists at {}", .path.display())]
    AlreadyARepository { path: PathBuf },

    /// Feature data lookup came back empty.
    #[error("feature not found: {reference}")]
    FeatureNotFound { reference: String },

    /// The feature has no geometry-typed attribute.
    #[error("feature '{reference}' has no geometry attribute")]
    NoGeometry { reference: String },

    /// `continue` returned but the rebase is still in progress.
    #[error("rebase is still in progress; resolve the remaining conflicts and continue again")]
    RebaseIncomplete,

    /// The operation needs a branch but HEAD is detached.
    #[error("HEAD is detached; check out a branch first")]
    DetachedHead,

    /// The engine could not be reached at all.
    #[error("engine transport failed: {message}")]
    Transport { message: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The engine answered with output in an unrecognized layout.
    #[error("unexpected engine output: {0}")]
    UnexpectedOutput(#[from] ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result alias for repository operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build an error from a transport failure for the given command.
    pub(crate) fn from_transport(args: &[String], err: TransportError) -> Self {
        match err {
            TransportError::Engine { output, .. } => Error::Engine {
                command: crate::transport::redact(args),
                output,
            },
            other => Error::Transport {
                message: other.to_string(),
            },
        }
    }

    /// Captured engine output carried by this error; empty when none.
    pub fn output(&self) -> &[String] {
        match self {
            Error::Engine { output, .. }
            | Error::Conflict { output }
            | Error::UnconfiguredIdentity { output }
            | Error::ReferenceResolution { output, .. } => output,
            _ => &[],
        }
    }

    /// True when the repository was left mid-merge or mid-rebase.
    pub fn is_interrupted_operation(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    /// True if any captured output line contains `needle`.
    pub(crate) fn output_contains(&self, needle: &str) -> bool {
        self.output().iter().any(|line| line.contains(needle))
    }
}

fn last_line(output: &[String]) -> String {
    output
        .iter()
        .rev()
        .find(|l| !l.trim().is_empty())
        .map(|l| format!(": {}", l.trim()))
        .unwrap_or_default()
}
