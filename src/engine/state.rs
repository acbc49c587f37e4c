//! engine::state
//!
//! Interrupted-operation detection from the engine's marker files.

use std::fs;
use std::path::Path;

/// Marker holding the head before a merge or rebase started.
pub const ORIG_HEAD: &str = "ORIG_HEAD";
/// Marker holding the commit being merged in.
pub const MERGE_HEAD: &str = "MERGE_HEAD";
/// Pending merge commit message.
pub const MERGE_MSG: &str = "MERGE_MSG";
/// Directory present while a rebase is stopped.
pub const REBASE_DIR: &str = "rebase-apply";
/// File under [`REBASE_DIR`] naming the branch being rebased.
pub const REBASE_BRANCH: &str = "branch";
/// File listing conflicted paths; empty or missing when there are none.
pub const CONFLICTS: &str = "conflicts";

/// Whether a merge or rebase is waiting for the user.
///
/// Read from the control directory every time it is asked for; the handle
/// keeps no copy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RepoState {
    /// No operation in progress.
    #[default]
    Clean,

    /// A merge stopped on conflicts.
    Merging,

    /// A rebase stopped on conflicts.
    Rebasing {
        /// Branch being rebased, if the engine recorded it.
        branch: Option<String>,
    },
}

impl RepoState {
    /// Inspect the markers under `control_dir`.
    ///
    /// A rebase takes precedence when both sets of markers are present.
    pub fn detect(control_dir: &Path) -> Self {
        if !control_dir.join(ORIG_HEAD).exists() {
            return RepoState::Clean;
        }
        let branch_file = control_dir.join(REBASE_DIR).join(REBASE_BRANCH);
        if branch_file.exists() {
            let branch = fs::read_to_string(&branch_file)
                .ok()
                .map(|s| s.trim().trim_start_matches("refs/heads/").to_string())
                .filter(|s| !s.is_empty());
            return RepoState::Rebasing { branch };
        }
        if control_dir.join(MERGE_HEAD).exists() {
            return RepoState::Merging;
        }
        RepoState::Clean
    }

    /// Check if any operation is in progress.
    ///
    /// ```
    /// use geogig_porcelain::engine::RepoState;
    ///
    /// assert!(!RepoState::Clean.is_in_progress());
    /// assert!(RepoState::Merging.is_in_progress());
    /// ```
    pub fn is_in_progress(&self) -> bool {
        !matches!(self, RepoState::Clean)
    }

    pub fn description(&self) -> &'static str {
        match self {
            RepoState::Clean => "clean",
            RepoState::Merging => "merge",
            RepoState::Rebasing { .. } => "rebase",
        }
    }
}

impl std::fmt::Display for RepoState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepoState::Rebasing { branch: Some(b) } => write!(f, "rebase ({b})"),
            _ => write!(f, "{}", self.description()),
        }
    }
}
