//! engine
//!
//! Versioning operations that can leave a repository interrupted.
//!
//! # State machine
//!
//! ```text
//! Clean --merge/rebase/cherry-pick/pull ok--> Clean
//! Clean --... reports conflicts-------------> Merging | Rebasing
//! Merging | Rebasing --abort----------------> Clean
//! Rebasing --continue, conflicts remain-----> Rebasing (RebaseIncomplete)
//! Merging | Rebasing --resolve, add, commit or continue--> Clean
//! ```
//!
//! State is never tracked in memory. [`RepoState::detect`] reads the
//! engine's marker files each time, so a repository changed by another
//! process is reported correctly.
//!
//! # Conflict detection
//!
//! The engine has no structured conflict status, so a failed command whose
//! output mentions "conflict" (any case) is reported as
//! [`Error::Conflict`](crate::Error::Conflict). Every branch-moving command
//! drops the log cache before returning, conflict or not.
//!
//! # Example
//!
//! ```ignore
//! use geogig_porcelain::core::types::ConflictSide;
//!
//! if let Err(e) = repo.merge("topic", false, None) {
//!     if !e.is_interrupted_operation() {
//!         return Err(e);
//!     }
//!     let paths: Vec<String> = repo.conflicts()?.into_iter().map(|c| c.path).collect();
//!     let paths: Vec<&str> = paths.iter().map(String::as_str).collect();
//!     repo.solve_conflicts(&paths, ConflictSide::Ours)?;
//!     repo.commit(&repo.merge_message()?, &[])?;
//! }
//! ```

pub mod ops;
pub mod state;

pub use state::RepoState;
