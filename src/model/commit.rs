//! model::commit
//!
//! A resolved history point.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Commitish, DiffEntry, PathStats};
use crate::core::types::ObjectId;
use crate::error::Result;
use crate::repo::Repository;

/// Who made a change, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub when: DateTime<Utc>,
}

/// A commit reconstructed from log output.
///
/// Commits are plain data; operations that need the engine take the
/// repository explicitly. A commit without parents is a root commit and
/// reports the zero id as its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    id: ObjectId,
    tree: ObjectId,
    parents: Vec<ObjectId>,
    message: String,
    author: Signature,
    committer: Signature,
}

impl Commit {
    pub fn new(
        id: ObjectId,
        tree: ObjectId,
        parents: Vec<ObjectId>,
        message: String,
        author: Signature,
        committer: Signature,
    ) -> Self {
        Self {
            id,
            tree,
            parents,
            message,
            author,
            committer,
        }
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    /// Id of the root tree.
    pub fn tree(&self) -> &ObjectId {
        &self.tree
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    /// First parent, or the zero id for a root commit.
    pub fn parent_id(&self) -> ObjectId {
        self.parents.first().cloned().unwrap_or_else(ObjectId::zero)
    }

    pub fn is_root(&self) -> bool {
        self.parents.iter().all(ObjectId::is_zero)
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// First line of the message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }

    pub fn author(&self) -> &Signature {
        &self.author
    }

    pub fn committer(&self) -> &Signature {
        &self.committer
    }

    /// The first parent as a commit; `None` for a root commit.
    pub fn parent(&self, repo: &Repository) -> Result<Option<Commit>> {
        if self.is_root() {
            return Ok(None);
        }
        repo.find_commit_by_id(&self.parent_id()).map(Some)
    }

    /// All parents as commits, in order.
    pub fn parent_commits(&self, repo: &Repository) -> Result<Vec<Commit>> {
        self.parents
            .iter()
            .filter(|p| !p.is_zero())
            .map(|p| repo.find_commit_by_id(p))
            .collect()
    }

    /// Changes introduced by this commit relative to its first parent.
    pub fn diff(&self, repo: &Repository, path: Option<&str>) -> Result<Vec<DiffEntry>> {
        repo.diff(self.parent_id().as_str(), self.id.as_str(), path)
    }

    /// Per-tree change counts relative to the first parent.
    pub fn tree_stats(&self, repo: &Repository) -> Result<Vec<PathStats>> {
        repo.tree_stats(self.parent_id().as_str(), self.id.as_str())
    }

    /// A reference to this commit, with its id already resolved.
    pub fn as_commitish<'r>(&self, repo: &'r Repository) -> Commitish<'r> {
        Commitish::resolved(repo, self.id.clone())
    }
}

impl AsRef<str> for Commit {
    fn as_ref(&self) -> &str {
        self.id.as_str()
    }
}

impl std::fmt::Display for Commit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.id.short(7), self.summary())
    }
}
