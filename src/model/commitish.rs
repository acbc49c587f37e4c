//! model::commitish
//!
//! A lazily resolved reference.

use std::cell::OnceCell;
use std::sync::Arc;

use super::{Commit, DiffEntry, Feature, Node, Tree};
use crate::core::types::ObjectId;
use crate::error::Result;
use crate::repo::{LogQuery, Repository};

/// A symbolic name, content hash or relative expression (`master~2`).
///
/// The absolute id and the diff against the parent are fetched on first use
/// and kept for the lifetime of the handle. A handle never re-resolves, so
/// one taken before a commit keeps pointing at the old tip.
#[derive(Debug)]
pub struct Commitish<'r> {
    repo: &'r Repository,
    reference: String,
    id: OnceCell<ObjectId>,
    diff: OnceCell<Vec<DiffEntry>>,
}

impl<'r> Commitish<'r> {
    pub fn new(repo: &'r Repository, reference: impl Into<String>) -> Self {
        Self {
            repo,
            reference: reference.into(),
            id: OnceCell::new(),
            diff: OnceCell::new(),
        }
    }

    /// A handle whose id is already known.
    pub fn resolved(repo: &'r Repository, id: ObjectId) -> Self {
        let commitish = Self::new(repo, id.as_str());
        let _ = commitish.id.set(id);
        commitish
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// The absolute id, resolved once.
    pub fn id(&self) -> Result<&ObjectId> {
        if let Some(id) = self.id.get() {
            return Ok(id);
        }
        let id = self.repo.revparse(&self.reference)?;
        Ok(self.id.get_or_init(|| id))
    }

    /// The commit this reference points at.
    pub fn commit(&self) -> Result<Commit> {
        self.repo.find_commit_by_id(self.id()?)
    }

    /// The first-parent ancestor (`ref~1`).
    pub fn parent(&self) -> Commitish<'r> {
        Commitish::new(self.repo, format!("{}~1", self.reference))
    }

    /// Changes between the parent and this reference, fetched once.
    pub fn diff(&self) -> Result<&[DiffEntry]> {
        if let Some(diff) = self.diff.get() {
            return Ok(diff);
        }
        let parent = self.parent();
        let diff = self.repo.diff(parent.reference(), &self.reference, None)?;
        Ok(self.diff.get_or_init(|| diff))
    }

    /// History reachable from this reference.
    pub fn log(&self) -> Result<Arc<Vec<Commit>>> {
        self.repo.log(&LogQuery::new().tip(&self.reference))
    }

    pub fn tree(&self, path: &str) -> Tree<'r> {
        Tree::new(self.repo, &self.reference, path, None)
    }

    pub fn feature(&self, path: &str) -> Feature<'r> {
        Feature::new(self.repo, &self.reference, path)
    }

    pub fn children(&self, path: &str) -> Result<Vec<Node<'r>>> {
        self.repo.children(&self.reference, path, false)
    }

    pub fn trees(&self, path: &str) -> Result<Vec<Tree<'r>>> {
        self.repo.trees(&self.reference, path, false)
    }

    pub fn features(&self, path: &str) -> Result<Vec<Feature<'r>>> {
        self.repo.features(&self.reference, path, false)
    }

    /// Check this reference out into the working tree.
    pub fn checkout(&self) -> Result<()> {
        self.repo.checkout(&self.reference, &[], false)
    }
}

impl AsRef<str> for Commitish<'_> {
    fn as_ref(&self) -> &str {
        &self.reference
    }
}

impl std::fmt::Display for Commitish<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reference)
    }
}
