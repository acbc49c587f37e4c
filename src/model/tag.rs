//! model::tag

use std::cell::OnceCell;

use super::Commit;
use crate::core::types::ObjectId;
use crate::error::Result;
use crate::parse::{object_id, ParseError};
use crate::repo::Repository;

/// A named, immutable pointer to a commit.
///
/// The tag object is read on the first call to [`commit`](Self::commit).
#[derive(Debug, Clone)]
pub struct Tag {
    name: String,
    id: ObjectId,
    commit: OnceCell<Commit>,
}

impl Tag {
    pub fn new(name: impl Into<String>, id: ObjectId) -> Self {
        Self {
            name: name.into(),
            id,
            commit: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of the tag object itself.
    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    /// The tagged commit. The fourth line of the tag object ends with the
    /// commit id.
    pub fn commit(&self, repo: &Repository) -> Result<&Commit> {
        if let Some(commit) = self.commit.get() {
            return Ok(commit);
        }
        let lines = repo.cat_lines(self.id.as_str())?;
        let line = lines.get(3).ok_or(ParseError::Truncated { what: "tag" })?;
        let start = line.len().saturating_sub(ObjectId::LEN);
        let id = object_id("tag", line.get(start..).unwrap_or(line))?;
        let commit = repo.find_commit_by_id(&id)?;
        Ok(self.commit.get_or_init(|| commit))
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.id)
    }
}
