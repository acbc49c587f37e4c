//! model::conflict

use super::Feature;
use crate::parse::listing::ConflictRecord;
use crate::repo::Repository;

/// The three versions of a path a merge or rebase could not reconcile.
///
/// Only produced while the repository is in an interrupted state.
#[derive(Debug)]
pub struct Conflict<'r> {
    pub path: String,
    /// Common ancestor version.
    pub base: Feature<'r>,
    /// Version on the current branch.
    pub ours: Feature<'r>,
    /// Version being merged or rebased in.
    pub theirs: Feature<'r>,
}

impl<'r> Conflict<'r> {
    pub(crate) fn from_record(repo: &'r Repository, record: &ConflictRecord) -> Self {
        let version = |id: &crate::core::types::ObjectId| Feature::new(repo, id.as_str(), &record.path);
        Self {
            path: record.path.clone(),
            base: version(&record.base),
            ours: version(&record.ours),
            theirs: version(&record.theirs),
        }
    }
}
