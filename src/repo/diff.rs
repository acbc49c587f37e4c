//! repo::diff
//!
//! Differences between references, at path, tree and attribute level.

use tracing::debug;

use super::Repository;
use crate::core::types;
use crate::error::{Error, Result};
use crate::model::{DiffEntry, FeatureData, FeatureDiff, FeatureType, PathStats, TreeDiff};
use crate::parse::feature::parse_describe;
use crate::parse::listing;

impl Repository {
    /// Paths changed from `old_ref` to `new_ref`, optionally restricted to
    /// `path`, in engine order.
    pub fn diff(&self, old_ref: &str, new_ref: &str, path: Option<&str>) -> Result<Vec<DiffEntry>> {
        let mut args = vec!["diff-tree", old_ref, new_ref];
        if let Some(path) = path {
            args.extend(["--", path]);
        }
        Ok(listing::parse_diff(&self.run(&args)?, old_ref, new_ref)?)
    }

    /// Added, removed and modified counts per tree.
    pub fn tree_stats(&self, old_ref: &str, new_ref: &str) -> Result<Vec<PathStats>> {
        let output = self.run(&["diff-tree", old_ref, new_ref, "--tree-stats"])?;
        Ok(listing::parse_tree_stats(&output)?)
    }

    /// Changes between the index and the last commit.
    pub fn staged(&self) -> Result<Vec<DiffEntry>> {
        self.diff(types::HEAD, types::STAGE_HEAD, None)
    }

    /// Changes between the working tree and the index.
    pub fn unstaged(&self) -> Result<Vec<DiffEntry>> {
        self.diff(types::STAGE_HEAD, types::WORK_HEAD, None)
    }

    /// Changes between the working tree and the last commit.
    pub fn not_in_database(&self) -> Result<Vec<DiffEntry>> {
        self.diff(types::HEAD, types::WORK_HEAD, None)
    }

    /// Attribute changes of the feature at `path` from `old_ref` to
    /// `new_ref`.
    ///
    /// A side where the feature cannot be read counts as absent, so an
    /// added feature reports every attribute as `(None, value)`.
    pub fn feature_diff(&self, old_ref: &str, new_ref: &str, path: &str) -> Result<FeatureDiff> {
        let old = self.optional_feature_data(old_ref, path)?;
        let new = self.optional_feature_data(new_ref, path)?;
        Ok(FeatureDiff::between(old.as_ref(), new.as_ref()))
    }

    fn optional_feature_data(&self, reference: &str, path: &str) -> Result<Option<FeatureData>> {
        match self.feature_data(reference, path) {
            Ok(data) => Ok(Some(data)),
            Err(e @ (Error::FeatureNotFound { .. } | Error::Engine { .. })) => {
                debug!(%reference, %path, error = %e, "feature absent on this side");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Describe every changed feature under the tree at `path`.
    ///
    /// Attribute values are decoded with the union of both versions'
    /// feature types; a version without the tree contributes no attributes.
    pub fn tree_diff(&self, path: &str, old_ref: &str, new_ref: &str) -> Result<TreeDiff> {
        let mut attributes = self.optional_feature_type(old_ref, path)?;
        attributes.merge(&self.optional_feature_type(new_ref, path)?);

        let output = self.run(&["diff-tree", old_ref, new_ref, "--", path, "--describe"])?;
        let features = parse_describe(&output, &attributes)?;
        Ok(TreeDiff { attributes, features })
    }

    fn optional_feature_type(&self, reference: &str, path: &str) -> Result<FeatureType> {
        match self.feature_type(reference, path) {
            Ok(ftype) => Ok(ftype),
            Err(Error::Engine { .. } | Error::UnexpectedOutput(_)) => Ok(FeatureType::default()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::Value;
    use crate::model::{AttributeDelta, ChangeKind};
    use crate::repo::{RepoSettings, CONTROL_DIR};
    use crate::transport::MockTransport;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    const OLD: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const NEW: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    const ZERO: &str = "0000000000000000000000000000000000000000";

    fn open(mock: &MockTransport) -> (TempDir, Repository) {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(CONTROL_DIR)).unwrap();
        let repo = Repository::open_with(temp.path(), Arc::new(mock.clone()), RepoSettings::default()).unwrap();
        (temp, repo)
    }

    fn park(id: &str, area: &str) -> Vec<String> {
        ["FEATURE", id, "name", "STRING", "Cantera", "area", "DOUBLE", area]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn respond(mock: MockTransport, args: &[&str], lines: &[String]) -> MockTransport {
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        mock.respond(args, &refs)
    }

    #[test]
    fn path_diff_keeps_refs() {
        let mock = MockTransport::new().respond(
            &["diff-tree", "HEAD~1", "HEAD"],
            &[&format!("parks/5 {OLD} {NEW}"), &format!("parks/6 {ZERO} {NEW}")],
        );
        let (_t, repo) = open(&mock);

        let diff = repo.diff("HEAD~1", "HEAD", None).unwrap();
        assert_eq!(diff.len(), 2);
        assert_eq!(diff[0].kind(), ChangeKind::Modified);
        assert_eq!(diff[0].old_ref, "HEAD~1");
        assert_eq!(diff[1].kind(), ChangeKind::Added);
    }

    #[test]
    fn convenience_diffs_pick_refs() {
        let mock = MockTransport::new();
        let (_t, repo) = open(&mock);
        repo.staged().unwrap();
        repo.unstaged().unwrap();
        repo.not_in_database().unwrap();
        assert!(mock.called(&["diff-tree", "HEAD", "STAGE_HEAD"]));
        assert!(mock.called(&["diff-tree", "STAGE_HEAD", "WORK_HEAD"]));
        assert!(mock.called(&["diff-tree", "HEAD", "WORK_HEAD"]));
    }

    #[test]
    fn feature_diff_reports_changed_area_only() {
        let mock = respond(MockTransport::new(), &["show", "--raw", "HEAD~1:parks/5"], &park(OLD, "15297.503295898438"));
        let mock = respond(mock, &["show", "--raw", "HEAD:parks/5"], &park(NEW, "15246.59765625"));
        let (_t, repo) = open(&mock);

        let diff = repo.feature_diff("HEAD~1", "HEAD", "parks/5").unwrap();
        assert_eq!(diff.len(), 1);
        let area = diff.get("area").unwrap();
        assert_eq!(area.old, Some(Value::Double(15297.503295898438)));
        assert_eq!(area.new, Some(Value::Double(15246.59765625)));
    }

    #[test]
    fn feature_diff_of_added_feature() {
        let mock = MockTransport::new().fail(&["show", "--raw", "HEAD~1:parks/6"], &["not found"]);
        let mock = respond(mock, &["show", "--raw", "HEAD:parks/6"], &park(NEW, "1.0"));
        let (_t, repo) = open(&mock);

        let diff = repo.feature_diff("HEAD~1", "HEAD", "parks/6").unwrap();
        assert_eq!(diff.len(), 2);
        assert!(diff.iter().all(|c| c.old.is_none()));
    }

    #[test]
    fn feature_diff_propagates_transport_failure() {
        let mock = MockTransport::new().unavailable(&["show", "--raw", "HEAD~1:parks/6"]);
        let (_t, repo) = open(&mock);
        assert!(matches!(
            repo.feature_diff("HEAD~1", "HEAD", "parks/6"),
            Err(Error::Transport { .. })
        ));
    }

    #[test]
    fn tree_diff_uses_union_type() {
        let tree = |id: &str| {
            vec![
                "TREE ID:  t".to_string(),
                "Size: 1".to_string(),
                "Number of trees:  0".to_string(),
                format!("Default feature type ID:  {id}"),
            ]
        };
        let mock = respond(MockTransport::new(), &["show", "HEAD~1:parks"], &tree("ft1"));
        let mock = respond(mock, &["show", "HEAD:parks"], &tree("ft2"));
        let mock = mock
            .respond(&["show", "ft1"], &["TYPE", "ft1", "name: parks", "name: [STRING]", "area: [DOUBLE]"])
            .respond(&["show", "ft2"], &["TYPE", "ft2", "name: parks", "area: [DOUBLE]", "owner: [STRING]"])
            .respond(
                &["diff-tree", "HEAD~1", "HEAD", "--", "parks", "--describe"],
                &["parks/5", "U name", "Cantera", "M area", "2.0", "3.5", "A owner", "city"],
            );
        let (_t, repo) = open(&mock);

        let diff = repo.tree_diff("parks", "HEAD~1", "HEAD").unwrap();
        assert_eq!(diff.attributes.names().collect::<Vec<_>>(), vec!["name", "area", "owner"]);
        assert_eq!(diff.features.len(), 1);
        let changes = &diff.features[0].changes;
        assert_eq!(changes[1].0, "area");
        assert_eq!(
            changes[1].1,
            AttributeDelta::Modified {
                old: Value::Double(2.0),
                new: Value::Double(3.5)
            }
        );
        assert_eq!(changes[2].1.marker(), 'A');
    }

    #[test]
    fn tree_diff_with_missing_old_tree() {
        let mock = MockTransport::new()
            .fail(&["show", "HEAD~1:parks"], &["not found"])
            .respond(&["diff-tree", "HEAD~1", "HEAD", "--", "parks", "--describe"], &[]);
        let (_t, repo) = open(&mock);

        let diff = repo.tree_diff("parks", "HEAD~1", "HEAD").unwrap();
        assert!(diff.features.is_empty());
    }
}
