//! repo::contents
//!
//! Reading and writing what is stored under a reference: tree listings,
//! feature data, feature types, and the working-tree edits (insert, remove,
//! apply).

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::{LogQuery, Repository};
use crate::core::types::{self, refspec};
use crate::core::value::{encode, Value};
use crate::error::{Error, Result};
use crate::model::{BlameEntry, Commit, Feature, FeatureData, FeatureType, Node, Tree};
use crate::parse::feature as parse;
use crate::parse::listing::{self, EntryKind};

impl Repository {
    /// Direct children of `reference:path`, or every descendant when
    /// `recursive`.
    pub fn children(&self, reference: &str, path: &str, recursive: bool) -> Result<Vec<Node<'_>>> {
        let target = refspec(reference, path);
        let mut args = vec!["ls-tree", target.as_str(), "-v"];
        if recursive {
            args.push("-r");
        }
        let entries = listing::parse_listing(&self.run(&args)?)?;
        Ok(entries
            .into_iter()
            .map(|e| match e.kind {
                EntryKind::Tree => Node::Tree(Tree::new(self, reference, &e.path, e.size)),
                EntryKind::Feature => Node::Feature(Feature::new(self, reference, &e.path)),
            })
            .collect())
    }

    pub fn trees(&self, reference: &str, path: &str, recursive: bool) -> Result<Vec<Tree<'_>>> {
        Ok(self
            .children(reference, path, recursive)?
            .into_iter()
            .filter_map(|n| match n {
                Node::Tree(t) => Some(t),
                Node::Feature(_) => None,
            })
            .collect())
    }

    pub fn features(&self, reference: &str, path: &str, recursive: bool) -> Result<Vec<Feature<'_>>> {
        Ok(self
            .children(reference, path, recursive)?
            .into_iter()
            .filter_map(|n| match n {
                Node::Feature(f) => Some(f),
                Node::Tree(_) => None,
            })
            .collect())
    }

    pub fn tree(&self, reference: &str, path: &str) -> Tree<'_> {
        Tree::new(self, reference, path, None)
    }

    pub fn feature(&self, reference: &str, path: &str) -> Feature<'_> {
        Feature::new(self, reference, path)
    }

    /// Attributes of the feature at `reference:path`.
    ///
    /// # Errors
    ///
    /// `FeatureNotFound` when the engine prints no attributes.
    pub fn feature_data(&self, reference: &str, path: &str) -> Result<FeatureData> {
        let target = refspec(reference, path);
        let data = parse::parse_feature_data(&self.run(&["show", "--raw", target.as_str()])?);
        if data.is_empty() {
            return Err(Error::FeatureNotFound { reference: target });
        }
        Ok(data)
    }

    /// Attributes of several `ref:path` specs in one engine call, keyed by
    /// spec. Specs the engine does not print are missing from the map.
    pub fn features_data(&self, refspecs: &[String]) -> Result<HashMap<String, FeatureData>> {
        if refspecs.is_empty() {
            return Ok(HashMap::new());
        }
        let mut args = vec!["show".to_string(), "--raw".to_string()];
        args.extend(refspecs.iter().cloned());
        Ok(parse::parse_batched(&self.run(&args)?))
    }

    /// Attribute declarations of the tree at `reference:path`.
    pub fn feature_type(&self, reference: &str, path: &str) -> Result<FeatureType> {
        let tree = self.run(&["show", refspec(reference, path).as_str()])?;
        let id = parse::feature_type_id(&tree)?;
        Ok(parse::parse_feature_type(&self.run(&["show", id.as_str()])?)?)
    }

    /// Number of features under the tree at `reference:path`.
    pub fn count(&self, reference: &str, path: &str) -> Result<u64> {
        let tree = self.run(&["show", refspec(reference, path).as_str()])?;
        Ok(parse::parse_count(&tree)?)
    }

    /// Human-readable description of any object.
    pub fn show(&self, reference: &str) -> Result<String> {
        Ok(self.run(&["show", reference])?.join("\n"))
    }

    /// Raw object dump.
    pub fn cat(&self, reference: &str) -> Result<String> {
        Ok(self.cat_lines(reference)?.join("\n"))
    }

    pub(crate) fn cat_lines(&self, reference: &str) -> Result<Vec<String>> {
        self.run(&["cat", reference])
    }

    /// Last change of each attribute of the feature at `path`.
    pub fn blame(&self, path: &str) -> Result<Vec<BlameEntry>> {
        Ok(listing::parse_blame(&self.run(&["blame", path, "--porcelain"])?)?)
    }

    /// Every committed version of the feature at `path`, newest first.
    ///
    /// Commits in which the path holds no feature (such as its removal) are
    /// left out.
    pub fn versions(&self, path: &str) -> Result<Vec<(Commit, FeatureData)>> {
        let commits = self.log(&LogQuery::new().tip(types::HEAD).path(path))?;
        let refspecs: Vec<String> = commits.iter().map(|c| refspec(c.id().as_str(), path)).collect();
        let mut data = self.features_data(&refspecs)?;

        let mut versions = Vec::with_capacity(commits.len());
        for (commit, spec) in commits.iter().zip(&refspecs) {
            match data.remove(spec) {
                Some(d) => versions.push((commit.clone(), d)),
                None => debug!(%spec, "no feature data for version"),
            }
        }
        Ok(versions)
    }

    /// Write one feature into the working tree.
    pub fn insert_feature(&self, path: &str, values: &[(String, Value)]) -> Result<()> {
        self.insert_features(&[(path.to_string(), values.to_vec())])
    }

    /// Write features into the working tree in one engine call.
    ///
    /// Null values are omitted; the engine stores them as absent.
    pub fn insert_features(&self, features: &[(String, Vec<(String, Value)>)]) -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(insert_payload(features).as_bytes())?;
        file.flush()?;

        let name = file.path().display().to_string();
        debug!(count = features.len(), file = %name, "inserting features");
        self.run(&["insert", "-f", name.as_str()])?;
        Ok(())
    }

    /// Remove features from the working tree.
    pub fn remove_features(&self, paths: &[&str]) -> Result<()> {
        self.remove(paths, false)
    }

    /// Remove whole trees from the working tree.
    pub fn remove_trees(&self, paths: &[&str]) -> Result<()> {
        self.remove(paths, true)
    }

    fn remove(&self, paths: &[&str], recursive: bool) -> Result<()> {
        if paths.is_empty() {
            warn!("remove called without paths");
            return Ok(());
        }
        let mut args = vec!["rm"];
        args.extend_from_slice(paths);
        if recursive {
            args.push("-r");
        }
        self.run(&args).map(drop)
    }

    /// Apply a patch file to the working tree.
    pub fn apply_patch(&self, patch: &Path) -> Result<()> {
        let patch = patch.display().to_string();
        self.run(&["apply", patch.as_str()]).map(drop)
    }
}

/// Insert file body: per feature, the path, one `name<TAB>value` line per
/// non-null value, then a blank line.
fn insert_payload(features: &[(String, Vec<(String, Value)>)]) -> String {
    let mut out = String::new();
    for (path, values) in features {
        out.push_str(path);
        out.push('\n');
        for (name, value) in values.iter().filter(|(_, v)| !v.is_null()) {
            out.push_str(name);
            out.push('\t');
            out.push_str(&encode(value));
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::{RepoSettings, CONTROL_DIR};
    use crate::transport::MockTransport;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    const C1: &str = "1111111111111111111111111111111111111111";
    const C2: &str = "2222222222222222222222222222222222222222";
    const TREE: &str = "7777777777777777777777777777777777777777";

    fn open(mock: &MockTransport) -> (TempDir, Repository) {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(CONTROL_DIR)).unwrap();
        let repo = Repository::open_with(temp.path(), Arc::new(mock.clone()), RepoSettings::default()).unwrap();
        (temp, repo)
    }

    mod tree_listing {
        use super::*;

        #[test]
        fn children_split_by_kind() {
            let mock = MockTransport::new().respond(
                &["ls-tree", "HEAD", "-v"],
                &[
                    &format!("{TREE} tree {TREE} parks 0 12"),
                    &format!("{C1} feature {TREE} readme 0"),
                ],
            );
            let (_t, repo) = open(&mock);

            let children = repo.children("HEAD", "", false).unwrap();
            assert_eq!(children.len(), 2);
            let trees = repo.trees("HEAD", "", false).unwrap();
            assert_eq!(trees[0].path(), "parks");
            assert_eq!(trees[0].size(), Some(12));
            assert_eq!(repo.features("HEAD", "", false).unwrap()[0].path(), "readme");
        }

        #[test]
        fn recursive_flag_and_refspec() {
            let mock = MockTransport::new();
            let (_t, repo) = open(&mock);
            repo.children("master", "parks", true).unwrap();
            assert!(mock.called(&["ls-tree", "master:parks", "-v", "-r"]));
        }
    }

    mod data {
        use super::*;

        #[test]
        fn feature_data_skips_header() {
            let mock = MockTransport::new().respond(
                &["show", "--raw", "HEAD:parks/1"],
                &["FEATURE", C1, "name", "STRING", "Central", "area", "DOUBLE", "2.5"],
            );
            let (_t, repo) = open(&mock);
            let data = repo.feature_data("HEAD", "parks/1").unwrap();
            assert_eq!(data.value("area"), Some(&Value::Double(2.5)));
        }

        #[test]
        fn empty_output_is_not_found() {
            let mock = MockTransport::new();
            let (_t, repo) = open(&mock);
            assert!(matches!(
                repo.feature_data("HEAD", "parks/404"),
                Err(Error::FeatureNotFound { ref reference }) if reference == "HEAD:parks/404"
            ));
        }

        #[test]
        fn feature_type_via_type_id() {
            let mock = MockTransport::new()
                .respond(
                    &["show", "HEAD:parks"],
                    &["TREE ID:  x", "Size: 3", "Number of trees:  0", "Default feature type ID:  ft1"],
                )
                .respond(&["show", "ft1"], &["TYPE", "ft1", "name: parks", "name: [STRING]", "area: [DOUBLE]"]);
            let (_t, repo) = open(&mock);

            let ftype = repo.feature_type("HEAD", "parks").unwrap();
            assert_eq!(ftype.names().collect::<Vec<_>>(), vec!["name", "area"]);
            assert_eq!(repo.count("HEAD", "parks").unwrap(), 3);
        }

        #[test]
        fn versions_newest_first() {
            let commit = |id: &str, parent: &str| {
                vec![
                    format!("commit {id}"),
                    format!("tree {TREE}"),
                    format!("parent {parent}"),
                    "author Ana ana@example.org 1400000000000 0".to_string(),
                    "committer Ana ana@example.org 1400000000000 0".to_string(),
                    "message".to_string(),
                    "\tedit".to_string(),
                    String::new(),
                ]
            };
            let mut log = commit(C2, C1);
            log.extend(commit(C1, "0000000000000000000000000000000000000000"));
            let log: Vec<&str> = log.iter().map(String::as_str).collect();

            let spec2 = format!("{C2}:parks/1");
            let spec1 = format!("{C1}:parks/1");
            let mock = MockTransport::new()
                .respond(&["rev-list", "HEAD", "-p", "parks/1"], &log)
                .respond(
                    &["show", "--raw", &spec2, &spec1],
                    &[&spec2, C2, "area", "DOUBLE", "2.0", "", &spec1, C1, "area", "DOUBLE", "1.0"],
                );
            let (_t, repo) = open(&mock);

            let versions = repo.versions("parks/1").unwrap();
            assert_eq!(versions.len(), 2);
            assert_eq!(versions[0].0.id().as_str(), C2);
            assert_eq!(versions[0].1.value("area"), Some(&Value::Double(2.0)));
            assert_eq!(versions[1].1.value("area"), Some(&Value::Double(1.0)));
        }
    }

    mod edits {
        use super::*;

        #[test]
        fn insert_payload_layout() {
            let features = vec![(
                "parks/9".to_string(),
                vec![
                    ("name".to_string(), Value::from("Lake")),
                    ("owner".to_string(), Value::Null),
                    ("area".to_string(), Value::Double(15.0)),
                ],
            )];
            assert_eq!(insert_payload(&features), "parks/9\nname\tLake\narea\t15\n\n");
        }

        #[test]
        fn insert_file_is_removed_after_call() {
            let mock = MockTransport::new();
            let (_t, repo) = open(&mock);
            repo.insert_feature("parks/9", &[("name".to_string(), Value::from("Lake"))])
                .unwrap();

            let call = mock.calls().pop().unwrap();
            assert_eq!(&call[..2], &["insert".to_string(), "-f".to_string()]);
            assert!(!Path::new(&call[2]).exists());
        }

        #[test]
        fn remove_shapes() {
            let mock = MockTransport::new();
            let (_t, repo) = open(&mock);
            repo.remove_features(&["parks/1", "parks/2"]).unwrap();
            repo.remove_trees(&["roads"]).unwrap();
            repo.remove_features(&[]).unwrap();
            assert!(mock.called(&["rm", "parks/1", "parks/2"]));
            assert!(mock.called(&["rm", "roads", "-r"]));
            assert_eq!(mock.count(&["rm"]), 2);
        }
    }
}
