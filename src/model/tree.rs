//! model::tree

use std::path::Path;

use super::{Feature, FeatureType, Node};
use crate::core::types::refspec;
use crate::error::Result;
use crate::repo::Repository;

/// A collection node at `ref:path`. The empty path is the root tree.
///
/// Trees are not cached; every accessor asks the engine again.
#[derive(Debug, Clone)]
pub struct Tree<'r> {
    repo: &'r Repository,
    reference: String,
    path: String,
    size: Option<u64>,
}

impl<'r> Tree<'r> {
    pub fn new(repo: &'r Repository, reference: &str, path: &str, size: Option<u64>) -> Self {
        Self {
            repo,
            reference: reference.to_string(),
            path: path.to_string(),
            size,
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Child count as reported by the listing that produced this tree.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn refspec(&self) -> String {
        refspec(&self.reference, &self.path)
    }

    pub fn children(&self) -> Result<Vec<Node<'r>>> {
        self.repo.children(&self.reference, &self.path, false)
    }

    pub fn trees(&self) -> Result<Vec<Tree<'r>>> {
        self.repo.trees(&self.reference, &self.path, false)
    }

    pub fn features(&self) -> Result<Vec<Feature<'r>>> {
        self.repo.features(&self.reference, &self.path, false)
    }

    pub fn feature_type(&self) -> Result<FeatureType> {
        self.repo.feature_type(&self.reference, &self.path)
    }

    /// Number of features under this tree, asked fresh.
    pub fn count(&self) -> Result<u64> {
        self.repo.count(&self.reference, &self.path)
    }

    pub fn export_shp(&self, shapefile: &Path) -> Result<()> {
        self.repo.export_shp(&self.reference, &self.path, shapefile)
    }
}

impl std::fmt::Display for Tree<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.refspec())
    }
}
