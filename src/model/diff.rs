//! model::diff
//!
//! Path-level and attribute-level differences.
//!
//! # Feature diffs
//!
//! [`FeatureDiff::between`] compares two versions of one feature:
//!
//! - attribute only in the old version: `(value, None)`
//! - attribute only in the new version: `(None, value)`
//! - attribute in both: listed only if the values differ
//!
//! Geometries compare by canonical WKT, so two encodings of the same shape
//! are equal. Attributes come back in the old version's declaration order,
//! followed by attributes only the new version declares.

use serde::Serialize;

use super::{Feature, FeatureData, FeatureType};
use crate::core::types::ObjectId;
use crate::core::value::Value;
use crate::error::Result;
use crate::repo::Repository;

/// Classification of a changed path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Added => write!(f, "Added"),
            ChangeKind::Removed => write!(f, "Removed"),
            ChangeKind::Modified => write!(f, "Modified"),
        }
    }
}

/// One path changed between two references.
///
/// A zero id marks the side where the path does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffEntry {
    pub path: String,
    pub old_id: ObjectId,
    pub new_id: ObjectId,
    /// Reference the old side was taken from.
    pub old_ref: String,
    /// Reference the new side was taken from.
    pub new_ref: String,
}

impl DiffEntry {
    pub fn kind(&self) -> ChangeKind {
        if self.old_id.is_zero() {
            ChangeKind::Added
        } else if self.new_id.is_zero() {
            ChangeKind::Removed
        } else {
            ChangeKind::Modified
        }
    }

    /// The old version, unless the path was added.
    pub fn old_feature<'r>(&self, repo: &'r Repository) -> Option<Feature<'r>> {
        (!self.old_id.is_zero()).then(|| Feature::new(repo, &self.old_ref, &self.path))
    }

    /// The new version, unless the path was removed.
    pub fn new_feature<'r>(&self, repo: &'r Repository) -> Option<Feature<'r>> {
        (!self.new_id.is_zero()).then(|| Feature::new(repo, &self.new_ref, &self.path))
    }

    pub fn feature_diff(&self, repo: &Repository) -> Result<FeatureDiff> {
        repo.feature_diff(&self.old_ref, &self.new_ref, &self.path)
    }
}

impl std::fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind() {
            ChangeKind::Added => write!(f, "Added {} ({})", self.path, self.new_id),
            ChangeKind::Removed => write!(f, "Removed {}", self.path),
            ChangeKind::Modified => write!(
                f,
                "Modified {} ({} --> {})",
                self.path, self.old_id, self.new_id
            ),
        }
    }
}

/// Old and new value of one attribute. `None` means the attribute is absent
/// on that side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeChange {
    pub name: String,
    pub old: Option<Value>,
    pub new: Option<Value>,
}

/// Changed attributes of one feature path, in stable attribute order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct FeatureDiff {
    changes: Vec<AttributeChange>,
}

impl FeatureDiff {
    /// Compare two versions; `None` means the feature is absent on that side.
    ///
    /// ```
    /// use geogig_porcelain::core::value::{TypeTag, Value};
    /// use geogig_porcelain::model::{Attribute, FeatureData, FeatureDiff};
    ///
    /// let version = |area: f64| FeatureData::new(vec![
    ///     Attribute { name: "name".into(), tag: TypeTag::String, value: "Park".into() },
    ///     Attribute { name: "area".into(), tag: TypeTag::Double, value: Value::Double(area) },
    /// ]);
    ///
    /// let diff = FeatureDiff::between(Some(&version(15297.503295898438)), Some(&version(15246.59765625)));
    /// assert_eq!(diff.len(), 1);
    /// let area = diff.get("area").unwrap();
    /// assert_eq!(area.old, Some(Value::Double(15297.503295898438)));
    /// assert_eq!(area.new, Some(Value::Double(15246.59765625)));
    /// ```
    pub fn between(old: Option<&FeatureData>, new: Option<&FeatureData>) -> Self {
        let mut changes = Vec::new();

        if let Some(old) = old {
            for a in old {
                let other = new.and_then(|n| n.value(&a.name));
                if other != Some(&a.value) {
                    changes.push(AttributeChange {
                        name: a.name.clone(),
                        old: Some(a.value.clone()),
                        new: other.cloned(),
                    });
                }
            }
        }
        if let Some(new) = new {
            for a in new {
                if old.and_then(|o| o.get(&a.name)).is_none() {
                    changes.push(AttributeChange {
                        name: a.name.clone(),
                        old: None,
                        new: Some(a.value.clone()),
                    });
                }
            }
        }
        Self { changes }
    }

    pub fn get(&self, name: &str) -> Option<&AttributeChange> {
        self.changes.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(|c| c.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AttributeChange> {
        self.changes.iter()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

impl<'a> IntoIterator for &'a FeatureDiff {
    type Item = &'a AttributeChange;
    type IntoIter = std::slice::Iter<'a, AttributeChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// How one attribute of a described feature changed (`M`, `A`, `R`, `U`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "change", content = "value", rename_all = "lowercase")]
pub enum AttributeDelta {
    Modified { old: Value, new: Value },
    Added(Value),
    Removed(Value),
    Unchanged(Value),
}

impl AttributeDelta {
    pub fn marker(&self) -> char {
        match self {
            AttributeDelta::Modified { .. } => 'M',
            AttributeDelta::Added(_) => 'A',
            AttributeDelta::Removed(_) => 'R',
            AttributeDelta::Unchanged(_) => 'U',
        }
    }
}

/// Described changes of one feature, ordered by the tree's feature type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureChanges {
    pub path: String,
    pub changes: Vec<(String, AttributeDelta)>,
}

/// Result of describing every changed feature under a tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeDiff {
    /// Union of both versions' feature types.
    pub attributes: FeatureType,
    pub features: Vec<FeatureChanges>,
}

/// Change counts for one tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathStats {
    pub path: String,
    pub added: u64,
    pub removed: u64,
    pub modified: u64,
}
