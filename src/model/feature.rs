//! model::feature
//!
//! Feature handles and the attribute data they load.
//!
//! # Types
//!
//! - [`FeatureData`] - ordered attribute values with their type tags
//! - [`FeatureType`] - ordered attribute declarations of a tree
//! - [`Feature`] - a lazily loaded leaf at `ref:path`
//! - [`BlameEntry`] - last change of one attribute

use std::cell::OnceCell;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::{Commit, FeatureDiff};
use crate::core::types::{refspec, ObjectId};
use crate::core::value::{Geometry, TypeTag, Value};
use crate::error::{Error, Result};
use crate::repo::Repository;

/// One attribute of a feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub tag: TypeTag,
    pub value: Value,
}

/// Attribute values of one feature version, in declaration order.
///
/// Serializes as a map of name to value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureData {
    attributes: Vec<Attribute>,
}

impl FeatureData {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self { attributes }
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.attributes.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|a| a.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).map(|a| &a.value)
    }

    /// The first geometry-valued attribute, with its name.
    pub fn geometry(&self) -> Option<(&str, &Geometry)> {
        self.attributes
            .iter()
            .find_map(|a| a.value.as_geometry().map(|g| (a.name.as_str(), g)))
    }

    /// Declared types, in order.
    pub fn feature_type(&self) -> FeatureType {
        let mut ftype = FeatureType::default();
        for a in &self.attributes {
            ftype.push(&a.name, a.tag.clone());
        }
        ftype
    }

    /// Name/value pairs, the shape accepted by insert.
    pub fn values(&self) -> Vec<(String, Value)> {
        self.attributes
            .iter()
            .map(|a| (a.name.clone(), a.value.clone()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a FeatureData {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for FeatureData {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.attributes.len()))?;
        for a in &self.attributes {
            map.serialize_entry(&a.name, &a.value)?;
        }
        map.end()
    }
}

/// Attribute declarations, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeatureType {
    fields: Vec<(String, TypeTag)>,
}

impl FeatureType {
    /// Declare an attribute, replacing the type of an existing one.
    pub fn push(&mut self, name: &str, tag: TypeTag) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some(field) => field.1 = tag,
            None => self.fields.push((name.to_string(), tag)),
        }
    }

    /// Union with `other`; new names are appended in `other`'s order.
    pub fn merge(&mut self, other: &FeatureType) {
        for (name, tag) in &other.fields {
            self.push(name, tag.clone());
        }
    }

    pub fn get(&self, name: &str) -> Option<&TypeTag> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeTag)> {
        self.fields.iter().map(|(n, t)| (n.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for FeatureType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, tag) in &self.fields {
            map.serialize_entry(name, tag)?;
        }
        map.end()
    }
}

/// Who last changed an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlameEntry {
    pub attribute: String,
    /// Current value, as printed by the engine.
    pub value: String,
    pub commit: ObjectId,
    pub author: String,
}

/// A leaf record at `ref:path`.
///
/// Attribute data is fetched on first access and kept for the lifetime of
/// the handle.
#[derive(Debug)]
pub struct Feature<'r> {
    repo: &'r Repository,
    reference: String,
    path: String,
    data: OnceCell<FeatureData>,
}

impl<'r> Feature<'r> {
    pub fn new(repo: &'r Repository, reference: &str, path: &str) -> Self {
        Self {
            repo,
            reference: reference.to_string(),
            path: path.to_string(),
            data: OnceCell::new(),
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn refspec(&self) -> String {
        refspec(&self.reference, &self.path)
    }

    /// All attributes with their types.
    ///
    /// # Errors
    ///
    /// `FeatureNotFound` if the engine has nothing at this path.
    pub fn data(&self) -> Result<&FeatureData> {
        if let Some(data) = self.data.get() {
            return Ok(data);
        }
        let data = self.repo.feature_data(&self.reference, &self.path)?;
        Ok(self.data.get_or_init(|| data))
    }

    pub fn value(&self, name: &str) -> Result<Option<&Value>> {
        Ok(self.data()?.value(name))
    }

    /// The geometry; the first one found if there are several.
    pub fn geometry(&self) -> Result<&Geometry> {
        self.geometry_entry().map(|(_, g)| g)
    }

    pub fn geometry_field(&self) -> Result<&str> {
        self.geometry_entry().map(|(name, _)| name)
    }

    fn geometry_entry(&self) -> Result<(&str, &Geometry)> {
        self.data()?.geometry().ok_or_else(|| Error::NoGeometry {
            reference: self.refspec(),
        })
    }

    /// Attributes whose values are not geometries.
    pub fn attributes_without_geometry(&self) -> Result<Vec<&Attribute>> {
        Ok(self
            .data()?
            .iter()
            .filter(|a| a.value.as_geometry().is_none())
            .collect())
    }

    pub fn feature_type(&self) -> Result<FeatureType> {
        Ok(self.data()?.feature_type())
    }

    /// Whether the engine has data at this path.
    ///
    /// Lookup failures reported by the engine count as absence; a transport
    /// failure is still an error.
    pub fn exists(&self) -> Result<bool> {
        match self.data() {
            Ok(data) => Ok(!data.is_empty()),
            Err(Error::FeatureNotFound { .. }) | Err(Error::Engine { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Attribute changes from this version to `other`.
    pub fn diff(&self, other: &Feature<'_>) -> Result<FeatureDiff> {
        if other.path != self.path {
            return Err(Error::InvalidArgument(format!(
                "cannot compare '{}' with '{}'",
                self.path, other.path
            )));
        }
        self.repo
            .feature_diff(&self.reference, &other.reference, &self.path)
    }

    pub fn blame(&self) -> Result<Vec<BlameEntry>> {
        self.repo.blame(&self.path)
    }

    /// Every committed version of this path.
    pub fn versions(&self) -> Result<Vec<(Commit, FeatureData)>> {
        self.repo.versions(&self.path)
    }

    /// Make this version the current one in the working tree and index.
    pub fn set_as_current(&self) -> Result<()> {
        if !self.exists()? {
            return Err(Error::FeatureNotFound {
                reference: self.refspec(),
            });
        }
        self.repo
            .update_path_to_ref(&self.reference, &[self.path.as_str()])
    }
}

impl std::fmt::Display for Feature<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.refspec())
    }
}
