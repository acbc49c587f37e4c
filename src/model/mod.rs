//! model
//!
//! Domain entities built from parsed engine output.
//!
//! Plain-data types ([`Commit`], [`DiffEntry`], [`FeatureData`], [`Tag`])
//! can outlive the repository they came from. Handles ([`Commitish`],
//! [`Tree`], [`Feature`], [`Conflict`]) borrow the [`Repository`] and fetch
//! from the engine when asked.
//!
//! [`Repository`]: crate::repo::Repository

pub mod commit;
pub mod commitish;
pub mod conflict;
pub mod diff;
pub mod feature;
pub mod tag;
pub mod tree;

pub use commit::{Commit, Signature};
pub use commitish::Commitish;
pub use conflict::Conflict;
pub use diff::{
    AttributeChange, AttributeDelta, ChangeKind, DiffEntry, FeatureChanges, FeatureDiff, PathStats,
    TreeDiff,
};
pub use feature::{Attribute, BlameEntry, Feature, FeatureData, FeatureType};
pub use tag::Tag;
pub use tree::Tree;

/// A child of a tree listing.
#[derive(Debug)]
pub enum Node<'r> {
    Tree(Tree<'r>),
    Feature(Feature<'r>),
}

impl Node<'_> {
    pub fn path(&self) -> &str {
        match self {
            Node::Tree(t) => t.path(),
            Node::Feature(f) => f.path(),
        }
    }
}
