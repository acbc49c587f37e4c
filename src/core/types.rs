//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`ObjectId`] - 40-character content hash, with a zero sentinel for "absent"
//! - [`BranchName`] - Validated branch name
//! - [`ResetMode`] - `--hard` / `--mixed` / `--soft`
//! - [`ConflictSide`] - Which side of a conflict to keep
//!
//! # Validation
//!
//! These types enforce validity at construction time. A symbolic reference
//! such as `HEAD~1` is never an [`ObjectId`]; it has to be resolved through
//! the engine first.
//!
//! # Examples
//!
//! ```
//! use geogig_porcelain::core::types::{BranchName, ObjectId};
//!
//! let id = ObjectId::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! assert_eq!(id.short(7), "abc123d");
//!
//! assert!(BranchName::new("invalid..name").is_err());
//! assert!(ObjectId::new("HEAD~1").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The current branch tip.
pub const HEAD: &str = "HEAD";
/// The unstaged working snapshot.
pub const WORK_HEAD: &str = "WORK_HEAD";
/// The staged snapshot (index).
pub const STAGE_HEAD: &str = "STAGE_HEAD";
/// Default branch name.
pub const MASTER: &str = "master";
/// Default remote name.
pub const ORIGIN: &str = "origin";

/// Configuration key for the author name.
pub const USER_NAME: &str = "user.name";
/// Configuration key for the author email.
pub const USER_EMAIL: &str = "user.email";

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidObjectId(String),
}

/// A content hash identifying a commit, tree, feature or feature type.
///
/// Ids are normalized to lowercase. The all-zeros id is the sentinel the
/// engine uses for "no object" (the missing side of an added or removed
/// path, the parent of a root commit).
///
/// # Example
///
/// ```
/// use geogig_porcelain::core::types::ObjectId;
///
/// let id = ObjectId::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(id.as_str(), "abc123def4567890abc123def4567890abc12345");
///
/// assert!(ObjectId::zero().is_zero());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Length of a canonical id in hex characters.
    pub const LEN: usize = 40;

    const ZERO: &'static str = "0000000000000000000000000000000000000000";

    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidObjectId` unless the string is exactly 40
    /// hex characters.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into().to_ascii_lowercase();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// The zero/null id.
    pub fn zero() -> Self {
        Self(Self::ZERO.to_string())
    }

    /// Check if this is the zero/null id.
    pub fn is_zero(&self) -> bool {
        self.0.chars().all(|c| c == '0')
    }

    /// Check whether `s` looks like a canonical id without allocating.
    ///
    /// ```
    /// use geogig_porcelain::core::types::ObjectId;
    ///
    /// assert!(ObjectId::is_canonical("0123456789abcdef0123456789abcdef01234567"));
    /// assert!(!ObjectId::is_canonical("master"));
    /// ```
    pub fn is_canonical(s: &str) -> bool {
        s.len() == Self::LEN && s.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    }

    /// Get an abbreviated form of the id.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    fn validate(id: &str) -> Result<(), TypeError> {
        if id.len() != Self::LEN {
            return Err(TypeError::InvalidObjectId(format!(
                "expected {} hex characters, got {}",
                Self::LEN,
                id.len()
            )));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidObjectId(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ObjectId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated branch name.
///
/// Names are split on `/` and every part must be non-empty, must not start
/// with `.` and must not end with `.lock`. `:` is reserved for `ref:path`
/// refspecs and `~`, `^` for ancestry, so those are rejected along with
/// whitespace, control characters and glob characters.
///
/// # Example
///
/// ```
/// use geogig_porcelain::core::types::BranchName;
///
/// let name = BranchName::new("survey/2024").unwrap();
/// assert_eq!(name.as_str(), "survey/2024");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new("has space").is_err());
/// assert!(BranchName::new("HEAD~1").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        const RESERVED: [char; 7] = ['~', '^', ':', '\\', '?', '*', '['];

        let problem = if name.is_empty() || name == "@" {
            Some("is not a usable name".to_string())
        } else if name.starts_with('-') {
            Some("would be read as an option".to_string())
        } else if let Some(c) = name
            .chars()
            .find(|c| c.is_whitespace() || c.is_control() || RESERVED.contains(c))
        {
            Some(format!("contains {c:?}"))
        } else if name.contains("..") || name.contains("@{") {
            Some("contains a revision operator".to_string())
        } else if name
            .split('/')
            .any(|part| part.is_empty() || part.starts_with('.') || part.ends_with(".lock"))
        {
            Some("has an empty, hidden or '.lock' part".to_string())
        } else {
            None
        };

        match problem {
            Some(problem) => Err(TypeError::InvalidBranchName(format!("'{name}' {problem}"))),
            None => Ok(()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How far a reset reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetMode {
    /// Move the branch, the index and the working tree.
    #[default]
    Hard,
    /// Move the branch and the index.
    Mixed,
    /// Move the branch only.
    Soft,
}

impl ResetMode {
    /// The engine flag for this mode.
    pub fn flag(self) -> &'static str {
        match self {
            ResetMode::Hard => "--hard",
            ResetMode::Mixed => "--mixed",
            ResetMode::Soft => "--soft",
        }
    }
}

/// Which existing version a conflicted path is resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSide {
    /// The version on the current branch.
    Ours,
    /// The version being merged or rebased in.
    Theirs,
}

impl ConflictSide {
    /// The engine flag for this side.
    pub fn flag(self) -> &'static str {
        match self {
            ConflictSide::Ours => "--ours",
            ConflictSide::Theirs => "--theirs",
        }
    }
}

impl std::fmt::Display for ConflictSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictSide::Ours => write!(f, "ours"),
            ConflictSide::Theirs => write!(f, "theirs"),
        }
    }
}

/// Join a reference and a path into the engine's `ref:path` form.
///
/// An empty path addresses the root tree, which is the bare reference.
///
/// ```
/// use geogig_porcelain::core::types::refspec;
///
/// assert_eq!(refspec("HEAD", "parks/5"), "HEAD:parks/5");
/// assert_eq!(refspec("HEAD", ""), "HEAD");
/// ```
pub fn refspec(reference: &str, path: &str) -> String {
    if path.is_empty() {
        reference.to_string()
    } else {
        format!("{reference}:{path}")
    }
}
