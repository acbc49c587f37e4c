//! geogig-porcelain - a typed client for a versioned geospatial feature store
//!
//! The store keeps features (typed attribute records, usually with a
//! geometry) in trees, versioned git-style with commits, branches, merges
//! and rebases. All storage work happens in an external engine; this crate
//! drives it through a command transport and turns its text output into
//! typed values.
//!
//! # Architecture
//!
//! - [`transport`] - The `Transport` trait and its process, gateway and mock
//!   realizations
//! - [`parse`] - Engine output parsers
//! - [`model`] - Commits, commitishes, trees, features, diffs, conflicts, tags
//! - [`repo`] - The `Repository` handle and its read/write operations
//! - [`engine`] - Merge/rebase state machine and conflict resolution
//! - [`core`] - Strong types, the value codec, WKT handling, configuration
//! - [`cli`] / [`ui`] - The `ggp` command-line front end
//!
//! # Example
//!
//! ```ignore
//! use geogig_porcelain::repo::LogQuery;
//! use geogig_porcelain::Repository;
//!
//! let repo = Repository::open("/data/parks-repo")?;
//! for commit in repo.log(&LogQuery::new())?.iter() {
//!     println!("{commit}");
//! }
//! let diff = repo.feature_diff("HEAD~1", "HEAD", "parks/5")?;
//! ```

pub mod cli;
pub mod core;
pub mod engine;
pub mod error;
pub mod model;
pub mod parse;
pub mod repo;
pub mod transport;
pub mod ui;

pub use error::{Error, Result};
pub use repo::Repository;
