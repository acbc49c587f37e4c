//! parse
//!
//! Response parsers: engine output lines in, typed records out.
//!
//! Every parser is a small deterministic pass over the lines of one engine
//! call. None of them talk to the engine; the repository runs the command
//! and hands the output over.
//!
//! # Modules
//!
//! - [`log`]: commit records from `rev-list`
//! - [`listing`]: row-per-line layouts (tree listings, diffs, refs, remotes,
//!   conflicts, blame, tree statistics)
//! - [`feature`]: attribute blocks from `show --raw`, feature types, and
//!   `diff-tree --describe` blocks

pub mod feature;
pub mod listing;
pub mod log;

pub use log::{parse_commits, TimestampMode};

use thiserror::Error;

/// Engine output that does not match the expected layout.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A line could not be split into the expected columns.
    #[error("malformed {what} line: '{line}'")]
    Malformed { what: &'static str, line: String },

    /// A record ended without a required field.
    #[error("{what} record is missing '{field}'")]
    MissingField {
        what: &'static str,
        field: &'static str,
    },

    /// Output ended before the expected line.
    #[error("{what} output is truncated")]
    Truncated { what: &'static str },
}

impl ParseError {
    pub(crate) fn malformed(what: &'static str, line: &str) -> Self {
        ParseError::Malformed {
            what,
            line: line.to_string(),
        }
    }
}

/// Parse an object id column, tolerating surrounding whitespace.
pub(crate) fn object_id(
    what: &'static str,
    token: &str,
) -> Result<crate::core::types::ObjectId, ParseError> {
    crate::core::types::ObjectId::new(token.trim()).map_err(|_| ParseError::malformed(what, token))
}
