//! parse::log
//!
//! Commit records from `rev-list`.
//!
//! # Layout
//!
//! Records are separated by blank lines. Inside a record every line is
//! `key value...`; the `message` key starts a block of indented lines that
//! ends at the first line without indentation.
//!
//! ```text
//! commit 4f1c6a25e71cb4a1fe17e7ad11ec4c6f5d6d10f0
//! tree 9b2e41d0c2f8a0f1a4e5e2c6b7f8e9d0a1b2c3d4
//! parent 0c5a7b0e8f7d6c5b4a3928171615141312111009
//! author Ana Lopez ana@example.org 1389110400000 3600000
//! committer Ana Lopez ana@example.org 1389110400000 3600000
//! message
//!     Update park areas
//! ```
//!
//! The last three signature tokens are the email, the epoch milliseconds
//! and the UTC offset in milliseconds; everything between the key and the
//! email is the name.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::{object_id, ParseError};
use crate::core::types::ObjectId;
use crate::model::{Commit, Signature};

/// How signature timestamps are turned into instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampMode {
    /// Subtract the offset column from the epoch milliseconds.
    #[default]
    Offset,
    /// Use the epoch milliseconds as they are.
    Epoch,
}

impl TimestampMode {
    pub fn all() -> &'static [TimestampMode] {
        &[TimestampMode::Offset, TimestampMode::Epoch]
    }

    pub fn name(&self) -> &'static str {
        match self {
            TimestampMode::Offset => "offset",
            TimestampMode::Epoch => "epoch",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::all().iter().map(|m| m.name()).collect()
    }

    /// Parse a mode name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "offset" => Some(TimestampMode::Offset),
            "epoch" => Some(TimestampMode::Epoch),
            _ => None,
        }
    }

    fn instant(self, millis: i64, offset: i64) -> Option<DateTime<Utc>> {
        let millis = match self {
            TimestampMode::Offset => millis.checked_sub(offset)?,
            TimestampMode::Epoch => millis,
        };
        Utc.timestamp_millis_opt(millis).single()
    }
}

impl std::fmt::Display for TimestampMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

const WHAT: &str = "commit";

/// Parse `rev-list` output into commits, newest first as emitted.
///
/// A record without a `commit` line produces nothing; its lines carry over
/// into the next record.
///
/// ```
/// use geogig_porcelain::parse::{parse_commits, TimestampMode};
///
/// let lines: Vec<String> = [
///     "commit 4f1c6a25e71cb4a1fe17e7ad11ec4c6f5d6d10f0",
///     "tree 9b2e41d0c2f8a0f1a4e5e2c6b7f8e9d0a1b2c3d4",
///     "parent ",
///     "author Ana ana@example.org 1389110400000 0",
///     "committer Ana ana@example.org 1389110400000 0",
///     "message",
///     "\tFirst import",
/// ].iter().map(|s| s.to_string()).collect();
///
/// let commits = parse_commits(&lines, TimestampMode::Offset).unwrap();
/// assert_eq!(commits.len(), 1);
/// assert!(commits[0].is_root());
/// assert_eq!(commits[0].message(), "First import");
/// ```
pub fn parse_commits(lines: &[String], mode: TimestampMode) -> Result<Vec<Commit>, ParseError> {
    let mut commits = Vec::new();
    let mut record: Vec<&str> = Vec::new();

    for line in lines {
        if line.is_empty() {
            if let Some(commit) = parse_record(&record, mode)? {
                commits.push(commit);
                record.clear();
            }
        } else {
            record.push(line);
        }
    }

    if !record.is_empty() {
        if let Some(commit) = parse_record(&record, mode)? {
            commits.push(commit);
        }
    }
    Ok(commits)
}

fn parse_record(lines: &[&str], mode: TimestampMode) -> Result<Option<Commit>, ParseError> {
    let mut id = None;
    let mut tree = None;
    let mut parents = Vec::new();
    let mut author = None;
    let mut committer = None;
    let mut message: Vec<&str> = Vec::new();
    let mut in_message = false;

    for line in lines {
        if in_message {
            if line.starts_with('\t') || line.starts_with(' ') {
                message.push(line.trim());
                continue;
            }
            in_message = false;
        }

        let tokens: Vec<&str> = line.split(' ').collect();
        match tokens[0] {
            "commit" => id = Some(field(&tokens, line)?),
            "tree" => tree = Some(field(&tokens, line)?),
            "parent" => {
                parents = tokens[1..]
                    .iter()
                    .filter(|t| !t.is_empty())
                    .map(|t| object_id(WHAT, t))
                    .collect::<Result<_, _>>()?;
            }
            "author" => author = Some(signature(&tokens, line, mode)?),
            "committer" => committer = Some(signature(&tokens, line, mode)?),
            "message" => in_message = true,
            _ => {}
        }
    }

    let Some(id) = id else {
        return Ok(None);
    };
    let missing = |field| ParseError::MissingField { what: WHAT, field };
    Ok(Some(Commit::new(
        id,
        tree.ok_or_else(|| missing("tree"))?,
        parents,
        message.join("\n"),
        author.ok_or_else(|| missing("author"))?,
        committer.ok_or_else(|| missing("committer"))?,
    )))
}

fn field(tokens: &[&str], line: &str) -> Result<ObjectId, ParseError> {
    match tokens.get(1) {
        Some(token) => object_id(WHAT, token),
        None => Err(ParseError::malformed(WHAT, line)),
    }
}

fn signature(tokens: &[&str], line: &str, mode: TimestampMode) -> Result<Signature, ParseError> {
    let n = tokens.len();
    if n < 4 {
        return Err(ParseError::malformed(WHAT, line));
    }
    let number = |t: &str| {
        t.trim()
            .parse::<i64>()
            .map_err(|_| ParseError::malformed(WHAT, line))
    };
    let when = mode
        .instant(number(tokens[n - 2])?, number(tokens[n - 1])?)
        .ok_or_else(|| ParseError::malformed(WHAT, line))?;

    Ok(Signature {
        name: tokens[1..n - 3].join(" "),
        email: tokens[n - 3].to_string(),
        when,
    })
}
