//! parse::listing
//!
//! Layouts with one record per line.

use std::collections::BTreeMap;

use super::{object_id, ParseError};
use crate::core::types::ObjectId;
use crate::model::{BlameEntry, DiffEntry, PathStats};

/// Kind column of an `ls-tree -v` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Tree,
    Feature,
}

/// One row of an `ls-tree -v` listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub kind: EntryKind,
    pub path: String,
    /// Number of children, reported for trees only.
    pub size: Option<u64>,
}

/// Ids of the three versions of a conflicted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictRecord {
    pub path: String,
    pub base: ObjectId,
    pub ours: ObjectId,
    pub theirs: ObjectId,
}

/// Sentinel printed by `conflicts` when nothing is conflicted.
pub const NO_CONFLICTS: &str = "No elements need merging";

/// Parse `ls-tree -v` rows: `id kind featuretype path ... size`.
///
/// Rows of any other kind are skipped.
pub fn parse_listing(lines: &[String]) -> Result<Vec<ListingEntry>, ParseError> {
    let mut entries = Vec::new();
    for line in lines.iter().filter(|l| !l.is_empty()) {
        let tokens: Vec<&str> = line.split(' ').collect();
        if tokens.len() < 4 {
            return Err(ParseError::malformed("listing", line));
        }
        let kind = match tokens[1] {
            "feature" => EntryKind::Feature,
            "tree" => EntryKind::Tree,
            _ => continue,
        };
        let size = match kind {
            EntryKind::Tree => tokens.get(5).and_then(|t| t.parse().ok()),
            EntryKind::Feature => None,
        };
        entries.push(ListingEntry {
            kind,
            path: tokens[3].to_string(),
            size,
        });
    }
    Ok(entries)
}

/// Parse `diff-tree` rows: `path... oldid newid`.
///
/// The path may contain spaces; the last two columns are always the ids.
/// Engine order is preserved.
pub fn parse_diff(lines: &[String], old_ref: &str, new_ref: &str) -> Result<Vec<DiffEntry>, ParseError> {
    let mut entries = Vec::new();
    for line in lines.iter().filter(|l| !l.trim().is_empty()) {
        let tokens: Vec<&str> = line.trim().split(' ').collect();
        let n = tokens.len();
        if n < 3 {
            return Err(ParseError::malformed("diff", line));
        }
        entries.push(DiffEntry {
            path: tokens[..n - 2].join(" "),
            old_id: object_id("diff", tokens[n - 2])?,
            new_id: object_id("diff", tokens[n - 1])?,
            old_ref: old_ref.to_string(),
            new_ref: new_ref.to_string(),
        });
    }
    Ok(entries)
}

/// Parse `diff-tree --tree-stats` rows: `path added removed modified`.
///
/// Rows with any other column count are skipped.
pub fn parse_tree_stats(lines: &[String]) -> Result<Vec<PathStats>, ParseError> {
    let mut stats = Vec::new();
    for line in lines {
        let tokens: Vec<&str> = line.split(' ').collect();
        if tokens.len() != 4 {
            continue;
        }
        let count = |t: &str| {
            t.parse::<u64>()
                .map_err(|_| ParseError::malformed("tree stats", line))
        };
        stats.push(PathStats {
            path: tokens[0].to_string(),
            added: count(tokens[1])?,
            removed: count(tokens[2])?,
            modified: count(tokens[3])?,
        });
    }
    Ok(stats)
}

/// Parse `show-ref` rows (`id refname`) under `prefix`, keyed by the name
/// with the prefix removed.
///
/// ```
/// use geogig_porcelain::parse::listing::parse_refs;
///
/// let lines = vec![
///     "4f1c6a25e71cb4a1fe17e7ad11ec4c6f5d6d10f0 refs/heads/master".to_string(),
///     "0c5a7b0e8f7d6c5b4a3928171615141312111009 refs/tags/v1".to_string(),
/// ];
/// let branches = parse_refs(&lines, "refs/heads/").unwrap();
/// assert_eq!(branches.keys().collect::<Vec<_>>(), vec!["master"]);
/// ```
pub fn parse_refs(lines: &[String], prefix: &str) -> Result<BTreeMap<String, ObjectId>, ParseError> {
    let mut refs = BTreeMap::new();
    for line in lines.iter().filter(|l| !l.trim().is_empty()) {
        let (id, name) = line
            .trim()
            .split_once(' ')
            .ok_or_else(|| ParseError::malformed("ref", line))?;
        if let Some(short) = name.strip_prefix(prefix) {
            refs.insert(short.to_string(), object_id("ref", id)?);
        }
    }
    Ok(refs)
}

/// Parse `remote list -v` rows: `name url (direction)`.
///
/// A remote appears once per direction; the first url seen wins.
pub fn parse_remotes(lines: &[String]) -> BTreeMap<String, String> {
    let mut remotes = BTreeMap::new();
    for line in lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if let [name, url, _] = tokens.as_slice() {
            remotes
                .entry(name.to_string())
                .or_insert_with(|| url.to_string());
        }
    }
    remotes
}

/// Parse `conflicts --refspecs-only` rows: `path base ours theirs`.
///
/// Each id column may carry a suffix after the 40 id characters.
pub fn parse_conflicts(lines: &[String]) -> Result<Vec<ConflictRecord>, ParseError> {
    let mut conflicts = Vec::new();
    for line in lines.iter().filter(|l| !l.trim().is_empty()) {
        if line.starts_with(NO_CONFLICTS) {
            return Ok(Vec::new());
        }
        let tokens: Vec<&str> = line.split(' ').collect();
        if tokens.len() < 4 {
            return Err(ParseError::malformed("conflict", line));
        }
        let id = |t: &str| object_id("conflict", t.get(..ObjectId::LEN).unwrap_or(t));
        conflicts.push(ConflictRecord {
            path: tokens[0].to_string(),
            base: id(tokens[1])?,
            ours: id(tokens[2])?,
            theirs: id(tokens[3])?,
        });
    }
    Ok(conflicts)
}

/// Parse `blame --porcelain` rows.
///
/// Columns: attribute, commit id, author name, three more author and
/// committer columns, then the value (which may contain spaces).
pub fn parse_blame(lines: &[String]) -> Result<Vec<BlameEntry>, ParseError> {
    let mut entries = Vec::new();
    for line in lines.iter().filter(|l| !l.is_empty()) {
        let tokens: Vec<&str> = line.split(' ').collect();
        if tokens.len() < 6 {
            return Err(ParseError::malformed("blame", line));
        }
        entries.push(BlameEntry {
            attribute: tokens[0].to_string(),
            commit: object_id("blame", tokens[1])?,
            author: tokens[2].to_string(),
            value: tokens.get(6..).map(|v| v.join(" ")).unwrap_or_default(),
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChangeKind;

    const A: &str = "4f1c6a25e71cb4a1fe17e7ad11ec4c6f5d6d10f0";
    const B: &str = "0c5a7b0e8f7d6c5b4a3928171615141312111009";
    const Z: &str = "0000000000000000000000000000000000000000";

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    mod listing {
        use super::*;

        #[test]
        fn classifies_by_kind_column() {
            let output = lines(&[
                &format!("{A} tree {B} parks 0 12"),
                &format!("{B} feature {A} parks/1 0"),
                "",
                &format!("{B} other {A} odd"),
            ]);
            let entries = parse_listing(&output).unwrap();
            assert_eq!(entries.len(), 2);
            assert_eq!(entries[0].kind, EntryKind::Tree);
            assert_eq!(entries[0].size, Some(12));
            assert_eq!(entries[1].kind, EntryKind::Feature);
            assert_eq!(entries[1].path, "parks/1");
            assert_eq!(entries[1].size, None);
        }

        #[test]
        fn unreadable_size_is_none() {
            let output = lines(&[&format!("{A} tree {B} roads 0 many")]);
            assert_eq!(parse_listing(&output).unwrap()[0].size, None);
        }

        #[test]
        fn short_row_is_malformed() {
            assert!(parse_listing(&lines(&["x tree"])).is_err());
        }
    }

    mod diff {
        use super::*;

        #[test]
        fn keeps_engine_order_and_spaces_in_paths() {
            let output = lines(&[
                &format!("parks/5 {A} {B}"),
                &format!("new roads/1 {Z} {A}"),
                &format!("parks/2 {B} {Z} "),
            ]);
            let entries = parse_diff(&output, "HEAD~1", "HEAD").unwrap();
            let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
            assert_eq!(paths, vec!["parks/5", "new roads/1", "parks/2"]);
            assert_eq!(entries[0].kind(), ChangeKind::Modified);
            assert_eq!(entries[1].kind(), ChangeKind::Added);
            assert_eq!(entries[2].kind(), ChangeKind::Removed);
            assert_eq!(entries[0].old_ref, "HEAD~1");
        }

        #[test]
        fn bad_id_is_malformed() {
            let output = lines(&["parks/5 abc def"]);
            assert!(parse_diff(&output, "a", "b").is_err());
        }
    }

    #[test]
    fn tree_stats_rows() {
        let output = lines(&["parks 1 0 3", "summary line", "roads 0 2 0"]);
        let stats = parse_tree_stats(&output).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(
            (stats[0].added, stats[0].removed, stats[0].modified),
            (1, 0, 3)
        );
        assert_eq!(stats[1].path, "roads");
    }

    #[test]
    fn refs_by_prefix() {
        let output = lines(&[
            &format!("{A} refs/heads/master"),
            &format!("{B} refs/heads/conflicted"),
            &format!("{B} refs/tags/v1.0"),
            &format!("{A} refs/remotes/origin/master"),
        ]);
        let branches = parse_refs(&output, "refs/heads/").unwrap();
        assert_eq!(branches.len(), 2);
        assert_eq!(branches["conflicted"].as_str(), B);

        let tags = parse_refs(&output, "refs/tags/").unwrap();
        assert_eq!(tags.keys().collect::<Vec<_>>(), vec!["v1.0"]);
    }

    #[test]
    fn remotes_first_seen_wins() {
        let output = lines(&[
            "origin file:/data/upstream (fetch)",
            "origin file:/data/other (push)",
            "mirror http://example.org/repo (fetch)",
            "garbage",
        ]);
        let remotes = parse_remotes(&output);
        assert_eq!(remotes.len(), 2);
        assert_eq!(remotes["origin"], "file:/data/upstream");
    }

    mod conflicts {
        use super::*;

        #[test]
        fn truncates_id_columns() {
            let output = lines(&[&format!("parks/5 {A}:base {B}ours {A}")]);
            let records = parse_conflicts(&output).unwrap();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].path, "parks/5");
            assert_eq!(records[0].base.as_str(), A);
            assert_eq!(records[0].ours.as_str(), B);
        }

        #[test]
        fn sentinel_means_none() {
            let output = lines(&["No elements need merging."]);
            assert!(parse_conflicts(&output).unwrap().is_empty());
        }
    }

    #[test]
    fn blame_value_keeps_spaces() {
        let output = lines(&[&format!(
            "name {A} Ana ana@example.org 1389110400000 0 Central Park"
        )]);
        let entries = parse_blame(&output).unwrap();
        assert_eq!(entries[0].attribute, "name");
        assert_eq!(entries[0].author, "Ana");
        assert_eq!(entries[0].value, "Central Park");
        assert_eq!(entries[0].commit.as_str(), A);
    }
}
