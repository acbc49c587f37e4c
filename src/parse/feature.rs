//! parse::feature
//!
//! Multi-line feature layouts.
//!
//! `show --raw ref:path` prints two header lines followed by one group of
//! three lines per attribute:
//!
//! ```text
//! FEATURE
//! 5a0b...
//! name
//! STRING
//! Central Park
//! the_geom
//! MULTIPOLYGON EPSG:4326
//! MULTIPOLYGON (((0 0, 1 0, 1 1, 0 0)))
//! ```
//!
//! With several refspecs the blocks are separated by blank lines and each
//! block starts with the refspec and the object id instead.

use std::collections::HashMap;

use super::ParseError;
use crate::core::value::{decode, TypeTag, Value};
use crate::model::{Attribute, AttributeDelta, FeatureChanges, FeatureData, FeatureType};

/// Parse name/type/value triples. A trailing incomplete group is dropped.
pub fn parse_attributes(lines: &[String]) -> FeatureData {
    let attributes = lines
        .chunks_exact(3)
        .map(|group| {
            let tag = TypeTag::parse(&group[1]);
            Attribute {
                name: group[0].clone(),
                value: decode(&group[2], &tag),
                tag,
            }
        })
        .collect();
    FeatureData::new(attributes)
}

/// Parse the output of `show --raw ref:path`.
pub fn parse_feature_data(lines: &[String]) -> FeatureData {
    parse_attributes(lines.get(2..).unwrap_or_default())
}

/// Parse the output of `show --raw ref:path ref:path ...`, keyed by refspec.
pub fn parse_batched(lines: &[String]) -> HashMap<String, FeatureData> {
    let mut features = HashMap::new();
    let mut name: Option<&str> = None;
    let mut block: Vec<String> = Vec::new();
    let mut iter = lines.iter();

    while let Some(line) = iter.next() {
        if line.is_empty() {
            if let Some(name) = name.take() {
                features.insert(name.to_string(), parse_attributes(&block));
            }
            block.clear();
        } else if name.is_none() {
            name = Some(line.as_str());
            // object id line
            iter.next();
        } else {
            block.push(line.clone());
        }
    }
    if let Some(name) = name {
        features.insert(name.to_string(), parse_attributes(&block));
    }
    features
}

/// Feature type id of a tree, from the output of `show ref:path`.
///
/// The fourth line ends with the id.
pub fn feature_type_id(lines: &[String]) -> Result<String, ParseError> {
    let line = lines
        .get(3)
        .ok_or(ParseError::Truncated { what: "tree" })?;
    line.split(' ')
        .last()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ParseError::malformed("tree", line))
}

/// Parse the output of `show <featuretype id>`: after three header lines,
/// one `name: [TYPE]` line per attribute, in declaration order.
pub fn parse_feature_type(lines: &[String]) -> Result<FeatureType, ParseError> {
    let mut fields = FeatureType::default();
    for line in lines.iter().skip(3).filter(|l| !l.trim().is_empty()) {
        let (name, tag) = line
            .split_once(':')
            .ok_or_else(|| ParseError::malformed("feature type", line))?;
        let tag = tag.trim();
        let tag = tag
            .strip_prefix('[')
            .and_then(|t| t.strip_suffix(']'))
            .unwrap_or(tag);
        fields.push(name.trim(), TypeTag::parse(tag));
    }
    Ok(fields)
}

/// Number of features under a tree, from the output of `show ref:path`.
///
/// The second line reads `Size: <n>`.
pub fn parse_count(lines: &[String]) -> Result<u64, ParseError> {
    let line = lines
        .get(1)
        .ok_or(ParseError::Truncated { what: "tree" })?;
    line.get(5..)
        .and_then(|n| n.trim().parse().ok())
        .ok_or_else(|| ParseError::malformed("tree size", line))
}

/// Parse `diff-tree --describe` output.
///
/// Each block starts with the feature path, followed by one change line
/// (`M|A|R|U attribute`) per attribute. A modification carries two value
/// lines (old, new); the others carry one. Value lines may be blank, so
/// they are consumed by position rather than by content. Blocks are
/// separated by blank lines.
///
/// Changes come back in the order of `fields`; attributes the engine did
/// not describe are left out.
pub fn parse_describe(lines: &[String], fields: &FeatureType) -> Result<Vec<FeatureChanges>, ParseError> {
    let mut features = Vec::new();
    let mut current: Option<(String, HashMap<String, AttributeDelta>)> = None;
    let mut i = 0;

    let value_at = |i: usize, name: &str| -> Result<Value, ParseError> {
        let raw = lines
            .get(i)
            .ok_or(ParseError::Truncated { what: "describe" })?;
        let tag = fields.get(name).cloned().unwrap_or(TypeTag::String);
        Ok(decode(raw, &tag))
    };

    while i < lines.len() {
        let line = &lines[i];
        if line.is_empty() {
            if let Some((path, changes)) = current.take() {
                features.push(ordered(path, changes, fields));
            }
        } else if let Some((_, changes)) = current.as_mut() {
            let (marker, name) = line
                .split_once(' ')
                .ok_or_else(|| ParseError::malformed("describe", line))?;
            let delta = match marker {
                "M" => {
                    let old = value_at(i + 1, name)?;
                    let new = value_at(i + 2, name)?;
                    i += 2;
                    AttributeDelta::Modified { old, new }
                }
                "A" | "R" | "U" => {
                    let value = value_at(i + 1, name)?;
                    i += 1;
                    match marker {
                        "A" => AttributeDelta::Added(value),
                        "R" => AttributeDelta::Removed(value),
                        _ => AttributeDelta::Unchanged(value),
                    }
                }
                _ => return Err(ParseError::malformed("describe", line)),
            };
            changes.insert(name.to_string(), delta);
        } else {
            current = Some((line.clone(), HashMap::new()));
        }
        i += 1;
    }
    if let Some((path, changes)) = current {
        features.push(ordered(path, changes, fields));
    }
    Ok(features)
}

fn ordered(path: String, mut changes: HashMap<String, AttributeDelta>, fields: &FeatureType) -> FeatureChanges {
    let changes = fields
        .names()
        .filter_map(|name| changes.remove(name).map(|d| (name.to_string(), d)))
        .collect();
    FeatureChanges { path, changes }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn park(area: &str) -> Vec<String> {
        lines(&[
            "name",
            "STRING",
            "Central Park",
            "area",
            "DOUBLE",
            area,
            "the_geom",
            "MULTIPOLYGON EPSG:4326",
            "MULTIPOLYGON (((0 0, 1 0, 1 1, 0 0)))",
        ])
    }

    mod attributes {
        use super::*;

        #[test]
        fn typed_values_in_order() {
            let data = parse_attributes(&park("15297.503295898438"));
            let names: Vec<_> = data.names().collect();
            assert_eq!(names, vec!["name", "area", "the_geom"]);
            assert_eq!(data.value("area"), Some(&Value::Double(15297.503295898438)));

            let (field, geom) = data.geometry().unwrap();
            assert_eq!(field, "the_geom");
            assert_eq!(geom.crs(), Some("EPSG:4326"));
        }

        #[test]
        fn incomplete_group_dropped() {
            let mut output = park("1");
            output.push("orphan".into());
            assert_eq!(parse_attributes(&output).len(), 3);
        }

        #[test]
        fn show_raw_skips_header() {
            let mut output = lines(&["FEATURE", "5a0b0c0d0e0f00112233445566778899aabbccdd"]);
            output.extend(park("2"));
            assert_eq!(parse_feature_data(&output).len(), 3);
            assert!(parse_feature_data(&output[..1]).is_empty());
        }

        #[test]
        fn null_token() {
            let data = parse_attributes(&lines(&["owner", "STRING", "[NULL]"]));
            assert_eq!(data.value("owner"), Some(&Value::Null));
        }
    }

    #[test]
    fn batched_blocks_keyed_by_refspec() {
        let mut output = lines(&["abc:parks/5", "5a0b"]);
        output.extend(park("1"));
        output.push(String::new());
        output.extend(lines(&["def:parks/5", "6c1d"]));
        output.extend(park("2"));

        let features = parse_batched(&output);
        assert_eq!(features.len(), 2);
        assert_eq!(features["abc:parks/5"].value("area"), Some(&Value::Double(1.0)));
        assert_eq!(features["def:parks/5"].value("area"), Some(&Value::Double(2.0)));
    }

    #[test]
    fn feature_type_lines() {
        let output = lines(&[
            "FEATURE_TYPE",
            "ID: 7d2c",
            "",
            "name: [STRING]",
            "area: [DOUBLE]",
            "the_geom: [MULTIPOLYGON EPSG:4326]",
        ]);
        let ftype = parse_feature_type(&output).unwrap();
        assert_eq!(ftype.len(), 3);
        assert_eq!(ftype.get("area"), Some(&TypeTag::Double));
        assert!(ftype.get("the_geom").unwrap().is_geometry());
    }

    #[test]
    fn tree_show_lines() {
        let output = lines(&[
            "TREE ID: 1a2b",
            "Size: 42",
            "Number of subtrees: 0",
            "DEFAULT FEATURE TYPE ID: 7d2c9e",
        ]);
        assert_eq!(parse_count(&output).unwrap(), 42);
        assert_eq!(feature_type_id(&output).unwrap(), "7d2c9e");
        assert!(parse_count(&output[..1]).is_err());
        assert!(feature_type_id(&output[..2]).is_err());
    }

    mod describe {
        use super::*;

        fn fields() -> FeatureType {
            let mut ftype = FeatureType::default();
            ftype.push("name", TypeTag::String);
            ftype.push("area", TypeTag::Double);
            ftype
        }

        #[test]
        fn blocks_in_feature_type_order() {
            let output = lines(&[
                "parks/5",
                "M area",
                "15297.503295898438",
                "15246.59765625",
                "U name",
                "Central Park",
                "",
                "parks/9",
                "A name",
                "",
                "A area",
                "3",
            ]);
            let features = parse_describe(&output, &fields()).unwrap();
            assert_eq!(features.len(), 2);

            let first = &features[0];
            assert_eq!(first.path, "parks/5");
            assert_eq!(first.changes[0].0, "name");
            assert_eq!(
                first.changes[1].1,
                AttributeDelta::Modified {
                    old: Value::Double(15297.503295898438),
                    new: Value::Double(15246.59765625),
                }
            );

            // the blank value line belongs to the attribute, not the block
            let second = &features[1];
            assert_eq!(second.changes[0].1, AttributeDelta::Added(Value::String(String::new())));
            assert_eq!(second.changes[1].1, AttributeDelta::Added(Value::Double(3.0)));
        }

        #[test]
        fn truncated_modification() {
            let output = lines(&["parks/5", "M area", "1"]);
            assert_eq!(
                parse_describe(&output, &fields()).unwrap_err(),
                ParseError::Truncated { what: "describe" }
            );
        }

        #[test]
        fn unknown_marker() {
            let output = lines(&["parks/5", "X area", "1"]);
            assert!(parse_describe(&output, &fields()).is_err());
        }
    }
}
