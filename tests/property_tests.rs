//! Property-based tests for the value codec and WKT canonicalisation.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use proptest::prelude::*;

use geogig_porcelain::core::types::{BranchName, ObjectId};
use geogig_porcelain::core::value::{decode, encode, TypeTag, Value, NULL_TOKEN};
use geogig_porcelain::core::wkt::{canonicalize, GeometryKind};
use geogig_porcelain::parse::listing::parse_diff;

/// Strategy for generating valid hex ids.
fn valid_id_string() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec![
            '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f',
        ]),
        40,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// A coordinate written in one of several equivalent spellings.
fn spelled(n: i32, style: u8) -> String {
    match style % 3 {
        0 => n.to_string(),
        1 => format!("{}.0", n),
        _ => format!("{}.000", n),
    }
}

/// Whitespace between tokens: none, one space, or a run of blanks.
fn gap(style: u8) -> &'static str {
    match style % 3 {
        0 => "",
        1 => " ",
        _ => "  \t ",
    }
}

fn point_list(points: &[(i32, i32)], style: u8) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{} {}", spelled(*x, style), spelled(*y, style.wrapping_add(1))))
        .collect::<Vec<_>>()
        .join(&format!(",{}", gap(style)))
}

proptest! {
    /// Integers survive encode then decode.
    #[test]
    fn integer_codec(n in any::<i64>()) {
        let value = Value::Integer(n);
        prop_assert_eq!(decode(&encode(&value), &TypeTag::Long), value);
    }

    /// Finite doubles survive encode then decode exactly.
    #[test]
    fn double_codec(d in any::<f64>().prop_filter("finite", |d| d.is_finite())) {
        let value = Value::Double(d);
        prop_assert_eq!(decode(&encode(&value), &TypeTag::Double), value);
    }

    /// Decoding never fails: text that is not a number stays text.
    #[test]
    fn decode_is_total(raw in "\\PC*", tag in prop::sample::select(vec!["INTEGER", "DOUBLE", "BOOLEAN", "POINT", "DATE"])) {
        let value = decode(&raw, &TypeTag::parse(tag));
        if raw == NULL_TOKEN {
            prop_assert_eq!(value, Value::Null);
        }
    }

    /// Strings decode to themselves under the string tag.
    #[test]
    fn string_decode_identity(raw in "\\PC*") {
        prop_assume!(raw != NULL_TOKEN);
        prop_assert_eq!(decode(&raw, &TypeTag::String), Value::String(raw.clone()));
    }

    /// Spacing, keyword case and number spelling do not change a line's
    /// canonical form.
    #[test]
    fn linestring_canonical_form(
        points in prop::collection::vec((-1000i32..1000, -1000i32..1000), 2..8),
        a in any::<u8>(),
        b in any::<u8>(),
    ) {
        let first = format!("LINESTRING{}({})", gap(a), point_list(&points, a));
        let second = format!("linestring{}({})", gap(b), point_list(&points, b));

        let left = canonicalize(&first).unwrap();
        let right = canonicalize(&second).unwrap();
        prop_assert_eq!(left.kind, GeometryKind::LineString);
        prop_assert_eq!(&left, &right);
        // canonical text is a fixed point
        prop_assert_eq!(canonicalize(&left.text).unwrap(), left);
    }

    /// Different coordinates give different canonical forms.
    #[test]
    fn distinct_points_differ(x in -1000i32..1000, y in -1000i32..1000, dx in 1i32..10) {
        let a = canonicalize(&format!("POINT ({} {})", x, y)).unwrap();
        let b = canonicalize(&format!("POINT ({} {})", x + dx, y)).unwrap();
        prop_assert_ne!(a, b);
    }

    /// Ids are normalized to lowercase.
    #[test]
    fn id_normalized_to_lowercase(id in valid_id_string()) {
        let upper = id.to_uppercase();
        let parsed = ObjectId::new(&upper).unwrap();
        prop_assert_eq!(parsed.as_str(), id.as_str());
        prop_assert!(ObjectId::is_canonical(parsed.as_str()));
    }

    /// Ids of any other length are rejected.
    #[test]
    fn short_ids_rejected(id in "[0-9a-f]{0,39}") {
        prop_assert!(ObjectId::new(id).is_err());
    }

    /// Branch names with a blank are always rejected.
    #[test]
    fn branch_names_with_blanks_rejected(left in "[a-z]{1,10}", right in "[a-z]{1,10}") {
        let name = format!("{} {}", left, right);
        prop_assert!(BranchName::new(name).is_err());
    }

    /// Diff rows keep paths with spaces and take the last two columns as ids.
    #[test]
    fn diff_rows_split_from_the_right(
        words in prop::collection::vec("[a-z0-9]{1,8}", 1..4),
        old in valid_id_string(),
        new in valid_id_string(),
    ) {
        let path = words.join(" ");
        let line = format!("{} {} {}", path, old, new);
        let entries = parse_diff(&[line], "HEAD~1", "HEAD").unwrap();
        prop_assert_eq!(entries.len(), 1);
        prop_assert_eq!(&entries[0].path, &path);
        prop_assert_eq!(entries[0].new_id.as_str(), new.as_str());
    }

    /// Parsing arbitrary diff output never panics.
    #[test]
    fn diff_parser_never_panics(lines in prop::collection::vec("\\PC*", 0..5)) {
        let _ = parse_diff(&lines, "a", "b");
    }
}
