//! core::value
//!
//! Conversion between the engine's textual attribute values and typed values.
//!
//! # Type tags
//!
//! Every attribute travels with a type tag:
//!
//! | Tag | Decodes to |
//! |---|---|
//! | `BOOLEAN` | [`Value::Boolean`] |
//! | `BYTE`, `SHORT`, `INTEGER`, `LONG` | [`Value::Integer`] |
//! | `FLOAT`, `DOUBLE` | [`Value::Double`] |
//! | `POINT` ... `MULTIPOLYGON`, optionally followed by a CRS | [`Value::Geometry`] |
//! | `STRING` and anything else | [`Value::String`] |
//!
//! The literal `[NULL]` decodes to [`Value::Null`] whatever the tag.
//!
//! # Lenient decoding
//!
//! [`decode`] never fails. When the text does not parse as the declared type
//! the raw text comes back as [`Value::String`].

use serde::{Serialize, Serializer};

use super::wkt::{self, GeometryKind, WktError};

/// Wire token for a null attribute.
pub const NULL_TOKEN: &str = "[NULL]";

/// An attribute type as declared by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    /// A geometry type with an optional CRS identifier (`MULTIPOLYGON EPSG:4326`).
    Geometry {
        name: String,
        crs: Option<String>,
    },
    String,
    /// Any tag not listed above; values are kept as text.
    Other(String),
}

const GEOMETRY_TAGS: [&str; 6] = [
    "POINT",
    "LINESTRING",
    "POLYGON",
    "MULTIPOINT",
    "MULTILINESTRING",
    "MULTIPOLYGON",
];

impl TypeTag {
    /// Parse a type tag as printed by the engine.
    ///
    /// A tag with more than one space-separated token is a geometry whose
    /// trailing tokens name the CRS.
    ///
    /// ```
    /// use geogig_porcelain::core::value::TypeTag;
    ///
    /// assert_eq!(TypeTag::parse("DOUBLE"), TypeTag::Double);
    /// assert_eq!(
    ///     TypeTag::parse("MULTIPOLYGON EPSG:4326"),
    ///     TypeTag::Geometry { name: "MULTIPOLYGON".into(), crs: Some("EPSG:4326".into()) }
    /// );
    /// ```
    pub fn parse(tag: &str) -> Self {
        let tag = tag.trim();
        let mut tokens = tag.split(' ').filter(|t| !t.is_empty());
        let head = tokens.next().unwrap_or_default();
        let rest: Vec<&str> = tokens.collect();

        if !rest.is_empty() || GEOMETRY_TAGS.contains(&head) {
            return TypeTag::Geometry {
                name: head.to_string(),
                crs: (!rest.is_empty()).then(|| rest.join(" ")),
            };
        }

        match head {
            "BOOLEAN" => TypeTag::Boolean,
            "BYTE" => TypeTag::Byte,
            "SHORT" => TypeTag::Short,
            "INTEGER" => TypeTag::Integer,
            "LONG" => TypeTag::Long,
            "FLOAT" => TypeTag::Float,
            "DOUBLE" => TypeTag::Double,
            "STRING" => TypeTag::String,
            other => TypeTag::Other(other.to_string()),
        }
    }

    /// Whether values of this type are geometries.
    pub fn is_geometry(&self) -> bool {
        matches!(self, TypeTag::Geometry { .. })
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeTag::Boolean => write!(f, "BOOLEAN"),
            TypeTag::Byte => write!(f, "BYTE"),
            TypeTag::Short => write!(f, "SHORT"),
            TypeTag::Integer => write!(f, "INTEGER"),
            TypeTag::Long => write!(f, "LONG"),
            TypeTag::Float => write!(f, "FLOAT"),
            TypeTag::Double => write!(f, "DOUBLE"),
            TypeTag::Geometry { name, crs: None } => write!(f, "{name}"),
            TypeTag::Geometry {
                name,
                crs: Some(crs),
            } => write!(f, "{name} {crs}"),
            TypeTag::String => write!(f, "STRING"),
            TypeTag::Other(tag) => write!(f, "{tag}"),
        }
    }
}

impl Serialize for TypeTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A geometry value.
///
/// Holds the WKT as received plus its canonical form. Two geometries are
/// equal when their canonical forms are equal; the CRS is carried as
/// metadata and does not take part in equality.
#[derive(Debug, Clone)]
pub struct Geometry {
    wkt: String,
    canonical: String,
    kind: GeometryKind,
    crs: Option<String>,
}

impl Geometry {
    /// Build a geometry from WKT, attaching an optional CRS identifier.
    pub fn from_wkt(wkt: impl Into<String>, crs: Option<String>) -> Result<Self, WktError> {
        let wkt = wkt.into();
        let canonical = wkt::canonicalize(&wkt)?;
        Ok(Self {
            wkt,
            canonical: canonical.text,
            kind: canonical.kind,
            crs,
        })
    }

    /// The WKT text as received.
    pub fn wkt(&self) -> &str {
        &self.wkt
    }

    /// The canonical WKT text used for comparisons.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    pub fn crs(&self) -> Option<&str> {
        self.crs.as_deref()
    }
}

impl PartialEq for Geometry {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl std::fmt::Display for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wkt)
    }
}

impl Serialize for Geometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.wkt)
    }
}

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Geometry(Geometry),
    String(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_geometry(&self) -> Option<&Geometry> {
        match self {
            Value::Geometry(g) => Some(g),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&encode(self))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Geometry> for Value {
    fn from(g: Geometry) -> Self {
        Value::Geometry(g)
    }
}

/// Decode a raw value according to its type tag. Never fails.
///
/// ```
/// use geogig_porcelain::core::value::{decode, TypeTag, Value};
///
/// assert_eq!(decode("15297.503295898438", &TypeTag::Double), Value::Double(15297.503295898438));
/// assert_eq!(decode("[NULL]", &TypeTag::Integer), Value::Null);
/// // malformed input keeps the raw text
/// assert_eq!(decode("n/a", &TypeTag::Integer), Value::String("n/a".into()));
/// ```
pub fn decode(raw: &str, tag: &TypeTag) -> Value {
    if raw == NULL_TOKEN {
        return Value::Null;
    }
    let fallback = || Value::String(raw.to_string());

    match tag {
        TypeTag::Boolean => match raw.trim() {
            t if t.eq_ignore_ascii_case("true") => Value::Boolean(true),
            t if t.eq_ignore_ascii_case("false") => Value::Boolean(false),
            _ => fallback(),
        },
        TypeTag::Byte | TypeTag::Short | TypeTag::Integer | TypeTag::Long => {
            raw.trim().parse().map(Value::Integer).unwrap_or_else(|_| fallback())
        }
        TypeTag::Float | TypeTag::Double => {
            raw.trim().parse().map(Value::Double).unwrap_or_else(|_| fallback())
        }
        TypeTag::Geometry { crs, .. } => Geometry::from_wkt(raw, crs.clone())
            .map(Value::Geometry)
            .unwrap_or_else(|_| fallback()),
        TypeTag::String | TypeTag::Other(_) => fallback(),
    }
}

/// Decode with a tag given as wire text.
pub fn decode_tagged(raw: &str, tag: &str) -> Value {
    decode(raw, &TypeTag::parse(tag))
}

/// Encode a value as the engine expects it on input.
///
/// Integral doubles print without a fractional part (`15.0` -> `15`).
pub fn encode(value: &Value) -> String {
    match value {
        Value::Null => NULL_TOKEN.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Double(d) => d.to_string(),
        Value::Geometry(g) => g.wkt().to_string(),
        Value::String(s) => s.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_scalar_tags() {
        assert_eq!(TypeTag::parse("BOOLEAN"), TypeTag::Boolean);
        assert_eq!(TypeTag::parse("LONG"), TypeTag::Long);
        assert_eq!(TypeTag::parse("FLOAT"), TypeTag::Float);
        assert_eq!(TypeTag::parse("STRING"), TypeTag::String);
        assert_eq!(TypeTag::parse("DATE"), TypeTag::Other("DATE".into()));
    }

    #[test]
    fn parse_geometry_tags() {
        assert_eq!(
            TypeTag::parse("POINT"),
            TypeTag::Geometry {
                name: "POINT".into(),
                crs: None
            }
        );
        let tag = TypeTag::parse("MULTIPOLYGON EPSG:23030");
        assert!(tag.is_geometry());
        assert_eq!(tag.to_string(), "MULTIPOLYGON EPSG:23030");
    }

    #[test]
    fn decode_booleans() {
        assert_eq!(decode("true", &TypeTag::Boolean), Value::Boolean(true));
        assert_eq!(decode("TRUE", &TypeTag::Boolean), Value::Boolean(true));
        assert_eq!(decode("false", &TypeTag::Boolean), Value::Boolean(false));
        assert_eq!(decode("False", &TypeTag::Boolean), Value::Boolean(false));
    }

    #[test]
    fn malformed_boolean_keeps_raw_text() {
        assert_eq!(decode("maybe", &TypeTag::Boolean), Value::String("maybe".into()));
        assert_eq!(decode("", &TypeTag::Boolean), Value::String(String::new()));
    }

    #[test]
    fn decode_integers_of_every_width() {
        for tag in [TypeTag::Byte, TypeTag::Short, TypeTag::Integer, TypeTag::Long] {
            assert_eq!(decode("42", &tag), Value::Integer(42));
        }
        assert_eq!(decode("-7", &TypeTag::Long), Value::Integer(-7));
    }

    #[test]
    fn decode_doubles() {
        assert_eq!(
            decode("15246.59765625", &TypeTag::Double),
            Value::Double(15246.59765625)
        );
        assert_eq!(decode("1.5", &TypeTag::Float), Value::Double(1.5));
    }

    #[test]
    fn decode_geometry_keeps_crs_as_metadata() {
        let tag = TypeTag::parse("POINT EPSG:4326");
        let value = decode("POINT (1 2)", &tag);
        let geom = value.as_geometry().expect("geometry");
        assert_eq!(geom.crs(), Some("EPSG:4326"));
        assert_eq!(geom.wkt(), "POINT (1 2)");
        assert_eq!(geom.kind(), GeometryKind::Point);
    }

    #[test]
    fn geometry_equality_is_canonical() {
        let a = Geometry::from_wkt("POINT (1 2)", None).unwrap();
        let b = Geometry::from_wkt("POINT(1.0 2.0)", Some("EPSG:4326".into())).unwrap();
        assert_eq!(a, b);
        assert_eq!(Value::Geometry(a), Value::Geometry(b));
    }

    #[test]
    fn lenient_fallback_to_string() {
        assert_eq!(
            decode("abc", &TypeTag::Double),
            Value::String("abc".into())
        );
        assert_eq!(
            decode("not wkt", &TypeTag::parse("POLYGON")),
            Value::String("not wkt".into())
        );
        assert_eq!(decode("x", &TypeTag::Other("UUID".into())), Value::String("x".into()));
    }

    #[test]
    fn null_token_for_any_tag() {
        assert_eq!(decode(NULL_TOKEN, &TypeTag::Boolean), Value::Null);
        assert_eq!(decode(NULL_TOKEN, &TypeTag::parse("POINT")), Value::Null);
        assert_eq!(decode(NULL_TOKEN, &TypeTag::String), Value::Null);
    }

    #[test]
    fn encode_values() {
        assert_eq!(encode(&Value::Double(15.0)), "15");
        assert_eq!(encode(&Value::Double(15246.59765625)), "15246.59765625");
        assert_eq!(encode(&Value::Integer(3)), "3");
        assert_eq!(encode(&Value::Boolean(false)), "false");
        assert_eq!(encode(&Value::Null), NULL_TOKEN);
        let g = Geometry::from_wkt("POINT (1 2)", None).unwrap();
        assert_eq!(encode(&Value::Geometry(g)), "POINT (1 2)");
    }

    #[test]
    fn serialize_untagged() {
        let json = serde_json::to_string(&Value::Double(1.5)).unwrap();
        assert_eq!(json, "1.5");
        let json = serde_json::to_string(&Value::Null).unwrap();
        assert_eq!(json, "null");
    }
}
