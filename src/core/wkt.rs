//! core::wkt
//!
//! Well-known-text reading for geometry attributes.
//!
//! The engine prints geometries as WKT, and two encodings of the same shape
//! can differ in whitespace, keyword case or number formatting
//! (`POINT (1 2)` vs `point(1.0 2.0)`). Geometry equality is defined on the
//! canonical form produced here, never on the raw text.
//!
//! Canonical form:
//! - keywords upper-case, followed directly by `(`
//! - numbers re-printed from their `f64` value (`1.0` -> `1`, `-0` -> `0`)
//! - single space between ordinates, no space around commas
//! - `MULTIPOINT` members always parenthesised

use std::fmt::Write as _;
use std::iter::Peekable;
use std::vec::IntoIter;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from reading WKT.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WktError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),

    #[error("unknown geometry type '{0}'")]
    UnknownType(String),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("coordinate must have 2 to 4 ordinates, got {0}")]
    BadCoordinate(usize),
}

/// Geometry type named by the leading WKT keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
}

impl GeometryKind {
    /// Parse a WKT keyword (case-insensitive).
    pub fn from_keyword(word: &str) -> Option<Self> {
        let kind = match word.to_ascii_uppercase().as_str() {
            "POINT" => GeometryKind::Point,
            "LINESTRING" => GeometryKind::LineString,
            "POLYGON" => GeometryKind::Polygon,
            "MULTIPOINT" => GeometryKind::MultiPoint,
            "MULTILINESTRING" => GeometryKind::MultiLineString,
            "MULTIPOLYGON" => GeometryKind::MultiPolygon,
            "GEOMETRYCOLLECTION" => GeometryKind::GeometryCollection,
            _ => return None,
        };
        Some(kind)
    }

    /// The canonical WKT keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            GeometryKind::Point => "POINT",
            GeometryKind::LineString => "LINESTRING",
            GeometryKind::Polygon => "POLYGON",
            GeometryKind::MultiPoint => "MULTIPOINT",
            GeometryKind::MultiLineString => "MULTILINESTRING",
            GeometryKind::MultiPolygon => "MULTIPOLYGON",
            GeometryKind::GeometryCollection => "GEOMETRYCOLLECTION",
        }
    }
}

/// Result of canonicalising a WKT string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalWkt {
    /// The outermost geometry type.
    pub kind: GeometryKind,
    /// Canonical text.
    pub text: String,
}

/// Canonicalise a WKT string.
///
/// ```
/// use geogig_porcelain::core::wkt::{canonicalize, GeometryKind};
///
/// let a = canonicalize("POINT (1.0 2.50)").unwrap();
/// let b = canonicalize("point(1 2.5)").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.kind, GeometryKind::Point);
/// assert_eq!(a.text, "POINT(1 2.5)");
/// ```
pub fn canonicalize(input: &str) -> Result<CanonicalWkt, WktError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens: tokens.into_iter().peekable(),
    };
    let mut text = String::with_capacity(input.len());
    let kind = parser.geometry(&mut text)?;
    match parser.tokens.next() {
        None => Ok(CanonicalWkt { kind, text }),
        Some(tok) => Err(WktError::UnexpectedToken(tok.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Number(f64),
    Open,
    Close,
    Comma,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Word(w) => write!(f, "{w}"),
            Token::Number(n) => write!(f, "{n}"),
            Token::Open => write!(f, "("),
            Token::Close => write!(f, ")"),
            Token::Comma => write!(f, ","),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, WktError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            c if c.is_ascii_alphabetic() => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if !c.is_ascii_alphabetic() {
                        break;
                    }
                    end = i + c.len_utf8();
                    chars.next();
                }
                tokens.push(Token::Word(input[start..end].to_ascii_uppercase()));
            }
            c if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => {
                let mut end = start;
                let mut prev = c;
                while let Some(&(i, c)) = chars.peek() {
                    let exponent_sign = matches!(c, '-' | '+') && matches!(prev, 'e' | 'E');
                    let first = i == start;
                    if !(c.is_ascii_digit()
                        || c == '.'
                        || c == 'e'
                        || c == 'E'
                        || exponent_sign
                        || (first && matches!(c, '-' | '+')))
                    {
                        break;
                    }
                    prev = c;
                    end = i + c.len_utf8();
                    chars.next();
                }
                let raw = &input[start..end];
                let value: f64 = raw
                    .parse()
                    .map_err(|_| WktError::InvalidNumber(raw.to_string()))?;
                if !value.is_finite() {
                    return Err(WktError::InvalidNumber(raw.to_string()));
                }
                tokens.push(Token::Number(value));
            }
            other => return Err(WktError::UnexpectedChar(other)),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Peekable<IntoIter<Token>>,
}

impl Parser {
    fn next(&mut self) -> Result<Token, WktError> {
        self.tokens.next().ok_or(WktError::UnexpectedEnd)
    }

    fn expect(&mut self, expected: Token) -> Result<(), WktError> {
        let tok = self.next()?;
        if tok == expected {
            Ok(())
        } else {
            Err(WktError::UnexpectedToken(tok.to_string()))
        }
    }

    /// `KEYWORD [Z|M|ZM] (EMPTY | body)`
    fn geometry(&mut self, out: &mut String) -> Result<GeometryKind, WktError> {
        let word = match self.next()? {
            Token::Word(w) => w,
            other => return Err(WktError::UnexpectedToken(other.to_string())),
        };
        let kind = GeometryKind::from_keyword(&word).ok_or(WktError::UnknownType(word))?;
        out.push_str(kind.keyword());

        if let Some(Token::Word(dim)) = self.tokens.peek() {
            match dim.as_str() {
                "Z" | "M" | "ZM" => {
                    out.push(' ');
                    out.push_str(dim);
                    self.tokens.next();
                }
                "EMPTY" => {}
                other => return Err(WktError::UnexpectedToken(other.to_string())),
            }
        }

        if let Some(Token::Word(w)) = self.tokens.peek() {
            if w == "EMPTY" {
                self.tokens.next();
                out.push_str(" EMPTY");
                return Ok(kind);
            }
        }

        match kind {
            GeometryKind::Point => self.coordinate_group(out)?,
            GeometryKind::LineString => self.coordinate_list(out)?,
            GeometryKind::Polygon | GeometryKind::MultiLineString => {
                self.list(out, |p, out| p.coordinate_list(out))?
            }
            GeometryKind::MultiPolygon => self.list(out, |p, out| {
                p.list(out, |p, out| p.coordinate_list(out))
            })?,
            GeometryKind::MultiPoint => self.list(out, |p, out| {
                // both `MULTIPOINT (1 2, 3 4)` and `MULTIPOINT ((1 2), (3 4))`
                if matches!(p.tokens.peek(), Some(Token::Open)) {
                    p.coordinate_group(out)
                } else {
                    out.push('(');
                    p.coordinate(out)?;
                    out.push(')');
                    Ok(())
                }
            })?,
            GeometryKind::GeometryCollection => {
                self.list(out, |p, out| p.geometry(out).map(|_| ()))?
            }
        }

        Ok(kind)
    }

    /// `( item, item, ... )`
    fn list<F>(&mut self, out: &mut String, mut item: F) -> Result<(), WktError>
    where
        F: FnMut(&mut Self, &mut String) -> Result<(), WktError>,
    {
        self.expect(Token::Open)?;
        out.push('(');
        loop {
            item(self, out)?;
            match self.next()? {
                Token::Comma => out.push(','),
                Token::Close => break,
                other => return Err(WktError::UnexpectedToken(other.to_string())),
            }
        }
        out.push(')');
        Ok(())
    }

    /// `( x y, x y, ... )`
    fn coordinate_list(&mut self, out: &mut String) -> Result<(), WktError> {
        self.list(out, |p, out| p.coordinate(out))
    }

    /// `( x y )`
    fn coordinate_group(&mut self, out: &mut String) -> Result<(), WktError> {
        self.expect(Token::Open)?;
        out.push('(');
        self.coordinate(out)?;
        self.expect(Token::Close)?;
        out.push(')');
        Ok(())
    }

    fn coordinate(&mut self, out: &mut String) -> Result<(), WktError> {
        let mut count = 0;
        while let Some(Token::Number(n)) = self.tokens.peek() {
            let n = if *n == 0.0 { 0.0 } else { *n };
            if count > 0 {
                out.push(' ');
            }
            let _ = write!(out, "{n}");
            count += 1;
            self.tokens.next();
        }
        if !(2..=4).contains(&count) {
            return Err(WktError::BadCoordinate(count));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_formatting_variants_are_equal() {
        let a = canonicalize("POINT (1 2)").unwrap();
        let b = canonicalize("point(1.000 2.0)").unwrap();
        let c = canonicalize("  POINT(  1   2 )  ").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.text, "POINT(1 2)");
    }

    #[test]
    fn multipolygon_canonical() {
        let text = "MULTIPOLYGON (((0 0, 10 0, 10 10, 0 10, 0 0)), ((20 20, 30 20, 30 30, 20 20)))";
        let c = canonicalize(text).unwrap();
        assert_eq!(c.kind, GeometryKind::MultiPolygon);
        assert_eq!(
            c.text,
            "MULTIPOLYGON(((0 0,10 0,10 10,0 10,0 0)),((20 20,30 20,30 30,20 20)))"
        );
    }

    #[test]
    fn multipoint_member_styles_are_equal() {
        let a = canonicalize("MULTIPOINT (1 2, 3 4)").unwrap();
        let b = canonicalize("MULTIPOINT ((1 2), (3 4))").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_coordinates_differ() {
        let a = canonicalize("POINT (1 2)").unwrap();
        let b = canonicalize("POINT (1 2.0001)").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn negative_zero_normalized() {
        let a = canonicalize("POINT (-0 0)").unwrap();
        assert_eq!(a.text, "POINT(0 0)");
    }

    #[test]
    fn exponent_numbers() {
        let a = canonicalize("POINT (1e3 -2.5E-1)").unwrap();
        assert_eq!(a.text, "POINT(1000 -0.25)");
    }

    #[test]
    fn empty_and_dimensions() {
        assert_eq!(canonicalize("point empty").unwrap().text, "POINT EMPTY");
        assert_eq!(
            canonicalize("POINT Z (1 2 3)").unwrap().text,
            "POINT Z(1 2 3)"
        );
    }

    #[test]
    fn geometry_collection() {
        let c = canonicalize("GEOMETRYCOLLECTION (POINT (1 2), LINESTRING (0 0, 1 1))").unwrap();
        assert_eq!(c.text, "GEOMETRYCOLLECTION(POINT(1 2),LINESTRING(0 0,1 1))");
    }

    #[test]
    fn malformed_inputs_rejected() {
        assert!(canonicalize("").is_err());
        assert!(canonicalize("POINT (1)").is_err());
        assert!(canonicalize("POINT (1 2").is_err());
        assert!(canonicalize("CIRCLE (1 2)").is_err());
        assert!(canonicalize("POINT (1 2) trailing").is_err());
        assert!(canonicalize("POINT (a b)").is_err());
        assert!(canonicalize("POINT (1 2 ; )").is_err());
    }
}
