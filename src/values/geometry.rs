//! Planar geometries and their well-known-text form.
//!
//! The datastore only carries geometries; it never computes with them.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub const fn new(x: f64, y: f64) -> Self {
        Coord { x, y }
    }
}

/// A geometry value. Polygons are lists of rings, the first being the shell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Point(Coord),
    LineString(Vec<Coord>),
    Polygon(Vec<Vec<Coord>>),
    MultiPoint(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Vec<Vec<Coord>>>),
    Collection(Vec<Geometry>),
}

impl Geometry {
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point(Coord::new(x, y))
    }

    /// Total number of coordinates.
    pub fn coord_count(&self) -> usize {
        match self {
            Geometry::Point(_) => 1,
            Geometry::LineString(c) | Geometry::MultiPoint(c) => c.len(),
            Geometry::Polygon(r) | Geometry::MultiLineString(r) => r.iter().map(Vec::len).sum(),
            Geometry::MultiPolygon(p) => p.iter().flatten().map(Vec::len).sum(),
            Geometry::Collection(g) => g.iter().map(Geometry::coord_count).sum(),
        }
    }

    pub fn to_wkt(&self) -> String {
        let mut out = String::new();
        write_geometry(&mut out, self);
        out
    }

    /// Parse well-known text. Z/M ordinates are accepted and dropped.
    pub fn parse_wkt(s: &str) -> Option<Self> {
        let mut parser = WktParser {
            tokens: tokenize(s)?,
            pos: 0,
            depth: 0,
        };
        let geometry = parser.geometry()?;
        if parser.pos != parser.tokens.len() {
            return None;
        }
        Some(geometry)
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wkt())
    }
}

// --- Writer ---

fn write_geometry(out: &mut String, g: &Geometry) {
    match g {
        Geometry::Point(c) => {
            out.push_str("POINT (");
            write_coord(out, c);
            out.push(')');
        }
        Geometry::LineString(coords) => {
            out.push_str("LINESTRING ");
            write_coords(out, coords);
        }
        Geometry::Polygon(rings) => {
            out.push_str("POLYGON ");
            write_list(out, rings, |o, r| write_coords(o, r));
        }
        Geometry::MultiPoint(coords) => {
            out.push_str("MULTIPOINT ");
            write_list(out, coords, |o, c| {
                o.push('(');
                write_coord(o, c);
                o.push(')');
            });
        }
        Geometry::MultiLineString(lines) => {
            out.push_str("MULTILINESTRING ");
            write_list(out, lines, |o, l| write_coords(o, l));
        }
        Geometry::MultiPolygon(polys) => {
            out.push_str("MULTIPOLYGON ");
            write_list(out, polys, |o, p| write_list(o, p, |o, r| write_coords(o, r)));
        }
        Geometry::Collection(items) => {
            out.push_str("GEOMETRYCOLLECTION ");
            write_list(out, items, write_geometry);
        }
    }
}

fn write_coord(out: &mut String, c: &Coord) {
    let _ = write!(out, "{} {}", c.x, c.y);
}

fn write_coords(out: &mut String, coords: &[Coord]) {
    write_list(out, coords, write_coord);
}

fn write_list<T>(out: &mut String, items: &[T], mut write_item: impl FnMut(&mut String, &T)) {
    if items.is_empty() {
        out.push_str("EMPTY");
        return;
    }
    out.push('(');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_item(out, item);
    }
    out.push(')');
}

// --- Parser ---

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Word(String),
    Number(f64),
    Open,
    Close,
    Comma,
}

fn tokenize(s: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = s.chars().peekable();
    while let Some(&c) = chars.peek() {
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
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if !c.is_ascii_alphabetic() {
                        break;
                    }
                    word.push(c.to_ascii_uppercase());
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
            c if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => {
                let mut num = String::new();
                while let Some(&c) = chars.peek() {
                    if !(c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')) {
                        break;
                    }
                    num.push(c);
                    chars.next();
                }
                tokens.push(Token::Number(num.parse().ok()?));
            }
            _ => return None,
        }
    }
    Some(tokens)
}

/// Deepest collection nesting the reader accepts.
const MAX_DEPTH: usize = 64;

struct WktParser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl WktParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, token: Token) -> Option<()> {
        (self.next()? == token).then_some(())
    }

    /// Consume `EMPTY` if it is next.
    fn empty(&mut self) -> bool {
        if matches!(self.peek(), Some(Token::Word(w)) if w == "EMPTY") {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn geometry(&mut self) -> Option<Geometry> {
        let Token::Word(tag) = self.next()? else {
            return None;
        };
        // Dimension markers such as `POINT Z (...)`.
        if matches!(self.peek(), Some(Token::Word(w)) if w == "Z" || w == "M" || w == "ZM") {
            self.pos += 1;
        }
        match tag.as_str() {
            "POINT" => {
                self.expect(Token::Open)?;
                let c = self.coord()?;
                self.expect(Token::Close)?;
                Some(Geometry::Point(c))
            }
            "LINESTRING" => Some(Geometry::LineString(self.coords()?)),
            "POLYGON" => Some(Geometry::Polygon(self.list(Self::coords)?)),
            "MULTIPOINT" => Some(Geometry::MultiPoint(self.list(Self::multipoint_member)?)),
            "MULTILINESTRING" => Some(Geometry::MultiLineString(self.list(Self::coords)?)),
            "MULTIPOLYGON" => Some(Geometry::MultiPolygon(
                self.list(|p| p.list(Self::coords))?,
            )),
            "GEOMETRYCOLLECTION" => {
                if self.depth >= MAX_DEPTH {
                    return None;
                }
                self.depth += 1;
                let members = self.list(Self::geometry);
                self.depth -= 1;
                Some(Geometry::Collection(members?))
            }
            _ => None,
        }
    }

    fn coord(&mut self) -> Option<Coord> {
        let (Token::Number(x), Token::Number(y)) = (self.next()?, self.next()?) else {
            return None;
        };
        while matches!(self.peek(), Some(Token::Number(_))) {
            self.pos += 1;
        }
        Some(Coord::new(x, y))
    }

    fn coords(&mut self) -> Option<Vec<Coord>> {
        self.list(Self::coord)
    }

    fn multipoint_member(&mut self) -> Option<Coord> {
        if self.peek() == Some(&Token::Open) {
            self.pos += 1;
            let c = self.coord()?;
            self.expect(Token::Close)?;
            Some(c)
        } else {
            self.coord()
        }
    }

    /// `EMPTY` or a parenthesised, comma-separated list.
    fn list<T>(&mut self, mut item: impl FnMut(&mut Self) -> Option<T>) -> Option<Vec<T>> {
        if self.empty() {
            return Some(Vec::new());
        }
        self.expect(Token::Open)?;
        let mut items = vec![item(self)?];
        loop {
            match self.next()? {
                Token::Comma => items.push(item(self)?),
                Token::Close => return Some(items),
                _ => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Coord> {
        vec![
            Coord::new(0.0, 0.0),
            Coord::new(1.0, 0.0),
            Coord::new(1.0, 1.0),
            Coord::new(0.0, 0.0),
        ]
    }

    #[test]
    fn test_point_wkt() {
        let p = Geometry::point(-1.5, 51.25);
        assert_eq!(p.to_wkt(), "POINT (-1.5 51.25)");
        assert_eq!(Geometry::parse_wkt("point(-1.5 51.25)"), Some(p));
    }

    #[test]
    fn test_roundtrip_all_shapes() {
        let shapes = vec![
            Geometry::LineString(vec![Coord::new(0.0, 0.0), Coord::new(2.0, 3.5)]),
            Geometry::Polygon(vec![square()]),
            Geometry::MultiPoint(vec![Coord::new(1.0, 2.0), Coord::new(3.0, 4.0)]),
            Geometry::MultiLineString(vec![square(), square()]),
            Geometry::MultiPolygon(vec![vec![square()], vec![square(), square()]]),
            Geometry::Collection(vec![Geometry::point(1.0, 1.0), Geometry::LineString(vec![])]),
            Geometry::Collection(vec![]),
        ];
        for shape in shapes {
            let wkt = shape.to_wkt();
            assert_eq!(Geometry::parse_wkt(&wkt), Some(shape), "{}", wkt);
        }
    }

    #[test]
    fn test_lenient_forms() {
        assert_eq!(
            Geometry::parse_wkt("MULTIPOINT (1 2, 3 4)"),
            Some(Geometry::MultiPoint(vec![Coord::new(1.0, 2.0), Coord::new(3.0, 4.0)]))
        );
        assert_eq!(
            Geometry::parse_wkt("POINT Z (1 2 3)"),
            Some(Geometry::point(1.0, 2.0))
        );
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in [
            "",
            "POINT",
            "POINT (1)",
            "POINT (1 2",
            "POINT (1 2) extra",
            "CIRCLE (1 2)",
            "LINESTRING (1 2,)",
            "POINT (a b)",
            "POINT (1 2) ;",
        ] {
            assert_eq!(Geometry::parse_wkt(bad), None, "{}", bad);
        }
    }

    #[test]
    fn test_deep_nesting_rejected() {
        let deep = "GEOMETRYCOLLECTION (".repeat(200_000);
        assert_eq!(Geometry::parse_wkt(&deep), None);

        let nested = |n: usize| {
            format!("{}POINT (1 2){}", "GEOMETRYCOLLECTION (".repeat(n), ")".repeat(n))
        };
        assert!(Geometry::parse_wkt(&nested(MAX_DEPTH)).is_some());
        assert_eq!(Geometry::parse_wkt(&nested(MAX_DEPTH + 1)), None);
    }

    #[test]
    fn test_coord_count() {
        let g = Geometry::MultiPolygon(vec![vec![square()], vec![square()]]);
        assert_eq!(g.coord_count(), 8);
    }
}
