use anyhow::{anyhow, bail, Context, Result};
use glam::DVec2;
use std::fs;
use std::path::Path;

use super::{extension, layer_name, Dataset, Driver, VectorLayer};
use crate::map::{Coord, Geometry, LineKind, MultiKind, SpatialReference};

/// Well-known text file (`.wkt`): one geometry per line, `#` comments.
/// A `<stem>.prj` sidecar holding an authority code (`EPSG:3857`) sets the
/// layer's spatial reference.
pub struct WktDriver;

impl Driver for WktDriver {
    fn name(&self) -> &'static str {
        "wkt"
    }

    fn can_open(&self, path: &Path) -> bool {
        extension(path).as_deref() == Some("wkt")
    }

    fn open(&self, path: &Path) -> Result<Dataset> {
        let content = fs::read_to_string(path)?;
        let mut features = Vec::new();
        for (i, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let geometry = parse_wkt(line).with_context(|| format!("line {}", i + 1))?;
            features.push(geometry);
        }

        let prj = path.with_extension("prj");
        let srs = match fs::read_to_string(&prj) {
            Ok(text) => SpatialReference::parse(&text),
            Err(_) => None,
        };

        let layer = VectorLayer::new(&layer_name(path), srs, features);
        Ok(Dataset::new(path).with_layer(layer))
    }
}

/// Parse one WKT geometry, including the curve types
/// (`CIRCULARSTRING`, `COMPOUNDCURVE`). Z/M ordinates are read and dropped.
/// Tagged types the reader does not model parse to [`Geometry::Other`].
pub fn parse_wkt(text: &str) -> Result<Geometry> {
    let mut parser = Parser::new(text);
    let geometry = parser.geometry()?;
    match parser.next() {
        None => Ok(geometry),
        Some(token) => bail!("trailing input at {:?}", token),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Word(&'a str),
    Number(f64),
    Open,
    Close,
    Comma,
}

fn tokenize(text: &str) -> Result<Vec<Token<'_>>> {
    let mut tokens = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b' ' | b'\t' | b'\r' | b'\n' => i += 1,
            b'(' => {
                tokens.push(Token::Open);
                i += 1;
            }
            b')' => {
                tokens.push(Token::Close);
                i += 1;
            }
            b',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            c if c.is_ascii_alphabetic() => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                tokens.push(Token::Word(&text[start..i]));
            }
            c if c.is_ascii_digit() || matches!(c, b'-' | b'+' | b'.') => {
                let start = i;
                i += 1;
                while i < bytes.len()
                    && (bytes[i].is_ascii_digit() || matches!(bytes[i], b'.' | b'e' | b'E' | b'-' | b'+'))
                {
                    i += 1;
                }
                let number = &text[start..i];
                let value = number
                    .parse()
                    .with_context(|| format!("bad number '{}'", number))?;
                tokens.push(Token::Number(value));
            }
            _ => bail!("unexpected character '{}' at {}", c as char, i),
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: std::iter::Peekable<std::vec::IntoIter<Token<'a>>>,
    error: Option<anyhow::Error>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        let (tokens, error) = match tokenize(text) {
            Ok(tokens) => (tokens, None),
            Err(e) => (Vec::new(), Some(e)),
        };
        Self {
            tokens: tokens.into_iter().peekable(),
            error,
        }
    }

    fn next(&mut self) -> Option<Token<'a>> {
        self.tokens.next()
    }

    fn peek(&mut self) -> Option<&Token<'a>> {
        self.tokens.peek()
    }

    fn expect(&mut self, expected: Token<'a>) -> Result<()> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            other => bail!("expected {:?}, found {:?}", expected, other),
        }
    }

    fn geometry(&mut self) -> Result<Geometry> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        let tag = match self.next() {
            Some(Token::Word(word)) => word.to_ascii_uppercase(),
            other => bail!("expected geometry tag, found {:?}", other),
        };
        self.tagged(&tag)
    }

    fn tagged(&mut self, tag: &str) -> Result<Geometry> {
        self.dimension_suffix();
        let empty = self.empty();

        let geometry = match tag {
            "POINT" if empty => Geometry::Other("POINT EMPTY".to_string()),
            "POINT" => {
                self.expect(Token::Open)?;
                let c = self.coord()?;
                self.expect(Token::Close)?;
                Geometry::Point(c)
            }
            "LINESTRING" | "LINEARRING" | "CIRCULARSTRING" => {
                let kind = match tag {
                    "LINESTRING" => LineKind::LineString,
                    "LINEARRING" => LineKind::LinearRing,
                    _ => LineKind::CircularString,
                };
                let coords = if empty { Vec::new() } else { self.coord_list()? };
                Geometry::LineLike { kind, coords }
            }
            "POLYGON" => {
                if empty {
                    Geometry::polygon(Vec::new(), Vec::new())
                } else {
                    self.polygon_body()?
                }
            }
            "MULTIPOINT" => {
                let members = if empty { Vec::new() } else { self.multipoint_body()? };
                Geometry::Multi { kind: MultiKind::MultiPoint, members }
            }
            "MULTILINESTRING" => {
                let members = if empty {
                    Vec::new()
                } else {
                    self.list(|p| Ok(Geometry::line_string(p.coord_list()?)))?
                };
                Geometry::Multi { kind: MultiKind::MultiLineString, members }
            }
            "MULTIPOLYGON" => {
                let members = if empty { Vec::new() } else { self.list(|p| p.polygon_body())? };
                Geometry::Multi { kind: MultiKind::MultiPolygon, members }
            }
            "GEOMETRYCOLLECTION" => {
                let members = if empty { Vec::new() } else { self.list(|p| p.geometry())? };
                Geometry::collection(members)
            }
            "COMPOUNDCURVE" => {
                let members = if empty { Vec::new() } else { self.list(|p| p.compound_member())? };
                Geometry::CompoundCurve(members)
            }
            other => {
                if !empty {
                    self.skip_balanced()?;
                }
                Geometry::Other(other.to_string())
            }
        };
        Ok(geometry)
    }

    /// `Z`, `M` or `ZM` after the tag
    fn dimension_suffix(&mut self) {
        if let Some(Token::Word(w)) = self.peek() {
            if matches!(w.to_ascii_uppercase().as_str(), "Z" | "M" | "ZM") {
                self.next();
            }
        }
    }

    fn empty(&mut self) -> bool {
        match self.peek() {
            Some(Token::Word(w)) if w.eq_ignore_ascii_case("EMPTY") => {
                self.next();
                true
            }
            _ => false,
        }
    }

    /// Two to four numbers; only x and y are kept
    fn coord(&mut self) -> Result<Coord> {
        let mut values = Vec::with_capacity(4);
        while let Some(Token::Number(n)) = self.peek() {
            values.push(*n);
            self.next();
        }
        if !(2..=4).contains(&values.len()) {
            bail!("coordinate needs 2 to 4 ordinates, found {}", values.len());
        }
        Ok(DVec2::new(values[0], values[1]))
    }

    /// `( c, c, ... )`
    fn coord_list(&mut self) -> Result<Vec<Coord>> {
        self.expect(Token::Open)?;
        let mut coords = vec![self.coord()?];
        while self.peek() == Some(&Token::Comma) {
            self.next();
            coords.push(self.coord()?);
        }
        self.expect(Token::Close)?;
        Ok(coords)
    }

    /// `( item, item, ... )`
    fn list<T>(&mut self, mut item: impl FnMut(&mut Self) -> Result<T>) -> Result<Vec<T>> {
        self.expect(Token::Open)?;
        let mut items = vec![item(self)?];
        while self.peek() == Some(&Token::Comma) {
            self.next();
            items.push(item(self)?);
        }
        self.expect(Token::Close)?;
        Ok(items)
    }

    fn polygon_body(&mut self) -> Result<Geometry> {
        let mut rings = self.list(|p| p.coord_list())?.into_iter();
        let exterior = rings.next().unwrap_or_default();
        Ok(Geometry::polygon(exterior, rings.collect()))
    }

    /// Both `MULTIPOINT (1 2, 3 4)` and `MULTIPOINT ((1 2), (3 4))`
    fn multipoint_body(&mut self) -> Result<Vec<Geometry>> {
        self.list(|p| {
            if p.peek() == Some(&Token::Open) {
                p.next();
                let c = p.coord()?;
                p.expect(Token::Close)?;
                Ok(Geometry::Point(c))
            } else {
                Ok(Geometry::Point(p.coord()?))
            }
        })
    }

    /// A bare coordinate list is a linestring; tagged members are parsed whole
    fn compound_member(&mut self) -> Result<Geometry> {
        match self.peek() {
            Some(Token::Open) => Ok(Geometry::line_string(self.coord_list()?)),
            Some(Token::Word(_)) => self.geometry(),
            other => Err(anyhow!("bad compound curve member {:?}", other)),
        }
    }

    fn skip_balanced(&mut self) -> Result<()> {
        self.expect(Token::Open)?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.next() {
                Some(Token::Open) => depth += 1,
                Some(Token::Close) => depth -= 1,
                Some(_) => {}
                None => bail!("unbalanced parentheses"),
            }
        }
        Ok(())
    }
}
