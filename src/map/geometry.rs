use glam::DVec2;
use std::fmt;

/// A geographic position, `x` = longitude, `y` = latitude (or projected
/// easting/northing before transformation)
pub type Coord = DVec2;

/// Concrete geometry type, used for logging and skip reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    LineString,
    LinearRing,
    CircularString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
    CompoundCurve,
    /// Anything the readers do not model (CURVEPOLYGON, TIN, ...)
    Other(String),
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeometryKind::Point => "Point",
            GeometryKind::LineString => "LineString",
            GeometryKind::LinearRing => "LinearRing",
            GeometryKind::CircularString => "CircularString",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::MultiPoint => "MultiPoint",
            GeometryKind::MultiLineString => "MultiLineString",
            GeometryKind::MultiPolygon => "MultiPolygon",
            GeometryKind::GeometryCollection => "GeometryCollection",
            GeometryKind::CompoundCurve => "CompoundCurve",
            GeometryKind::Other(name) => name.as_str(),
        };
        f.write_str(name)
    }
}

/// Curve flavours that share the "sequence of vertices" shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    LineString,
    LinearRing,
    CircularString,
}

/// Collection flavours; children are flattened the same way for all of them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiKind {
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
}

/// A vector feature's shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coord),
    LineLike { kind: LineKind, coords: Vec<Coord> },
    Polygon { exterior: Vec<Coord>, interiors: Vec<Vec<Coord>> },
    Multi { kind: MultiKind, members: Vec<Geometry> },
    CompoundCurve(Vec<Geometry>),
    Other(String),
}

impl Geometry {
    pub fn line_string(coords: Vec<Coord>) -> Self {
        Geometry::LineLike { kind: LineKind::LineString, coords }
    }

    pub fn circular_string(coords: Vec<Coord>) -> Self {
        Geometry::LineLike { kind: LineKind::CircularString, coords }
    }

    pub fn polygon(exterior: Vec<Coord>, interiors: Vec<Vec<Coord>>) -> Self {
        Geometry::Polygon { exterior, interiors }
    }

    pub fn collection(members: Vec<Geometry>) -> Self {
        Geometry::Multi { kind: MultiKind::GeometryCollection, members }
    }

    /// The discriminator the flattener dispatches on
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::LineLike { kind, .. } => match kind {
                LineKind::LineString => GeometryKind::LineString,
                LineKind::LinearRing => GeometryKind::LinearRing,
                LineKind::CircularString => GeometryKind::CircularString,
            },
            Geometry::Polygon { .. } => GeometryKind::Polygon,
            Geometry::Multi { kind, .. } => match kind {
                MultiKind::MultiPoint => GeometryKind::MultiPoint,
                MultiKind::MultiLineString => GeometryKind::MultiLineString,
                MultiKind::MultiPolygon => GeometryKind::MultiPolygon,
                MultiKind::GeometryCollection => GeometryKind::GeometryCollection,
            },
            Geometry::CompoundCurve(_) => GeometryKind::CompoundCurve,
            Geometry::Other(name) => GeometryKind::Other(name.clone()),
        }
    }
}

/// Convert a GeoJSON position list, dropping positions with fewer than two
/// ordinates
fn positions(coords: &[Vec<f64>]) -> Vec<Coord> {
    coords
        .iter()
        .filter(|c| c.len() >= 2)
        .map(|c| DVec2::new(c[0], c[1]))
        .collect()
}

fn rings(rings: &[Vec<Vec<f64>>]) -> (Vec<Coord>, Vec<Vec<Coord>>) {
    let mut iter = rings.iter();
    let exterior = iter.next().map(|r| positions(r)).unwrap_or_default();
    let interiors = iter.map(|r| positions(r)).collect();
    (exterior, interiors)
}

impl From<&geojson::Value> for Geometry {
    fn from(value: &geojson::Value) -> Self {
        use geojson::Value;

        match value {
            Value::Point(c) if c.len() >= 2 => Geometry::Point(DVec2::new(c[0], c[1])),
            Value::Point(_) => Geometry::Other("POINT EMPTY".to_string()),
            Value::MultiPoint(points) => Geometry::Multi {
                kind: MultiKind::MultiPoint,
                members: positions(points).into_iter().map(Geometry::Point).collect(),
            },
            Value::LineString(coords) => Geometry::line_string(positions(coords)),
            Value::MultiLineString(lines) => Geometry::Multi {
                kind: MultiKind::MultiLineString,
                members: lines.iter().map(|l| Geometry::line_string(positions(l))).collect(),
            },
            Value::Polygon(polygon) => {
                let (exterior, interiors) = rings(polygon);
                Geometry::Polygon { exterior, interiors }
            }
            Value::MultiPolygon(polygons) => Geometry::Multi {
                kind: MultiKind::MultiPolygon,
                members: polygons
                    .iter()
                    .map(|p| {
                        let (exterior, interiors) = rings(p);
                        Geometry::Polygon { exterior, interiors }
                    })
                    .collect(),
            },
            Value::GeometryCollection(geometries) => Geometry::collection(
                geometries.iter().map(|g| Geometry::from(&g.value)).collect(),
            ),
        }
    }
}
