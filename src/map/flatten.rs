use glam::DVec2;

use crate::map::geometry::{Coord, Geometry, GeometryKind, LineKind};
use crate::map::projection::project;
use crate::map::raster::Rgb;
use crate::map::transform::CoordinateTransform;

/// Interpolated points inserted per circular-string segment
pub const CURVE_STEPS: usize = 100;

/// Draw color of every vector overlay line
pub const VECTOR_COLOR: Rgb = Rgb::new(255, 64, 64);

/// A projected line in screen pixels
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenPolyline {
    pub points: Vec<DVec2>,
    pub color: Rgb,
}

/// Walks nested geometries and emits one projected polyline per curve,
/// depth-first.
pub struct Flattener<'t> {
    width: f64,
    height: f64,
    transform: Option<&'t CoordinateTransform>,
    skipped: Vec<GeometryKind>,
}

impl<'t> Flattener<'t> {
    pub fn new(width: f64, height: f64, transform: Option<&'t CoordinateTransform>) -> Self {
        Self {
            width,
            height,
            transform,
            skipped: Vec::new(),
        }
    }

    /// Geometry kinds that produced no output, in encounter order
    pub fn skipped(&self) -> &[GeometryKind] {
        &self.skipped
    }

    pub fn flatten(&mut self, geometry: &Geometry) -> Vec<ScreenPolyline> {
        let mut out = Vec::new();
        self.flatten_into(geometry, &mut out);
        out
    }

    pub fn flatten_into(&mut self, geometry: &Geometry, out: &mut Vec<ScreenPolyline>) {
        match geometry {
            Geometry::LineLike { kind, coords } => {
                let points = self.project_all(coords);
                let points = if *kind == LineKind::CircularString {
                    densify(&points, CURVE_STEPS)
                } else {
                    points
                };
                out.push(ScreenPolyline { points, color: VECTOR_COLOR });
            }
            Geometry::Polygon { exterior, interiors } => {
                // Rings are emitted independently; holes are a fill concern
                for ring in std::iter::once(exterior).chain(interiors) {
                    out.push(ScreenPolyline {
                        points: self.project_all(ring),
                        color: VECTOR_COLOR,
                    });
                }
            }
            Geometry::Multi { members, .. } => {
                for member in members {
                    self.flatten_into(member, out);
                }
            }
            Geometry::CompoundCurve(curves) => {
                for curve in curves {
                    self.flatten_into(curve, out);
                }
            }
            Geometry::Point(_) | Geometry::Other(_) => {
                let kind = geometry.kind();
                tracing::debug!(%kind, "skipping geometry with no line representation");
                self.skipped.push(kind);
            }
        }
    }

    fn project_all(&self, coords: &[Coord]) -> Vec<DVec2> {
        coords
            .iter()
            .map(|c| project(c.x, c.y, self.transform, self.width, self.height))
            .collect()
    }
}

/// Replace every segment by `steps` linearly interpolated points
/// (t = 0/steps .. (steps-1)/steps).
///
/// This approximates a circular arc by the chord through its control
/// points; it does not fit the arc.
pub fn densify(points: &[DVec2], steps: usize) -> Vec<DVec2> {
    if points.len() < 2 || steps == 0 {
        return points.to_vec();
    }

    let mut out = Vec::with_capacity((points.len() - 1) * steps);
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        for i in 0..steps {
            out.push(a.lerp(b, i as f64 / steps as f64));
        }
    }
    out
}
