use anyhow::{Context, Result};
use geojson::{GeoJson, JsonObject};
use std::fs;
use std::path::Path;

use super::{extension, layer_name, Dataset, Driver, VectorLayer};
use crate::map::{Geometry, SpatialReference};

/// GeoJSON file (`.geojson`, `.json`) as a single vector layer
pub struct GeoJsonDriver;

impl Driver for GeoJsonDriver {
    fn name(&self) -> &'static str {
        "geojson"
    }

    fn can_open(&self, path: &Path) -> bool {
        matches!(extension(path).as_deref(), Some("geojson" | "json"))
    }

    fn open(&self, path: &Path) -> Result<Dataset> {
        let mut bytes = fs::read(path)?;
        let layer = parse_geojson(&mut bytes, &layer_name(path))?;
        Ok(Dataset::new(path).with_layer(layer))
    }
}

/// Parse GeoJSON bytes into a layer.
///
/// simd-json parses in place, hence the mutable buffer. A legacy named
/// `crs` member becomes the layer's spatial reference; without one the
/// layer has none (GeoJSON is WGS84 by definition).
pub fn parse_geojson(bytes: &mut [u8], name: &str) -> Result<VectorLayer> {
    let geojson: GeoJson = simd_json::serde::from_slice(bytes).context("invalid GeoJSON")?;

    let mut features = Vec::new();
    let srs = match &geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                match &feature.geometry {
                    Some(geometry) => features.push(Geometry::from(&geometry.value)),
                    None => tracing::trace!(layer = name, "feature without geometry"),
                }
            }
            named_crs(fc.foreign_members.as_ref())
        }
        GeoJson::Feature(f) => {
            if let Some(geometry) = &f.geometry {
                features.push(Geometry::from(&geometry.value));
            }
            named_crs(f.foreign_members.as_ref())
        }
        GeoJson::Geometry(geometry) => {
            features.push(Geometry::from(&geometry.value));
            named_crs(geometry.foreign_members.as_ref())
        }
    };

    tracing::debug!(layer = name, features = features.len(), srs = ?srs, "parsed GeoJSON layer");
    Ok(VectorLayer::new(name, srs, features))
}

/// `"crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::3857"}}`
fn named_crs(members: Option<&JsonObject>) -> Option<SpatialReference> {
    let crs = members?.get("crs")?;
    let name = crs.get("properties")?.get("name")?.as_str()?;
    SpatialReference::parse(name)
}
