use std::path::PathBuf;
use thiserror::Error;

use crate::map::geometry::GeometryKind;

/// Failures of the map pipeline.
///
/// None of these cross the session boundary: the session logs them, keeps
/// them in its diagnostics list and carries on with whatever it can still
/// show.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    /// The dataset could not be opened (missing file, no driver, parse error)
    #[error("failed to open dataset {}: {reason}", path.display())]
    DatasetOpen { path: PathBuf, reason: String },

    /// The dataset exposes no raster band; only vector content is drawn
    #[error("dataset {} has no raster band", path.display())]
    NoRasterBand { path: PathBuf },

    /// Band data could not be read into a pixel buffer
    #[error("failed to read raster bands: {reason}")]
    BandRead { reason: String },

    /// A geometry of this kind was skipped during flattening
    #[error("skipped unsupported geometry type {kind}")]
    UnsupportedGeometryType { kind: GeometryKind },

    /// No transform exists from this spatial reference to WGS84
    #[error("no coordinate transform available from {srs} to WGS84")]
    TransformUnavailable { srs: String },
}

impl MapError {
    /// Whether the error prevented the load from being committed.
    pub fn is_load_failure(&self) -> bool {
        matches!(self, MapError::DatasetOpen { .. } | MapError::BandRead { .. })
    }
}
