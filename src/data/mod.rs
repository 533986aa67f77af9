//! Dataset access.
//!
//! A [`Dataset`] is what the map session draws from: raster bands and vector
//! layers read from disk by a [`Driver`]. Drivers live in a process-wide
//! registry that the application brings up with [`initialize`] and tears
//! down with [`shutdown`], once each, no matter how many sessions exist.

mod ascii_grid;
mod bundle;
mod geojson_driver;
mod registry;
mod wkt;

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;

use crate::map::{Geometry, RasterBand, SpatialReference};

pub use ascii_grid::{parse_ascii_grid, AsciiGridDriver};
pub use bundle::BundleDriver;
pub use geojson_driver::{parse_geojson, GeoJsonDriver};
pub use registry::{Driver, DriverRegistry};
pub use wkt::{parse_wkt, WktDriver};

/// A named collection of vector features sharing a spatial reference
#[derive(Debug, Clone, PartialEq)]
pub struct VectorLayer {
    pub name: String,
    pub srs: Option<SpatialReference>,
    pub features: Vec<Geometry>,
}

impl VectorLayer {
    pub fn new(name: &str, srs: Option<SpatialReference>, features: Vec<Geometry>) -> Self {
        Self {
            name: name.to_string(),
            srs,
            features,
        }
    }
}

/// An opened geospatial data source
#[derive(Debug)]
pub struct Dataset {
    path: PathBuf,
    bands: Vec<RasterBand>,
    layers: Vec<VectorLayer>,
}

impl Dataset {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            bands: Vec::new(),
            layers: Vec::new(),
        }
    }

    pub fn with_band(mut self, band: RasterBand) -> Self {
        self.bands.push(band);
        self
    }

    pub fn with_layer(mut self, layer: VectorLayer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bands in band-number order (band 1 first)
    pub fn bands(&self) -> &[RasterBand] {
        &self.bands
    }

    pub fn layers(&self) -> &[VectorLayer] {
        &self.layers
    }

    /// Size of band 1, if any
    pub fn raster_size(&self) -> Option<(usize, usize)> {
        self.bands.first().map(|b| (b.width(), b.height()))
    }
}

impl Drop for Dataset {
    fn drop(&mut self) {
        tracing::debug!(path = %self.path.display(), "closing dataset");
    }
}

/// Opens datasets by path. The map session only talks to this seam.
pub trait DatasetOpener {
    fn open(&self, path: &Path) -> Result<Dataset>;
}

/// Driver registry lifecycle misuse
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("dataset drivers are already initialized")]
    AlreadyInitialized,
    #[error("dataset drivers are not initialized")]
    NotInitialized,
    #[error("dataset driver registry lock is poisoned")]
    Poisoned,
}

static REGISTRY: RwLock<Option<DriverRegistry>> = RwLock::new(None);

/// Register the built-in drivers. Call once at startup.
pub fn initialize() -> Result<(), LifecycleError> {
    let mut guard = REGISTRY.write().map_err(|_| LifecycleError::Poisoned)?;
    if guard.is_some() {
        return Err(LifecycleError::AlreadyInitialized);
    }
    let registry = DriverRegistry::with_builtin_drivers();
    tracing::info!(drivers = ?registry.driver_names(), "dataset drivers registered");
    *guard = Some(registry);
    Ok(())
}

/// Drop all registered drivers. Call once at exit.
pub fn shutdown() -> Result<(), LifecycleError> {
    let mut guard = REGISTRY.write().map_err(|_| LifecycleError::Poisoned)?;
    if guard.take().is_none() {
        return Err(LifecycleError::NotInitialized);
    }
    tracing::info!("dataset drivers unregistered");
    Ok(())
}

#[cfg(test)]
fn is_initialized() -> bool {
    REGISTRY.read().map(|g| g.is_some()).unwrap_or(false)
}

/// Opens through the process-wide registry set up by [`initialize`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryOpener;

impl DatasetOpener for RegistryOpener {
    fn open(&self, path: &Path) -> Result<Dataset> {
        let guard = match REGISTRY.read() {
            Ok(guard) => guard,
            Err(_) => bail!(LifecycleError::Poisoned),
        };
        match guard.as_ref() {
            Some(registry) => registry.open(path),
            None => bail!(LifecycleError::NotInitialized),
        }
    }
}

/// File extension, lowercased
pub(crate) fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// File stem used as a layer name
pub(crate) fn layer_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("layer")
        .to_string()
}
