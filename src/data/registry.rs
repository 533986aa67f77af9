use anyhow::{bail, Context, Result};
use std::path::Path;

use super::{AsciiGridDriver, BundleDriver, Dataset, DatasetOpener, GeoJsonDriver, WktDriver};

/// Reads one on-disk format into a [`Dataset`]
pub trait Driver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Cheap check on the path alone (extension or directory)
    fn can_open(&self, path: &Path) -> bool;

    fn open(&self, path: &Path) -> Result<Dataset>;
}

/// Ordered set of drivers; the first one that accepts a path opens it
#[derive(Default)]
pub struct DriverRegistry {
    drivers: Vec<Box<dyn Driver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory bundles, ESRI ASCII grids, GeoJSON and WKT
    pub fn with_builtin_drivers() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(BundleDriver));
        registry.register(Box::new(AsciiGridDriver));
        registry.register(Box::new(GeoJsonDriver));
        registry.register(Box::new(WktDriver));
        registry
    }

    pub fn register(&mut self, driver: Box<dyn Driver>) {
        self.drivers.push(driver);
    }

    pub fn driver_names(&self) -> Vec<&'static str> {
        self.drivers.iter().map(|d| d.name()).collect()
    }

    /// The driver that would open `path`
    pub fn driver_for(&self, path: &Path) -> Option<&dyn Driver> {
        self.drivers
            .iter()
            .find(|d| d.can_open(path))
            .map(|d| &**d)
    }
}

impl DatasetOpener for DriverRegistry {
    fn open(&self, path: &Path) -> Result<Dataset> {
        if !path.exists() {
            bail!("{} does not exist", path.display());
        }
        let Some(driver) = self.driver_for(path) else {
            bail!("no driver recognises {}", path.display());
        };
        tracing::debug!(driver = driver.name(), path = %path.display(), "opening dataset");
        driver
            .open(path)
            .with_context(|| format!("{} driver failed on {}", driver.name(), path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_builtin_order() {
        let registry = DriverRegistry::with_builtin_drivers();
        assert_eq!(registry.driver_names(), vec!["bundle", "ascii-grid", "geojson", "wkt"]);
    }

    #[test]
    fn test_driver_selection() {
        let tmp = tempfile::TempDir::new().unwrap();
        let registry = DriverRegistry::with_builtin_drivers();
        assert_eq!(registry.driver_for(tmp.path()).map(|d| d.name()), Some("bundle"));
        assert_eq!(registry.driver_for(Path::new("a.ASC")).map(|d| d.name()), Some("ascii-grid"));
        assert_eq!(registry.driver_for(Path::new("a.json")).map(|d| d.name()), Some("geojson"));
        assert_eq!(registry.driver_for(Path::new("a.wkt")).map(|d| d.name()), Some("wkt"));
        assert!(registry.driver_for(Path::new("a.gpkg")).is_none());
    }

    #[test]
    fn test_open_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let registry = DriverRegistry::with_builtin_drivers();

        let missing = registry.open(&tmp.path().join("missing.asc")).unwrap_err();
        assert!(missing.to_string().contains("does not exist"));

        let unknown = tmp.path().join("map.gpkg");
        fs::write(&unknown, b"SQLite format 3").unwrap();
        let err = registry.open(&unknown).unwrap_err();
        assert!(err.to_string().contains("no driver"));

        let broken = tmp.path().join("broken.geojson");
        fs::write(&broken, b"{ not json").unwrap();
        let err = registry.open(&broken).unwrap_err();
        assert!(format!("{:#}", err).contains("geojson driver failed"));
    }

    #[test]
    fn test_empty_registry_opens_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(DriverRegistry::new().open(tmp.path()).is_err());
    }
}
