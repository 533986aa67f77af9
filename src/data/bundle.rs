use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::{extension, AsciiGridDriver, Dataset, Driver, GeoJsonDriver, WktDriver};

/// A directory treated as one dataset: every `.asc` file becomes a band
/// and every `.geojson`, `.json` or `.wkt` file becomes a layer.
///
/// Numbered members are read by value, so `1.asc`, `2.asc`, `3.asc`
/// give a true-color stack and `10.asc` comes after `9.asc`.
pub struct BundleDriver;

impl Driver for BundleDriver {
    fn name(&self) -> &'static str {
        "bundle"
    }

    fn can_open(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn open(&self, path: &Path) -> Result<Dataset> {
        let mut entries: Vec<PathBuf> = fs::read_dir(path)
            .with_context(|| format!("cannot list {}", path.display()))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        entries.sort_by_cached_key(|p| member_order(p));

        let members: [&dyn Driver; 3] = [&AsciiGridDriver, &GeoJsonDriver, &WktDriver];
        let mut dataset = Dataset::new(path);
        for entry in &entries {
            let Some(driver) = members.iter().find(|d| d.can_open(entry)) else {
                if extension(entry).as_deref() != Some("prj") {
                    tracing::trace!(file = %entry.display(), "ignoring bundle member");
                }
                continue;
            };
            let mut member = driver.open(entry)?;
            dataset.bands.append(&mut member.bands);
            dataset.layers.append(&mut member.layers);
        }

        tracing::debug!(
            path = %path.display(),
            bands = dataset.bands.len(),
            layers = dataset.layers.len(),
            "opened bundle"
        );
        Ok(dataset)
    }
}

/// Files with a numeric stem first, by value; the rest by name
fn member_order(path: &Path) -> (bool, Option<u64>, PathBuf) {
    let number: Option<u64> = path
        .file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.parse().ok());
    (number.is_none(), number, path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(value: f32) -> String {
        format!("ncols 2\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\n{} {}\n", value, value)
    }

    #[test]
    fn test_bundle_collects_members_in_name_order() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::write(tmp.path().join("2.asc"), grid(0.5)).unwrap();
        fs::write(tmp.path().join("1.asc"), grid(1.0)).unwrap();
        fs::write(tmp.path().join("3.asc"), grid(0.0)).unwrap();
        fs::write(tmp.path().join("roads.wkt"), "LINESTRING (0 0, 1 1)\n").unwrap();
        fs::write(tmp.path().join("roads.prj"), "EPSG:4326\n").unwrap();
        fs::write(tmp.path().join("README"), "notes").unwrap();

        let ds = BundleDriver.open(tmp.path()).unwrap();
        assert_eq!(ds.bands().len(), 3);
        assert_eq!(ds.bands()[0].get(0, 0), Some(1.0));
        assert_eq!(ds.bands()[1].get(0, 0), Some(0.5));
        assert_eq!(ds.layers().len(), 1);
        assert_eq!(ds.layers()[0].name, "roads");
    }

    #[test]
    fn test_numbered_bands_sort_by_value() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::write(tmp.path().join("10.asc"), grid(10.0)).unwrap();
        fs::write(tmp.path().join("2.asc"), grid(2.0)).unwrap();
        fs::write(tmp.path().join("1.asc"), grid(1.0)).unwrap();
        fs::write(tmp.path().join("extra.asc"), grid(-1.0)).unwrap();

        let ds = BundleDriver.open(tmp.path()).unwrap();
        let firsts: Vec<_> = ds.bands().iter().map(|b| b.get(0, 0)).collect();
        assert_eq!(firsts, vec![Some(1.0), Some(2.0), Some(10.0), Some(-1.0)]);
    }

    #[test]
    fn test_bad_member_fails_the_bundle() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::write(tmp.path().join("bad.asc"), "ncols 2\n").unwrap();
        assert!(BundleDriver.open(tmp.path()).is_err());
    }

    #[test]
    fn test_empty_bundle() {
        let tmp = tempfile::TempDir::new().unwrap();
        let ds = BundleDriver.open(tmp.path()).unwrap();
        assert!(ds.bands().is_empty());
        assert!(ds.layers().is_empty());
    }
}
