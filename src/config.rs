//! INI configuration.
//!
//! Every key is optional; a missing file gives [`MapConfig::default`].
//!
//! ```ini
//! [maps]
//! directory = resources/maps
//! streetmap = osm
//! initial = terrain
//!
//! [overlays]
//! names = Information, Resources
//!
//! [layout]
//! button_size = 12
//! panel_fraction = 0.25
//!
//! [logging]
//! directory = logs
//! file = geodash.log
//! level = info
//! ```

use ini::Ini;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::map::{BaseLayer, LayoutConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] ini::Error),

    #[error("invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub file: String,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            file: "geodash.log".to_string(),
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub maps_dir: PathBuf,
    /// Per base layer, relative to `maps_dir` unless absolute.
    /// Indexed in [`BaseLayer::ALL`] order.
    pub layer_entries: [PathBuf; 4],
    pub initial: BaseLayer,
    pub overlays: Vec<String>,
    pub layout: LayoutConfig,
    pub logging: LoggingConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            maps_dir: PathBuf::from("resources/maps"),
            layer_entries: BaseLayer::ALL.map(|l| PathBuf::from(l.label().to_ascii_lowercase())),
            initial: BaseLayer::Streetmap,
            overlays: vec!["Information".to_string(), "Resources".to_string()],
            layout: LayoutConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl MapConfig {
    /// Load from `path`; a missing file gives the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }

    pub fn parse_str(content: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(content).map_err(|e| ConfigError::Read(ini::Error::Parse(e)))?;
        parse_ini(&ini)
    }

    /// Dataset path of every base layer
    pub fn layer_paths(&self) -> [PathBuf; 4] {
        self.layer_entries.clone().map(|entry| self.maps_dir.join(entry))
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// A strictly positive number of braille pixels
fn parse_pixels(section: &str, key: &str, value: &str) -> Result<f64, ConfigError> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(invalid(section, key, value, "must be a positive number")),
    }
}

fn parse_ini(ini: &Ini) -> Result<MapConfig, ConfigError> {
    let mut config = MapConfig::default();

    // [maps]
    if let Some(section) = ini.section(Some("maps")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.maps_dir = PathBuf::from(v);
            }
        }
        for (i, layer) in BaseLayer::ALL.iter().enumerate() {
            let key = layer.label().to_ascii_lowercase();
            if let Some(v) = section.get(key.as_str()) {
                let v = v.trim();
                if v.is_empty() {
                    return Err(invalid("maps", &key, v, "must not be empty"));
                }
                config.layer_entries[i] = PathBuf::from(v);
            }
        }
        if let Some(v) = section.get("initial") {
            config.initial = BaseLayer::from_str(v).map_err(|_| {
                invalid("maps", "initial", v, "must be one of: satellite, streetmap, terrain, topographic")
            })?;
        }
    }

    // [overlays]
    if let Some(section) = ini.section(Some("overlays")) {
        if let Some(v) = section.get("names") {
            config.overlays = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    // [layout]
    if let Some(section) = ini.section(Some("layout")) {
        let layout = &mut config.layout;
        let pixel_keys: [(&str, &mut f64); 5] = [
            ("button_size", &mut layout.button_size),
            ("margin", &mut layout.margin),
            ("search_bar_height", &mut layout.search_bar_height),
            ("layer_button_height", &mut layout.layer_button_height),
            ("layer_button_spacing", &mut layout.layer_button_spacing),
        ];
        for (key, field) in pixel_keys {
            if let Some(v) = section.get(key) {
                *field = parse_pixels("layout", key, v)?;
            }
        }
        if let Some(v) = section.get("panel_fraction") {
            layout.panel_fraction = match v.trim().parse::<f64>() {
                Ok(f) if f > 0.0 && f <= 0.5 => f,
                _ => return Err(invalid("layout", "panel_fraction", v, "must be in (0, 0.5]")),
            };
        }
    }

    // [logging]
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = PathBuf::from(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if v.is_empty() || v.contains(['/', '\\']) {
                return Err(invalid("logging", "file", v, "must be a plain file name"));
            }
            config.logging.file = v.to_string();
        }
        if let Some(v) = section.get("level") {
            let v = v.trim();
            if v.is_empty() {
                return Err(invalid("logging", "level", v, "must not be empty"));
            }
            config.logging.level = v.to_string();
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MapConfig::default();
        assert_eq!(config.initial, BaseLayer::Streetmap);
        assert_eq!(
            config.layer_paths()[0],
            PathBuf::from("resources/maps/satellite")
        );
        assert_eq!(config.overlays, vec!["Information", "Resources"]);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = MapConfig::load_from(&tmp.path().join("absent.ini")).unwrap();
        assert_eq!(config, MapConfig::default());
    }

    #[test]
    fn test_full_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("geodash.ini");
        std::fs::write(
            &path,
            "[maps]\ndirectory = /data/maps\nterrain = dem.asc\ninitial = Terrain\n\
             [overlays]\nnames = Rivers, , Roads\n\
             [layout]\nbutton_size = 16\npanel_fraction = 0.25\n\
             [logging]\nlevel = geodash=debug\n",
        )
        .unwrap();

        let config = MapConfig::load_from(&path).unwrap();
        assert_eq!(config.initial, BaseLayer::Terrain);
        let paths = config.layer_paths();
        assert_eq!(paths[2], PathBuf::from("/data/maps/dem.asc"));
        assert_eq!(paths[1], PathBuf::from("/data/maps/streetmap"));
        assert_eq!(config.overlays, vec!["Rivers", "Roads"]);
        assert_eq!(config.layout.button_size, 16.0);
        assert_eq!(config.layout.panel_fraction, 0.25);
        assert_eq!(config.layout.margin, LayoutConfig::default().margin);
        assert_eq!(config.logging.level, "geodash=debug");
        assert_eq!(config.logging.file, "geodash.log");
    }

    #[test]
    fn test_invalid_values() {
        let cases = [
            "[maps]\ninitial = hybrid\n",
            "[layout]\nmargin = -1\n",
            "[layout]\npanel_fraction = 0.9\n",
            "[logging]\nfile = ../escape.log\n",
            "[maps]\nsatellite = \n",
        ];
        for case in cases {
            match MapConfig::parse_str(case) {
                Err(ConfigError::InvalidValue { .. }) => {}
                other => panic!("{:?} should be invalid, got {:?}", case, other),
            }
        }
    }
}
