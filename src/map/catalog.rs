use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Selectable background dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseLayer {
    Satellite,
    Streetmap,
    Terrain,
    Topographic,
}

impl BaseLayer {
    /// Button order in the layers panel
    pub const ALL: [BaseLayer; 4] = [
        BaseLayer::Satellite,
        BaseLayer::Streetmap,
        BaseLayer::Terrain,
        BaseLayer::Topographic,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BaseLayer::Satellite => "Satellite",
            BaseLayer::Streetmap => "Streetmap",
            BaseLayer::Terrain => "Terrain",
            BaseLayer::Topographic => "Topographic",
        }
    }

    fn index(self) -> usize {
        match self {
            BaseLayer::Satellite => 0,
            BaseLayer::Streetmap => 1,
            BaseLayer::Terrain => 2,
            BaseLayer::Topographic => 3,
        }
    }
}

impl fmt::Display for BaseLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BaseLayer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "satellite" => Ok(BaseLayer::Satellite),
            "streetmap" => Ok(BaseLayer::Streetmap),
            "terrain" => Ok(BaseLayer::Terrain),
            "topographic" => Ok(BaseLayer::Topographic),
            other => Err(format!(
                "unknown base layer '{}' (expected satellite, streetmap, terrain or topographic)",
                other
            )),
        }
    }
}

/// Base-layer path table and the enabled overlay list
#[derive(Debug, Clone)]
pub struct LayerCatalog {
    paths: [PathBuf; 4],
    current: BaseLayer,
    secondary: Vec<String>,
}

impl LayerCatalog {
    /// `paths` is indexed in [`BaseLayer::ALL`] order
    pub fn new(paths: [PathBuf; 4], initial: BaseLayer) -> Self {
        Self {
            paths,
            current: initial,
            secondary: Vec::new(),
        }
    }

    pub fn resolve(&self, layer: BaseLayer) -> &Path {
        &self.paths[layer.index()]
    }

    pub fn current(&self) -> BaseLayer {
        self.current
    }

    pub fn set_current(&mut self, layer: BaseLayer) {
        self.current = layer;
    }

    /// Enable an overlay. Names are not deduplicated.
    pub fn register_secondary_layer(&mut self, name: &str) {
        tracing::info!(layer = name, "adding secondary layer");
        self.secondary.push(name.to_string());
    }

    pub fn secondary_layers(&self) -> &[String] {
        &self.secondary
    }
}
