//! The map screen: owns the open dataset, the cached renderables and the
//! panel state, and turns pointer and character input into state changes.
//!
//! Nothing here returns an error to the host. Load failures are logged,
//! kept in [`MapSession::diagnostics`] and leave whatever was on screen
//! before in place.

use glam::DVec2;
use std::path::Path;

use crate::config::MapConfig;
use crate::data::{Dataset, DatasetOpener};
use crate::map::catalog::{BaseLayer, LayerCatalog};
use crate::map::error::MapError;
use crate::map::flatten::{Flattener, ScreenPolyline};
use crate::map::layout::{Control, ControlLayout, LayoutConfig};
use crate::map::panel::PanelState;
use crate::map::projection::rescale_factor;
use crate::map::raster::{try_sample, PixelBuffer};
use crate::map::transform::CoordinateTransform;
use crate::map::viewport::{fit, ViewportFit};

/// Everything the host needs for one frame
#[derive(Debug)]
pub struct RenderSet<'a> {
    /// Viewport size in screen pixels
    pub size: DVec2,
    pub pixels: &'a PixelBuffer,
    pub fit: ViewportFit,
    pub polylines: &'a [ScreenPolyline],
    pub layout: &'a ControlLayout,
    pub panel: &'a PanelState,
    /// Layer whose renderables are shown, if any load has succeeded
    pub base_layer: Option<BaseLayer>,
    /// Overlay buttons, in panel order
    pub overlay_names: &'a [String],
    /// Overlays enabled so far, in click order
    pub secondary_layers: &'a [String],
    /// Present while the search box is open
    pub search_text: Option<&'a str>,
    pub status: &'a str,
}

/// Renderables of the last successful load
#[derive(Debug, Default)]
struct Scene {
    layer: Option<BaseLayer>,
    pixels: PixelBuffer,
    fit: ViewportFit,
    polylines: Vec<ScreenPolyline>,
}

pub struct MapSession {
    opener: Box<dyn DatasetOpener>,
    catalog: LayerCatalog,
    overlay_names: Vec<String>,
    panel: PanelState,
    layout_config: LayoutConfig,
    layout: ControlLayout,
    size: DVec2,
    dataset: Option<Dataset>,
    scene: Scene,
    diagnostics: Vec<MapError>,
    status: String,
    last_query: Option<String>,
    exit_requested: bool,
    dirty: bool,
}

impl MapSession {
    /// `width` and `height` are the viewport size in screen pixels. Nothing
    /// is loaded until [`load_current`](Self::load_current).
    pub fn new(config: &MapConfig, opener: Box<dyn DatasetOpener>, width: f64, height: f64) -> Self {
        let catalog = LayerCatalog::new(config.layer_paths(), config.initial);
        let layout = ControlLayout::new(width, height, &config.layout, config.overlays.len());

        Self {
            opener,
            catalog,
            overlay_names: config.overlays.clone(),
            panel: PanelState::new(),
            layout_config: config.layout.clone(),
            layout,
            size: DVec2::new(width, height),
            dataset: None,
            scene: Scene::default(),
            diagnostics: Vec::new(),
            status: "no layer loaded".to_string(),
            last_query: None,
            exit_requested: false,
            dirty: true,
        }
    }

    pub fn catalog(&self) -> &LayerCatalog {
        &self.catalog
    }

    pub fn panel(&self) -> &PanelState {
        &self.panel
    }

    pub fn size(&self) -> DVec2 {
        self.size
    }

    /// Problems met by the most recent load attempt
    pub fn diagnostics(&self) -> &[MapError] {
        &self.diagnostics
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// The last committed search
    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    /// Load the catalog's current base layer
    pub fn load_current(&mut self) {
        self.load_layer(self.catalog.current());
    }

    /// Replace the shown layer. On failure the previous renderables stay.
    pub fn load_layer(&mut self, layer: BaseLayer) {
        self.diagnostics.clear();
        let path = self.catalog.resolve(layer).to_path_buf();
        let _span = tracing::info_span!("load_layer", %layer, path = %path.display()).entered();

        // Only one dataset may be open at a time
        self.dataset = None;

        let dataset = match self.opener.open(&path) {
            Ok(dataset) => dataset,
            Err(e) => {
                self.fail(MapError::DatasetOpen {
                    path,
                    reason: format!("{:#}", e),
                });
                return;
            }
        };

        let pixels = match try_sample(dataset.bands()) {
            Ok(pixels) => pixels,
            Err(MapError::NoRasterBand { .. }) => {
                let err = MapError::NoRasterBand { path: path.clone() };
                tracing::warn!("{}, drawing vectors only", err);
                self.diagnostics.push(err);
                PixelBuffer::empty()
            }
            Err(e) => {
                self.fail(e);
                return;
            }
        };

        let polylines = self.flatten_layers(&dataset);
        let fit = fit(pixels.width(), pixels.height(), self.size.x, self.size.y);

        tracing::info!(
            raster = ?dataset.raster_size(),
            polylines = polylines.len(),
            "layer loaded"
        );
        self.scene = Scene {
            layer: Some(layer),
            pixels,
            fit,
            polylines,
        };
        self.dataset = Some(dataset);
        self.catalog.set_current(layer);
        self.update_status();
        self.dirty = true;
    }

    /// Every vector layer, depth-first, each through its own transform
    fn flatten_layers(&mut self, dataset: &Dataset) -> Vec<ScreenPolyline> {
        let mut polylines = Vec::new();
        for layer in dataset.layers() {
            let transform = match &layer.srs {
                Some(srs) => match CoordinateTransform::to_wgs84(srs) {
                    Ok(t) => {
                        tracing::debug!(layer = %layer.name, source = %t.source(), "projecting through transform");
                        Some(t)
                    }
                    Err(e) => {
                        tracing::warn!(layer = %layer.name, "{}, using raw coordinates", e);
                        self.diagnostics.push(e);
                        None
                    }
                },
                None => None,
            };

            let mut flattener = Flattener::new(self.size.x, self.size.y, transform.as_ref());
            for feature in &layer.features {
                flattener.flatten_into(feature, &mut polylines);
            }
            self.diagnostics.extend(
                flattener
                    .skipped()
                    .iter()
                    .map(|kind| MapError::UnsupportedGeometryType { kind: kind.clone() }),
            );
            // `transform` is dropped here, before the next layer
        }
        polylines
    }

    fn fail(&mut self, err: MapError) {
        tracing::error!("{}", err);
        self.status = err.to_string();
        self.diagnostics.push(err);
    }

    fn update_status(&mut self) {
        let layer = match self.scene.layer {
            Some(layer) => layer.label(),
            None => "no layer",
        };
        let mut status = format!("{} | {} lines", layer, self.scene.polylines.len());
        if let Some(path) = self.dataset_path() {
            status = format!("{} ({}) | {} lines", layer, path.display(), self.scene.polylines.len());
        }
        if !self.diagnostics.is_empty() {
            status.push_str(&format!(" | {} warnings", self.diagnostics.len()));
        }
        self.status = status;
    }

    /// New viewport size in screen pixels
    pub fn resize(&mut self, width: f64, height: f64) {
        let size = DVec2::new(width, height);
        if size == self.size {
            return;
        }
        let factor = rescale_factor(self.size, size);
        for polyline in &mut self.scene.polylines {
            for p in &mut polyline.points {
                *p *= factor;
            }
        }
        self.size = size;
        self.scene.fit = fit(self.scene.pixels.width(), self.scene.pixels.height(), width, height);
        self.layout = ControlLayout::new(
            width,
            height,
            &self.layout_config,
            self.overlay_names.len(),
        );
        self.dirty = true;
    }

    /// Press at `p` (screen pixels). Returns the control that handled it.
    pub fn handle_pointer_down(&mut self, p: DVec2) -> Option<Control> {
        let control = self.layout.hit_test(p, &self.panel)?;
        tracing::debug!(?control, x = p.x, y = p.y, "pointer");

        match &control {
            Control::LayersToggle => self.panel.toggle_layers(),
            Control::SecondaryToggle => self.panel.toggle_secondary(),
            Control::SearchToggle => self.panel.toggle_search(),
            Control::Exit => {
                tracing::info!("exit requested");
                self.exit_requested = true;
            }
            Control::BaseLayer(layer) => self.load_layer(*layer),
            Control::SecondaryLayer(i) => {
                if let Some(name) = self.overlay_names.get(*i) {
                    self.catalog.register_secondary_layer(name);
                    self.status = format!("overlay: {}", name);
                }
            }
        }
        self.dirty = true;
        Some(control)
    }

    /// Character input; ignored unless the search box is open
    pub fn handle_text_input(&mut self, c: char) {
        if !self.panel.search_active() {
            return;
        }
        match c {
            '\r' | '\n' => {
                let query = self.panel.search_text().to_string();
                if !query.is_empty() {
                    tracing::info!(%query, "search");
                    self.status = format!("search: {}", query);
                    self.last_query = Some(query);
                }
                self.panel.toggle_search();
            }
            '\u{8}' | '\u{7f}' => self.panel.pop_char(),
            c if c == ' ' || c.is_ascii_graphic() => self.panel.push_char(c),
            _ => return,
        }
        self.dirty = true;
    }

    /// Force the next [`render`](Self::render) to produce a frame, for
    /// host-side changes such as the pointer readout
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// The frame to draw, or `None` if nothing changed since the last call
    pub fn render(&mut self) -> Option<RenderSet<'_>> {
        if !std::mem::take(&mut self.dirty) {
            return None;
        }
        Some(RenderSet {
            size: self.size,
            pixels: &self.scene.pixels,
            fit: self.scene.fit,
            polylines: &self.scene.polylines,
            layout: &self.layout,
            panel: &self.panel,
            base_layer: self.scene.layer,
            overlay_names: &self.overlay_names,
            secondary_layers: self.catalog.secondary_layers(),
            search_text: self.panel.search_active().then(|| self.panel.search_text()),
            status: &self.status,
        })
    }

    /// Path of the open dataset, if any
    pub fn dataset_path(&self) -> Option<&Path> {
        self.dataset.as_ref().map(|d| d.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::VectorLayer;
    use crate::map::{Geometry, GeometryKind, RasterBand, SpatialReference, FOREGROUND, VECTOR_COLOR};
    use anyhow::{bail, Result};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Builds datasets from a closure keyed on the requested path
    struct FnOpener<F>(F);

    impl<F: Fn(&Path) -> Result<Dataset>> DatasetOpener for FnOpener<F> {
        fn open(&self, path: &Path) -> Result<Dataset> {
            (self.0)(path)
        }
    }

    fn line(pts: &[(f64, f64)]) -> Geometry {
        Geometry::line_string(pts.iter().map(|&(x, y)| DVec2::new(x, y)).collect())
    }

    fn is_layer(path: &Path, name: &str) -> bool {
        path.file_name().and_then(|n| n.to_str()) == Some(name)
    }

    /// streetmap: vectors only; terrain: 2x1 raster; everything else fails
    fn opener() -> Box<dyn DatasetOpener> {
        Box::new(FnOpener(|path: &Path| {
            if is_layer(path, "streetmap") {
                let layer = VectorLayer::new("roads", None, vec![line(&[(-180.0, 90.0), (0.0, 0.0), (180.0, -90.0)])]);
                Ok(Dataset::new(path).with_layer(layer))
            } else if is_layer(path, "terrain") {
                let band = RasterBand::new(2, 1, vec![1.0, 0.0])?;
                Ok(Dataset::new(path).with_band(band))
            } else {
                bail!("{} does not exist", path.display())
            }
        }))
    }

    fn session() -> MapSession {
        MapSession::new(&MapConfig::default(), opener(), 360.0, 180.0)
    }

    #[test]
    fn test_vector_only_dataset() {
        let mut s = session();
        s.load_current();

        assert_eq!(s.diagnostics(), &[MapError::NoRasterBand {
            path: "resources/maps/streetmap".into()
        }]);
        let frame = s.render().unwrap();
        assert!(frame.pixels.is_empty());
        assert_eq!(frame.fit, ViewportFit::IDENTITY);
        assert_eq!(frame.polylines.len(), 1);
        assert_eq!(frame.polylines[0].points.len(), 3);
        assert_eq!(frame.polylines[0].points[1], DVec2::new(180.0, 90.0));
        assert_eq!(frame.polylines[0].color, VECTOR_COLOR);
        assert_eq!(frame.base_layer, Some(BaseLayer::Streetmap));
    }

    #[test]
    fn test_failed_load_keeps_prior_scene() {
        let mut s = session();
        s.load_layer(BaseLayer::Terrain);
        let _ = s.render();

        s.load_layer(BaseLayer::Satellite);
        assert!(s.diagnostics()[0].is_load_failure());
        assert_eq!(s.catalog().current(), BaseLayer::Terrain);
        assert_eq!(s.dataset_path(), None);
        assert!(s.render().is_none());

        // A pointer event forces a frame; it still shows terrain
        s.handle_pointer_down(s.layout.layers_button.origin());
        let frame = s.render().unwrap();
        assert_eq!(frame.base_layer, Some(BaseLayer::Terrain));
        assert_eq!(frame.pixels.get(0, 0), Some(FOREGROUND));
        assert!(frame.status.contains("failed to open dataset"));
    }

    #[test]
    fn test_failure_on_first_load_shows_nothing() {
        let config = MapConfig {
            initial: BaseLayer::Topographic,
            ..MapConfig::default()
        };
        let mut s = MapSession::new(&config, opener(), 360.0, 180.0);
        s.load_current();
        let frame = s.render().unwrap();
        assert_eq!(frame.base_layer, None);
        assert!(frame.polylines.is_empty());
    }

    #[test]
    fn test_prior_dataset_released_before_open() {
        let opened: Rc<RefCell<Vec<String>>> = Rc::default();
        let log = Rc::clone(&opened);
        let opener = FnOpener(move |path: &Path| {
            log.borrow_mut().push(path.display().to_string());
            Ok(Dataset::new(path))
        });
        let mut s = MapSession::new(&MapConfig::default(), Box::new(opener), 10.0, 10.0);
        s.load_layer(BaseLayer::Terrain);
        assert_eq!(s.dataset_path(), Some(Path::new("resources/maps/terrain")));
        s.load_layer(BaseLayer::Satellite);
        assert_eq!(s.dataset_path(), Some(Path::new("resources/maps/satellite")));
        assert_eq!(opened.borrow().len(), 2);
        assert!(s.render().unwrap().status.contains("resources/maps/satellite"));
    }

    #[test]
    fn test_raster_fit() {
        let mut s = MapSession::new(&MapConfig::default(), opener(), 100.0, 100.0);
        s.load_layer(BaseLayer::Terrain);
        let frame = s.render().unwrap();
        assert_eq!(frame.fit.scale, 50.0);
        assert_eq!(frame.fit.origin, DVec2::new(0.0, 25.0));
    }

    #[test]
    fn test_dirty_flag_consumed_once() {
        let mut s = session();
        assert!(s.render().is_some());
        assert!(s.render().is_none());
        s.load_current();
        assert!(s.render().is_some());
        assert!(s.render().is_none());
    }

    #[test]
    fn test_unsupported_geometry_and_transform_diagnostics() {
        let opener = FnOpener(|path: &Path| {
            let features = vec![
                Geometry::Point(DVec2::ZERO),
                line(&[(0.0, 0.0), (10.0, 10.0)]),
                Geometry::Other("TIN".into()),
            ];
            let srs = Some(SpatialReference::epsg(27700));
            Ok(Dataset::new(path).with_layer(VectorLayer::new("grid", srs, features)))
        });
        let mut s = MapSession::new(&MapConfig::default(), Box::new(opener), 360.0, 180.0);
        s.load_current();

        let kinds: Vec<_> = s
            .diagnostics()
            .iter()
            .filter_map(|e| match e {
                MapError::UnsupportedGeometryType { kind } => Some(kind.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec![GeometryKind::Point, GeometryKind::Other("TIN".into())]);
        assert!(s
            .diagnostics()
            .iter()
            .any(|e| matches!(e, MapError::TransformUnavailable { .. })));

        // Raw coordinates are used when no transform exists
        let frame = s.render().unwrap();
        assert_eq!(frame.polylines.len(), 1);
        assert_eq!(frame.polylines[0].points[1], DVec2::new(190.0, 80.0));
    }

    #[test]
    fn test_web_mercator_layer_is_transformed() {
        let opener = FnOpener(|path: &Path| {
            let srs = Some(SpatialReference::epsg(3857));
            let layer = VectorLayer::new("m", srs, vec![line(&[(0.0, 0.0), (20037508.342789244, 0.0)])]);
            Ok(Dataset::new(path).with_layer(layer))
        });
        let mut s = MapSession::new(&MapConfig::default(), Box::new(opener), 360.0, 180.0);
        s.load_current();
        let frame = s.render().unwrap();
        let end = frame.polylines[0].points[1];
        assert!((end.x - 360.0).abs() < 1e-6);
        assert!((end.y - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_resize_rescales_cached_polylines() {
        let mut s = session();
        s.load_current();
        s.resize(720.0, 90.0);
        let frame = s.render().unwrap();
        assert_eq!(frame.size, DVec2::new(720.0, 90.0));
        assert_eq!(frame.polylines[0].points[2], DVec2::new(720.0, 90.0));
        assert_eq!(frame.layout.layers_button.x, 720.0 - 2.0 - 12.0);
    }

    #[test]
    fn test_pointer_dispatch() {
        let mut s = session();
        let layers = s.layout.layers_button.origin();
        assert_eq!(s.handle_pointer_down(layers), Some(Control::LayersToggle));
        assert!(s.panel().layers_open());

        // Terrain button inside the now-open layers panel
        let terrain = s.layout.base_layer_buttons[2].1.origin();
        assert_eq!(s.handle_pointer_down(terrain), Some(Control::BaseLayer(BaseLayer::Terrain)));
        assert_eq!(s.catalog().current(), BaseLayer::Terrain);

        let secondary = s.layout.secondary_button.origin();
        assert_eq!(s.handle_pointer_down(secondary), Some(Control::SecondaryToggle));
        assert!(s.panel().secondary_open());
        assert!(!s.panel().layers_open());

        assert_eq!(s.handle_pointer_down(DVec2::new(180.0, 100.0)), None);

        let exit = s.layout.exit_button.origin();
        assert_eq!(s.handle_pointer_down(exit), Some(Control::Exit));
        assert!(s.exit_requested());
    }

    #[test]
    fn test_overlay_clicks_enable_secondary_layers() {
        let mut s = session();
        assert!(s.catalog().secondary_layers().is_empty());

        s.handle_pointer_down(s.layout.secondary_button.origin());
        let information = s.layout.secondary_layer_buttons[0].origin() + DVec2::new(20.0, 1.0);
        let resources = s.layout.secondary_layer_buttons[1].origin();

        assert_eq!(s.handle_pointer_down(information), Some(Control::SecondaryLayer(0)));
        assert_eq!(s.handle_pointer_down(resources), Some(Control::SecondaryLayer(1)));
        assert_eq!(s.handle_pointer_down(information), Some(Control::SecondaryLayer(0)));
        assert!(!s.exit_requested());

        assert_eq!(s.catalog().secondary_layers(), &["Information", "Resources", "Information"]);
        let frame = s.render().unwrap();
        assert_eq!(frame.overlay_names, &["Information", "Resources"]);
        assert_eq!(frame.secondary_layers.len(), 3);
    }

    #[test]
    fn test_text_input_routing() {
        let mut s = session();
        let _ = s.render();

        // Ignored while search is closed
        s.handle_text_input('x');
        assert!(s.render().is_none());

        s.handle_pointer_down(s.layout.search_button.origin());
        for c in "osloX".chars() {
            s.handle_text_input(c);
        }
        s.handle_text_input('\u{8}');
        s.handle_text_input('\u{1b}');
        s.handle_text_input('é');
        assert_eq!(s.render().unwrap().search_text, Some("oslo"));

        s.handle_text_input('\r');
        assert_eq!(s.last_query(), Some("oslo"));
        assert!(!s.panel().search_active());
        assert_eq!(s.render().unwrap().search_text, None);
    }

    #[test]
    fn test_closing_search_discards_text() {
        let mut s = session();
        let search = s.layout.search_button.origin();
        s.handle_pointer_down(search);
        s.handle_text_input('a');
        s.handle_pointer_down(search);
        s.handle_pointer_down(search);
        assert_eq!(s.panel().search_text(), "");
        assert_eq!(s.last_query(), None);
    }
}
