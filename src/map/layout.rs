use glam::DVec2;

use crate::map::catalog::BaseLayer;
use crate::map::panel::PanelState;

/// Axis-aligned rectangle in screen pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Half-open: left/top edges inside, right/bottom edges outside
    #[inline(always)]
    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }

    pub fn origin(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }
}

/// Sizes of the map screen controls, in screen pixels
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub button_size: f64,
    pub margin: f64,
    /// Side panel width as a fraction of the viewport width
    pub panel_fraction: f64,
    pub search_bar_height: f64,
    pub layer_button_height: f64,
    /// Vertical distance between the tops of consecutive layer buttons
    pub layer_button_spacing: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        // Braille pixels: a terminal cell is 2 wide and 4 tall
        Self {
            button_size: 12.0,
            margin: 2.0,
            panel_fraction: 0.2,
            search_bar_height: 12.0,
            layer_button_height: 8.0,
            layer_button_spacing: 12.0,
        }
    }
}

/// Something the pointer can press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    LayersToggle,
    SecondaryToggle,
    SearchToggle,
    Exit,
    BaseLayer(BaseLayer),
    /// Index into the configured overlay names
    SecondaryLayer(usize),
}

/// Where every control and panel sits for one viewport size
#[derive(Debug, Clone, PartialEq)]
pub struct ControlLayout {
    pub layers_button: ScreenRect,
    pub secondary_button: ScreenRect,
    pub search_button: ScreenRect,
    pub exit_button: ScreenRect,
    pub layers_panel: ScreenRect,
    pub secondary_panel: ScreenRect,
    pub base_layer_buttons: Vec<(BaseLayer, ScreenRect)>,
    pub secondary_layer_buttons: Vec<ScreenRect>,
    pub search_bar: ScreenRect,
    pub search_text_origin: DVec2,
}

impl ControlLayout {
    pub fn new(width: f64, height: f64, config: &LayoutConfig, secondary_count: usize) -> Self {
        let size = config.button_size;
        let m = config.margin;
        let bottom = height - m - size;

        let panel_width = width * config.panel_fraction;
        let layers_panel = ScreenRect::new(width - panel_width, 0.0, panel_width, height);
        let secondary_panel = ScreenRect::new(0.0, 0.0, panel_width, height);

        // Panel buttons start below the exit button and the search bar
        let first_row = m + size.max(config.search_bar_height) + m;
        let stacked = |panel: &ScreenRect, i: usize| {
            ScreenRect::new(
                panel.x + m,
                first_row + i as f64 * config.layer_button_spacing,
                (panel.width - 2.0 * m).max(0.0),
                config.layer_button_height,
            )
        };

        let base_layer_buttons = BaseLayer::ALL
            .iter()
            .enumerate()
            .map(|(i, &layer)| (layer, stacked(&layers_panel, i)))
            .collect();
        let secondary_layer_buttons = (0..secondary_count)
            .map(|i| stacked(&secondary_panel, i))
            .collect();

        Self {
            layers_button: ScreenRect::new(width - m - size, bottom, size, size),
            secondary_button: ScreenRect::new(width - 2.0 * (m + size), bottom, size, size),
            search_button: ScreenRect::new(m, bottom, size, size),
            exit_button: ScreenRect::new(m, m, size, size),
            layers_panel,
            secondary_panel,
            base_layer_buttons,
            secondary_layer_buttons,
            search_bar: ScreenRect::new(0.0, 0.0, width, config.search_bar_height),
            search_text_origin: DVec2::new(m, m),
        }
    }

    /// First control under `p`, in priority order: layers, secondary and
    /// search toggles, exit, then the buttons of whichever panel is open.
    pub fn hit_test(&self, p: DVec2, state: &PanelState) -> Option<Control> {
        if self.layers_button.contains(p) {
            return Some(Control::LayersToggle);
        }
        if self.secondary_button.contains(p) {
            return Some(Control::SecondaryToggle);
        }
        if self.search_button.contains(p) {
            return Some(Control::SearchToggle);
        }
        if self.exit_button.contains(p) {
            return Some(Control::Exit);
        }
        if state.layers_open() {
            if let Some((layer, _)) = self.base_layer_buttons.iter().find(|(_, r)| r.contains(p)) {
                return Some(Control::BaseLayer(*layer));
            }
        }
        if state.secondary_open() {
            if let Some(i) = self.secondary_layer_buttons.iter().position(|r| r.contains(p)) {
                return Some(Control::SecondaryLayer(i));
            }
        }
        None
    }
}
