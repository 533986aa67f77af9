/// Which side panel is showing. The two panels exclude each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    Idle,
    LayersOpen,
    SecondaryOpen,
}

/// Panel and search-bar state of the map screen
#[derive(Debug, Clone, Default)]
pub struct PanelState {
    panel: Panel,
    search_active: bool,
    search_text: String,
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    pub fn layers_open(&self) -> bool {
        self.panel == Panel::LayersOpen
    }

    pub fn secondary_open(&self) -> bool {
        self.panel == Panel::SecondaryOpen
    }

    pub fn search_active(&self) -> bool {
        self.search_active
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// Open the layers panel (closing the secondary one), or close it
    pub fn toggle_layers(&mut self) {
        self.panel = match self.panel {
            Panel::LayersOpen => Panel::Idle,
            Panel::Idle | Panel::SecondaryOpen => Panel::LayersOpen,
        };
    }

    /// Open the secondary panel (closing the layers one), or close it
    pub fn toggle_secondary(&mut self) {
        self.panel = match self.panel {
            Panel::SecondaryOpen => Panel::Idle,
            Panel::Idle | Panel::LayersOpen => Panel::SecondaryOpen,
        };
    }

    /// Flip the search bar. Closing it clears the entered text.
    pub fn toggle_search(&mut self) {
        self.search_active = !self.search_active;
        if !self.search_active {
            self.search_text.clear();
        }
    }

    pub fn push_char(&mut self, c: char) {
        self.search_text.push(c);
    }

    pub fn pop_char(&mut self) {
        self.search_text.pop();
    }
}
