use geodash::map::{Control, MapSession};
use glam::DVec2;

/// Border on every side, plus the status bar row
const CHROME_COLS: u16 = 2;
const CHROME_ROWS: u16 = 3;

/// Map viewport size in braille pixels for a terminal of `cols`x`rows`
pub fn viewport_pixels(cols: u16, rows: u16) -> DVec2 {
    let inner_width = cols.saturating_sub(CHROME_COLS) as f64;
    let inner_height = rows.saturating_sub(CHROME_ROWS) as f64;
    // Braille gives 2x4 resolution per character
    DVec2::new(inner_width * 2.0, inner_height * 4.0)
}

/// Terminal cell → session coordinates (top-left dot of the cell), `None`
/// on the border
pub fn cell_to_pixel(col: u16, row: u16) -> Option<DVec2> {
    if col == 0 || row == 0 {
        return None;
    }
    Some(DVec2::new((col - 1) as f64 * 2.0, (row - 1) as f64 * 4.0))
}

/// Host state around the map session
pub struct App {
    pub session: MapSession,
    pub should_quit: bool,
    /// Current mouse position for the coordinate readout
    pub mouse_pos: Option<(u16, u16)>,
}

impl App {
    pub fn new(session: MapSession) -> Self {
        Self {
            session,
            should_quit: false,
            mouse_pos: None,
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        let size = viewport_pixels(cols, rows);
        self.session.resize(size.x, size.y);
    }

    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        if self.mouse_pos != Some((col, row)) {
            self.mouse_pos = Some((col, row));
            self.session.invalidate();
        }
    }

    /// Mouse position in session coordinates
    pub fn mouse_pixel_pos(&self) -> Option<DVec2> {
        self.mouse_pos.and_then(|(col, row)| cell_to_pixel(col, row))
    }

    pub fn click(&mut self, col: u16, row: u16) -> Option<Control> {
        let p = cell_to_pixel(col, row)?;
        self.session.handle_pointer_down(p)
    }

    pub fn search_active(&self) -> bool {
        self.session.panel().search_active()
    }

    pub fn type_char(&mut self, c: char) {
        self.session.handle_text_input(c);
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn done(&self) -> bool {
        self.should_quit || self.session.exit_requested()
    }
}
