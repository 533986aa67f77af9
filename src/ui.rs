use geodash::braille::BrailleCanvas;
use geodash::map::{unproject, BaseLayer, RenderSet, Rgb, ScreenRect};
use glam::DVec2;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

/// Draw one frame from the session's render set
pub fn render(frame: &mut Frame, set: &RenderSet<'_>, mouse: Option<DVec2>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    let title = match set.base_layer {
        Some(layer) => format!(" geodash: {} ", layer),
        None => " geodash ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(chunks[0]);
    frame.render_widget(block, chunks[0]);
    frame.render_widget(MapWidget { set }, inner);

    render_status_bar(frame, set, mouse, chunks[1]);
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

/// Screen-pixel rectangle → terminal cells inside `area`, rounded outward
fn cell_rect(r: &ScreenRect, area: Rect) -> Rect {
    let x0 = (r.x / 2.0).floor().max(0.0) as u16;
    let y0 = (r.y / 4.0).floor().max(0.0) as u16;
    let x1 = ((r.x + r.width) / 2.0).ceil().max(0.0) as u16;
    let y1 = ((r.y + r.height) / 4.0).ceil().max(0.0) as u16;
    let rect = Rect::new(
        area.x.saturating_add(x0),
        area.y.saturating_add(y0),
        x1.saturating_sub(x0),
        y1.saturating_sub(y0),
    );
    rect.intersection(area)
}

/// Raster, overlays, panels and controls
struct MapWidget<'a, 's> {
    set: &'a RenderSet<'s>,
}

impl MapWidget<'_, '_> {
    /// Each terminal cell takes the raster color under its center
    fn render_raster(&self, area: Rect, buf: &mut Buffer) {
        let pixels = self.set.pixels;
        if pixels.is_empty() {
            return;
        }
        let fit = self.set.fit;
        let top_left = fit.to_screen(DVec2::ZERO);
        let bottom_right = fit.to_screen(DVec2::new(pixels.width() as f64, pixels.height() as f64));
        for row in 0..area.height {
            for col in 0..area.width {
                let center = DVec2::new(col as f64 * 2.0 + 1.0, row as f64 * 4.0 + 2.0);
                if center.cmplt(top_left).any() || center.cmpge(bottom_right).any() {
                    continue;
                }
                let cell = fit.to_raster(center).floor();
                if let Some(rgb) = pixels.get(cell.x as usize, cell.y as usize) {
                    buf[(area.x + col, area.y + row)].set_bg(color(rgb));
                }
            }
        }
    }

    fn render_polylines(&self, area: Rect, buf: &mut Buffer) {
        let mut colors: Vec<Rgb> = Vec::new();
        for polyline in self.set.polylines {
            if !colors.contains(&polyline.color) {
                colors.push(polyline.color);
            }
        }

        for rgb in colors {
            let mut canvas = BrailleCanvas::new(area.width as usize, area.height as usize);
            for polyline in self.set.polylines.iter().filter(|p| p.color == rgb) {
                canvas.draw_polyline(&polyline.points);
            }
            for row in 0..area.height {
                for col in 0..area.width {
                    if let Some(ch) = canvas.cell(col as usize, row as usize) {
                        buf[(area.x + col, area.y + row)].set_char(ch).set_fg(color(rgb));
                    }
                }
            }
        }
    }

    fn button(&self, rect: &ScreenRect, label: &str, active: bool, area: Rect, buf: &mut Buffer) {
        let cells = cell_rect(rect, area);
        if cells.is_empty() {
            return;
        }
        let style = if active {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        };
        Clear.render(cells, buf);
        Paragraph::new(label.to_string()).style(style).render(cells, buf);
    }

    fn panel(&self, rect: &ScreenRect, title: &str, area: Rect, buf: &mut Buffer) {
        let cells = cell_rect(rect, area);
        Clear.render(cells, buf);
        Block::default()
            .borders(Borders::LEFT | Borders::RIGHT)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(title)
            .style(Style::default().bg(Color::Black))
            .render(cells, buf);
    }
}

impl Widget for MapWidget<'_, '_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let set = self.set;
        let layout = set.layout;

        self.render_raster(area, buf);
        self.render_polylines(area, buf);

        if set.panel.layers_open() {
            self.panel(&layout.layers_panel, " Layers ", area, buf);
            for (layer, rect) in &layout.base_layer_buttons {
                let active = set.base_layer == Some(*layer);
                self.button(rect, layer.label(), active, area, buf);
            }
        }
        if set.panel.secondary_open() {
            self.panel(&layout.secondary_panel, " Overlays ", area, buf);
            for (name, rect) in set.overlay_names.iter().zip(&layout.secondary_layer_buttons) {
                let active = set.secondary_layers.contains(name);
                self.button(rect, name, active, area, buf);
            }
        }

        if let Some(text) = set.search_text {
            let bar = cell_rect(&layout.search_bar, area);
            Clear.render(bar, buf);
            let line = Line::from(vec![
                Span::styled(" Search: ", Style::default().fg(Color::DarkGray)),
                Span::styled(format!("{}_", text), Style::default().fg(Color::White)),
            ]);
            Paragraph::new(line)
                .style(Style::default().bg(Color::Black))
                .render(bar, buf);
        }

        self.button(&layout.exit_button, "X", false, area, buf);
        self.button(&layout.search_button, "/", set.search_text.is_some(), area, buf);
        self.button(&layout.secondary_button, "O", set.panel.secondary_open(), area, buf);
        self.button(&layout.layers_button, "L", set.panel.layers_open(), area, buf);
    }
}

fn render_status_bar(frame: &mut Frame, set: &RenderSet<'_>, mouse: Option<DVec2>, area: Rect) {
    let mut spans = vec![Span::styled(
        format!(" {} ", set.status),
        Style::default().fg(Color::Yellow),
    )];

    if let Some(p) = mouse.filter(|p| p.x < set.size.x && p.y < set.size.y) {
        let geo = unproject(p, set.size.x, set.size.y);
        spans.push(Span::styled("| ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(
            format!(
                "{:.1}°{}, {:.1}°{} ",
                geo.y.abs(),
                if geo.y >= 0.0 { "N" } else { "S" },
                geo.x.abs(),
                if geo.x >= 0.0 { "E" } else { "W" }
            ),
            Style::default().fg(Color::Cyan),
        ));
    }

    let layers = BaseLayer::ALL
        .iter()
        .map(|l| l.label())
        .collect::<Vec<_>>()
        .join("/");
    spans.push(Span::styled(
        format!("| click L: {}  O: overlays  /: search  q: quit", layers),
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
