use glam::DVec2;

/// Dot bit for `(x % 2, y % 4)` inside a cell:
///
/// ```text
/// (0,0) (1,0)   0x01 0x08
/// (0,1) (1,1)   0x02 0x10
/// (0,2) (1,2)   0x04 0x20
/// (0,3) (1,3)   0x40 0x80
/// ```
const DOT_BITS: [[u8; 4]; 2] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

const BRAILLE_BLANK: u32 = 0x2800;

/// Braille Unicode canvas. Each terminal cell holds a 2x4 grid of dots, so
/// a canvas of `w`x`h` cells has `2w`x`4h` pixels.
pub struct BrailleCanvas {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl BrailleCanvas {
    /// Size in terminal cells
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0u8; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Out-of-range pixels are ignored
    #[inline(always)]
    pub fn set_pixel(&mut self, x: usize, y: usize) {
        let (cx, cy) = (x / 2, y / 4);
        if cx >= self.width || cy >= self.height {
            return;
        }
        self.cells[cy * self.width + cx] |= DOT_BITS[x % 2][y % 4];
    }

    #[inline(always)]
    pub fn set_pixel_signed(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize);
        }
    }

    /// Bresenham between two screen-pixel points
    pub fn draw_line(&mut self, from: DVec2, to: DVec2) {
        // Clamp far-off endpoints so the step loop stays bounded
        let limit = 4.0 * (self.width.max(self.height) as f64 + 16.0);
        let clamp = |v: f64| v.clamp(-limit, limit).round() as i32;
        let (mut x0, mut y0) = (clamp(from.x), clamp(from.y));
        let (x1, y1) = (clamp(to.x), clamp(to.y));

        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.set_pixel_signed(x0, y0);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Connect consecutive points. A single point is plotted on its own.
    pub fn draw_polyline(&mut self, points: &[DVec2]) {
        match points {
            [] => {}
            [p] => self.draw_line(*p, *p),
            _ => {
                for pair in points.windows(2) {
                    self.draw_line(pair[0], pair[1]);
                }
            }
        }
    }

    /// Character at a cell, `None` when empty or out of range
    pub fn cell(&self, col: usize, row: usize) -> Option<char> {
        if col >= self.width || row >= self.height {
            return None;
        }
        match self.cells[row * self.width + col] {
            0 => None,
            bits => char::from_u32(BRAILLE_BLANK + bits as u32),
        }
    }

    pub fn row_to_string(&self, row: usize) -> String {
        if row >= self.height {
            return String::new();
        }
        self.cells[row * self.width..(row + 1) * self.width]
            .iter()
            .map(|&b| char::from_u32(BRAILLE_BLANK + b as u32).unwrap_or(' '))
            .collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.height).map(|i| self.row_to_string(i))
    }

    #[cfg(test)]
    fn render(&self) -> String {
        self.rows().collect::<Vec<_>>().join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pixel() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.set_pixel(0, 0);
        assert_eq!(canvas.render(), "⠁");
    }

    #[test]
    fn test_all_dots() {
        let mut canvas = BrailleCanvas::new(1, 1);
        for x in 0..2 {
            for y in 0..4 {
                canvas.set_pixel(x, y);
            }
        }
        assert_eq!(canvas.render(), "⣿");
    }

    #[test]
    fn test_diagonal_line() {
        let mut canvas = BrailleCanvas::new(2, 1);
        canvas.draw_line(DVec2::new(0.0, 0.0), DVec2::new(3.0, 3.0));
        // (0,0) (1,1) | (2,2) (3,3)
        assert_eq!(canvas.render(), "⠑⢄");
    }

    #[test]
    fn test_horizontal_polyline_and_clipping() {
        let mut canvas = BrailleCanvas::new(2, 1);
        canvas.draw_polyline(&[DVec2::new(-10.0, 0.0), DVec2::new(1e9, 0.0)]);
        assert_eq!(canvas.render(), "⠉⠉");
        assert_eq!(canvas.cell(0, 0), Some('⠉'));
        assert_eq!(canvas.cell(5, 0), None);
    }

    #[test]
    fn test_single_point_polyline() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.draw_polyline(&[DVec2::new(1.0, 3.0)]);
        assert_eq!(canvas.render(), "⢀");
        assert_eq!(BrailleCanvas::new(1, 1).cell(0, 0), None);
    }
}
