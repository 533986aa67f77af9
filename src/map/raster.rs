use rayon::prelude::*;

use crate::map::error::MapError;

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Single-band cells with a value above zero
pub const FOREGROUND: Rgb = Rgb::new(46, 139, 87);
/// Single-band cells at or below zero, no-data, NaN
pub const BACKGROUND: Rgb = Rgb::new(12, 24, 48);

/// One channel of gridded raster data, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBand {
    width: usize,
    height: usize,
    data: Vec<f32>,
    no_data: Option<f32>,
}

impl RasterBand {
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Result<Self, MapError> {
        let Some(cells) = width.checked_mul(height) else {
            return Err(MapError::BandRead {
                reason: format!("band of {}x{} is too large", width, height),
            });
        };
        if data.len() != cells {
            return Err(MapError::BandRead {
                reason: format!(
                    "band of {}x{} needs {} cells, got {}",
                    width,
                    height,
                    cells,
                    data.len()
                ),
            });
        }
        Ok(Self { width, height, data, no_data: None })
    }

    pub fn with_no_data(mut self, no_data: Option<f32>) -> Self {
        self.no_data = no_data;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn no_data(&self) -> Option<f32> {
        self.no_data
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    #[inline(always)]
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x < self.width && y < self.height {
            Some(self.data[y * self.width + x])
        } else {
            None
        }
    }

    #[inline(always)]
    fn is_no_data(&self, value: f32) -> bool {
        self.no_data.is_some_and(|nd| nd == value)
    }
}

/// Per-cell display colors derived from a raster load
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl PixelBuffer {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    #[inline(always)]
    pub fn get(&self, x: usize, y: usize) -> Option<Rgb> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }
}

/// Scale a value presumed in [0, 1] to a channel; out-of-range input is
/// clamped, not wrapped
#[inline(always)]
fn channel(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0) as u8
}

/// Turn raster bands into a pixel buffer.
///
/// Fewer than three bands: band 1 is thresholded (`> 0` is foreground).
/// Three or more: bands 1-3 are read as red, green, blue in [0, 1].
/// The full extent of band 1 is used.
pub fn try_sample(bands: &[RasterBand]) -> Result<PixelBuffer, MapError> {
    let first = bands.first().ok_or_else(|| MapError::NoRasterBand {
        path: Default::default(),
    })?;
    let (width, height) = (first.width, first.height);
    let mut pixels = vec![Rgb::default(); width * height];

    if width == 0 || height == 0 {
        return Ok(PixelBuffer { width, height, pixels });
    }

    if bands.len() >= 3 {
        let (r, g, b) = (&bands[0], &bands[1], &bands[2]);
        for band in [g, b] {
            if band.width != width || band.height != height {
                return Err(MapError::BandRead {
                    reason: format!(
                        "true-color bands differ in size: {}x{} vs {}x{}",
                        width, height, band.width, band.height
                    ),
                });
            }
        }

        pixels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                let start = y * width;
                for (x, px) in row.iter_mut().enumerate() {
                    let i = start + x;
                    *px = Rgb::new(channel(r.data[i]), channel(g.data[i]), channel(b.data[i]));
                }
            });
    } else {
        pixels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                let start = y * width;
                for (x, px) in row.iter_mut().enumerate() {
                    let v = first.data[start + x];
                    *px = if v > 0.0 && !first.is_no_data(v) { FOREGROUND } else { BACKGROUND };
                }
            });
    }

    Ok(PixelBuffer { width, height, pixels })
}

/// Like [`try_sample`], but never fails: problems are logged and an empty
/// buffer is returned so vector content can still be drawn.
pub fn sample(bands: &[RasterBand]) -> PixelBuffer {
    match try_sample(bands) {
        Ok(buffer) => buffer,
        Err(e) => {
            tracing::warn!("{}", e);
            PixelBuffer::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(width: usize, height: usize, data: &[f32]) -> RasterBand {
        RasterBand::new(width, height, data.to_vec()).unwrap()
    }

    #[test]
    fn test_band_size_is_validated() {
        assert!(RasterBand::new(2, 2, vec![0.0; 3]).is_err());
        assert!(RasterBand::new(0, 5, vec![]).is_ok());
        assert!(matches!(
            RasterBand::new(usize::MAX, 2, vec![]),
            Err(MapError::BandRead { .. })
        ));
    }

    #[test]
    fn test_single_band_threshold() {
        let b = band(3, 2, &[0.0, 1.0, -4.0, 0.001, f32::NAN, 250.0]);
        let buf = try_sample(&[b]).unwrap();
        assert_eq!((buf.width(), buf.height()), (3, 2));
        assert_eq!(
            buf.pixels(),
            &[BACKGROUND, FOREGROUND, BACKGROUND, FOREGROUND, BACKGROUND, FOREGROUND]
        );
    }

    #[test]
    fn test_no_data_is_background() {
        let b = band(2, 1, &[9999.0, 5.0]).with_no_data(Some(9999.0));
        let buf = try_sample(&[b]).unwrap();
        assert_eq!(buf.get(0, 0), Some(BACKGROUND));
        assert_eq!(buf.get(1, 0), Some(FOREGROUND));
    }

    #[test]
    fn test_two_bands_use_first_only() {
        let a = band(1, 1, &[1.0]);
        let b = band(4, 4, &[0.0; 16]);
        let buf = try_sample(&[a, b]).unwrap();
        assert_eq!(buf.pixels(), &[FOREGROUND]);
    }

    #[test]
    fn test_true_color_scaling_and_clamping() {
        let r = band(2, 1, &[1.0, 2.5]);
        let g = band(2, 1, &[0.5, -1.0]);
        let b = band(2, 1, &[0.0, 0.2]);
        let buf = try_sample(&[r, g, b]).unwrap();
        assert_eq!(buf.get(0, 0), Some(Rgb::new(255, 127, 0)));
        assert_eq!(buf.get(1, 0), Some(Rgb::new(255, 0, 51)));
    }

    #[test]
    fn test_true_color_size_mismatch() {
        let r = band(2, 1, &[1.0, 1.0]);
        let g = band(1, 1, &[1.0]);
        let b = band(2, 1, &[1.0, 1.0]);
        assert!(matches!(try_sample(&[r, g, b]), Err(MapError::BandRead { .. })));
    }

    #[test]
    fn test_no_band() {
        assert!(matches!(try_sample(&[]), Err(MapError::NoRasterBand { .. })));
        assert!(sample(&[]).is_empty());
    }
}
