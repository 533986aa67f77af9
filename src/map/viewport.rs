use glam::DVec2;

/// Uniform scale and offset that fit the raster inside the display area
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportFit {
    pub scale: f64,
    pub origin: DVec2,
}

impl ViewportFit {
    pub const IDENTITY: Self = Self { scale: 1.0, origin: DVec2::ZERO };

    /// Screen point → raster cell (floating, may be outside the raster)
    #[inline(always)]
    pub fn to_raster(&self, screen: DVec2) -> DVec2 {
        (screen - self.origin) / self.scale
    }

    /// Raster cell → screen point
    #[inline(always)]
    pub fn to_screen(&self, raster: DVec2) -> DVec2 {
        raster * self.scale + self.origin
    }
}

impl Default for ViewportFit {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Fit a raster into the viewport preserving its aspect ratio, centered.
///
/// An empty raster gets the identity fit.
pub fn fit(raster_width: usize, raster_height: usize, viewport_width: f64, viewport_height: f64) -> ViewportFit {
    if raster_width == 0 || raster_height == 0 {
        return ViewportFit::IDENTITY;
    }

    let rw = raster_width as f64;
    let rh = raster_height as f64;
    let scale = (viewport_width / rw).min(viewport_height / rh);

    ViewportFit {
        scale,
        origin: DVec2::new(
            (viewport_width - rw * scale) / 2.0,
            (viewport_height - rh * scale) / 2.0,
        ),
    }
}
