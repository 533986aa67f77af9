use glam::DVec2;

use crate::map::transform::CoordinateTransform;

/// Project a geographic coordinate to screen pixels.
///
/// When a transform is given it is applied first; if it cannot map the
/// point, the raw input is used instead. The mapping itself is a plain
/// equirectangular normalization of the whole world onto the viewport:
///
/// ```text
/// x = (lon + 180) * width  / 360
/// y = (90  - lat) * height / 180
/// ```
///
/// Overlays therefore only line up with a full-world raster. Results are
/// not clipped.
#[inline(always)]
pub fn project(
    lon: f64,
    lat: f64,
    transform: Option<&CoordinateTransform>,
    width: f64,
    height: f64,
) -> DVec2 {
    let geo = transform
        .and_then(|t| t.transform(lon, lat))
        .unwrap_or(DVec2::new(lon, lat));

    DVec2::new(
        (geo.x + 180.0) * width / 360.0,
        (90.0 - geo.y) * height / 180.0,
    )
}

/// Inverse of [`project`] without a transform (screen pixel to lon/lat)
pub fn unproject(point: DVec2, width: f64, height: f64) -> DVec2 {
    if width <= 0.0 || height <= 0.0 {
        return DVec2::ZERO;
    }
    DVec2::new(
        point.x * 360.0 / width - 180.0,
        90.0 - point.y * 180.0 / height,
    )
}

/// Per-axis factor that maps points projected for one viewport size onto
/// another. The projection is linear in the viewport size, so this is exact.
pub fn rescale_factor(from: DVec2, to: DVec2) -> DVec2 {
    let axis = |from: f64, to: f64| if from > 0.0 { to / from } else { 1.0 };
    DVec2::new(axis(from.x, to.x), axis(from.y, to.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::transform::SpatialReference;

    #[test]
    fn test_project_center() {
        let p = project(0.0, 0.0, None, 100.0, 100.0);
        assert_eq!(p, DVec2::new(50.0, 50.0));

        let p = project(0.0, 0.0, None, 1280.0, 720.0);
        assert_eq!(p, DVec2::new(640.0, 360.0));
    }

    #[test]
    fn test_project_corners() {
        assert_eq!(project(-180.0, 90.0, None, 640.0, 480.0), DVec2::new(0.0, 0.0));
        assert_eq!(project(180.0, -90.0, None, 640.0, 480.0), DVec2::new(640.0, 480.0));
    }

    #[test]
    fn test_project_does_not_clip() {
        let p = project(270.0, -135.0, None, 360.0, 180.0);
        assert_eq!(p, DVec2::new(450.0, 225.0));
    }

    #[test]
    fn test_failed_transform_falls_back_to_input() {
        let t = CoordinateTransform::to_wgs84(&SpatialReference::wgs84()).unwrap();
        // Latitude out of range: the transform rejects it, raw values are used
        let with = project(10.0, 120.0, Some(&t), 360.0, 180.0);
        let without = project(10.0, 120.0, None, 360.0, 180.0);
        assert_eq!(with, without);
    }

    #[test]
    fn test_unproject_inverts_project() {
        let p = project(-74.0, 40.7, None, 800.0, 400.0);
        let geo = unproject(p, 800.0, 400.0);
        assert!((geo.x + 74.0).abs() < 1e-9);
        assert!((geo.y - 40.7).abs() < 1e-9);
    }

    #[test]
    fn test_rescale_factor() {
        let f = rescale_factor(DVec2::new(100.0, 50.0), DVec2::new(200.0, 25.0));
        assert_eq!(f, DVec2::new(2.0, 0.5));
        assert_eq!(rescale_factor(DVec2::ZERO, DVec2::new(10.0, 10.0)), DVec2::ONE);
    }
}
