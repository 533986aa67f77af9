use glam::DVec2;
use std::f64::consts::PI;
use std::fmt;

use crate::map::error::MapError;

/// WGS84 semi-major axis, the sphere radius used by Web Mercator
const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Coordinate reference system descriptor attached to a vector layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpatialReference {
    authority: String,
    code: String,
}

impl SpatialReference {
    pub fn new(authority: &str, code: &str) -> Self {
        Self {
            authority: authority.to_ascii_uppercase(),
            code: code.to_ascii_uppercase(),
        }
    }

    pub fn epsg(code: u32) -> Self {
        Self::new("EPSG", &code.to_string())
    }

    /// The fixed target of every transform
    pub fn wgs84() -> Self {
        Self::epsg(4326)
    }

    /// Parse an authority string.
    ///
    /// Accepts `EPSG:3857`, `urn:ogc:def:crs:EPSG::3857`,
    /// `urn:ogc:def:crs:OGC:1.3:CRS84`, `CRS84` and `WGS84`. Anything else
    /// non-empty is kept verbatim under the `USER` authority so it can still
    /// be reported; no transform will exist for it.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let upper = text.to_ascii_uppercase();

        if upper == "WGS84" || upper == "WGS 84" {
            return Some(Self::wgs84());
        }
        if upper == "CRS84" || upper == "OGC:CRS84" {
            return Some(Self::new("OGC", "CRS84"));
        }
        if let Some(rest) = upper.strip_prefix("URN:OGC:DEF:CRS:") {
            // AUTHORITY:[VERSION]:CODE
            let mut parts = rest.split(':');
            let authority = parts.next().unwrap_or_default();
            let code = parts.last().unwrap_or_default();
            if !authority.is_empty() && !code.is_empty() {
                return Some(Self::new(authority, code));
            }
        }
        if let Some((authority, code)) = upper.split_once(':') {
            if !authority.is_empty() && !code.is_empty() && !code.contains(':') {
                return Some(Self::new(authority, code));
            }
        }

        Some(Self::new("USER", text))
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    fn is_geographic_wgs84(&self) -> bool {
        match self.authority.as_str() {
            // NAD83 differs from WGS84 by about a metre; treat as equivalent
            "EPSG" => matches!(self.code.as_str(), "4326" | "4269"),
            "OGC" => self.code == "CRS84",
            _ => false,
        }
    }

    fn is_web_mercator(&self) -> bool {
        match self.authority.as_str() {
            "EPSG" => matches!(self.code.as_str(), "3857" | "900913" | "3785" | "102100" | "102113"),
            "ESRI" => matches!(self.code.as_str(), "102100" | "102113"),
            _ => false,
        }
    }
}

impl fmt::Display for SpatialReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.authority, self.code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Identity,
    InverseWebMercator,
}

/// Transform from a layer's spatial reference to WGS84 lon/lat.
///
/// Scoped to one vector-layer load: the session creates it when it starts a
/// layer and drops it when the layer is done, whichever way that happens.
#[derive(Debug)]
pub struct CoordinateTransform {
    source: SpatialReference,
    method: Method,
}

impl CoordinateTransform {
    /// Build the transform `source` → WGS84
    pub fn to_wgs84(source: &SpatialReference) -> Result<Self, MapError> {
        let method = if source.is_geographic_wgs84() {
            Method::Identity
        } else if source.is_web_mercator() {
            Method::InverseWebMercator
        } else {
            return Err(MapError::TransformUnavailable { srs: source.to_string() });
        };

        tracing::trace!(source = %source, ?method, "acquired coordinate transform");
        Ok(Self { source: source.clone(), method })
    }

    pub fn source(&self) -> &SpatialReference {
        &self.source
    }

    /// Transform one coordinate. `None` when the result is not a valid
    /// geographic position.
    pub fn transform(&self, x: f64, y: f64) -> Option<DVec2> {
        let (lon, lat) = match self.method {
            Method::Identity => (x, y),
            Method::InverseWebMercator => {
                let lon = x / EARTH_RADIUS_M * 180.0 / PI;
                let lat = (y / EARTH_RADIUS_M).sinh().atan() * 180.0 / PI;
                (lon, lat)
            }
        };

        if !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0 {
            return None;
        }
        Some(DVec2::new(lon, lat))
    }
}

impl Drop for CoordinateTransform {
    fn drop(&mut self) {
        tracing::trace!(source = %self.source, "released coordinate transform");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Forward spherical Mercator, for round-trips
    fn web_mercator(lon: f64, lat: f64) -> (f64, f64) {
        let x = lon.to_radians() * EARTH_RADIUS_M;
        let lat_rad = lat.to_radians();
        let y = (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() * EARTH_RADIUS_M;
        (x, y)
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(SpatialReference::parse("EPSG:3857"), Some(SpatialReference::epsg(3857)));
        assert_eq!(
            SpatialReference::parse("urn:ogc:def:crs:EPSG::3857"),
            Some(SpatialReference::epsg(3857))
        );
        assert_eq!(
            SpatialReference::parse("urn:ogc:def:crs:OGC:1.3:CRS84"),
            Some(SpatialReference::new("OGC", "CRS84"))
        );
        assert_eq!(SpatialReference::parse("wgs84"), Some(SpatialReference::wgs84()));
        assert_eq!(SpatialReference::parse("   "), None);
        assert_eq!(SpatialReference::parse("PROJCS[...]").unwrap().authority(), "USER");
    }

    #[test]
    fn test_identity_for_geographic() {
        let t = CoordinateTransform::to_wgs84(&SpatialReference::new("OGC", "CRS84")).unwrap();
        assert_eq!(t.transform(12.5, -33.0), Some(DVec2::new(12.5, -33.0)));
    }

    #[test]
    fn test_web_mercator_round_trip() {
        let t = CoordinateTransform::to_wgs84(&SpatialReference::epsg(3857)).unwrap();
        for &(lon, lat) in &[(0.0, 0.0), (-74.0, 40.7), (139.7, 35.7), (151.2, -33.9)] {
            let (x, y) = web_mercator(lon, lat);
            let p = t.transform(x, y).unwrap();
            assert!((p.x - lon).abs() < 1e-9, "lon {} vs {}", p.x, lon);
            assert!((p.y - lat).abs() < 1e-9, "lat {} vs {}", p.y, lat);
        }
    }

    #[test]
    fn test_unknown_source_is_unavailable() {
        let err = CoordinateTransform::to_wgs84(&SpatialReference::epsg(27700)).unwrap_err();
        assert_eq!(err, MapError::TransformUnavailable { srs: "EPSG:27700".to_string() });
    }

    #[test]
    fn test_invalid_result_is_none() {
        let t = CoordinateTransform::to_wgs84(&SpatialReference::wgs84()).unwrap();
        assert_eq!(t.transform(10.0, 95.0), None);
        assert_eq!(t.transform(f64::NAN, 0.0), None);
    }
}
