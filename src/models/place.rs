//! Geographic point and envelope types shared by the containment and query code.

use geo::Point;
use serde::{Deserialize, Serialize};

/// Geographic point (lat/lon, degrees)
///
/// GeoJSON sources store positions as `[lon, lat]`; use [`GeoPoint::from_lon_lat`]
/// when reading them so the transposition happens in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build from a GeoJSON-ordered position
    pub fn from_lon_lat(lon: f64, lat: f64) -> Self {
        Self { lat, lon }
    }

    /// Convert to a `geo` point (x = lon, y = lat)
    pub fn to_geo(self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }

    /// Both coordinates are finite numbers
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

impl From<Point<f64>> for GeoPoint {
    fn from(p: Point<f64>) -> Self {
        Self {
            lat: p.y(),
            lon: p.x(),
        }
    }
}

impl From<GeoPoint> for Point<f64> {
    fn from(p: GeoPoint) -> Self {
        p.to_geo()
    }
}

/// Bounding box envelope
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBbox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBbox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Grow this box to also cover `other`
    pub fn union(self, other: GeoBbox) -> GeoBbox {
        GeoBbox {
            min_lon: self.min_lon.min(other.min_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lon: self.max_lon.max(other.max_lon),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }
}
