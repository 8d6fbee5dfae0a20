//! Great-circle distance between two points.

use geo::{Distance, Haversine};

use crate::models::GeoPoint;

/// Haversine distance in kilometers on a spherical earth (mean radius 6371.0088 km)
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    Haversine.distance(a.to_geo(), b.to_geo()) / 1000.0
}
