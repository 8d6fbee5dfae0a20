//! Ring primitives: construction, single-ring containment and circle buffers.

use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{BoundingRect, Coord, Destination, Haversine, LineString, Polygon};
use hashbrown::HashSet;

use crate::models::{GeoBbox, GeoPoint};

/// Vertex count used for radius buffers, matching the drawn circle
pub const DEFAULT_CIRCLE_STEPS: usize = 80;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RingError {
    #[error("ring needs at least 3 distinct vertices, got {distinct}")]
    TooFewVertices { distinct: usize },
    #[error("ring contains a non-finite coordinate")]
    NonFinite,
    #[error("circle radius must be a positive number of kilometers, got {0}")]
    InvalidRadius(f64),
}

/// A closed polygon ring with no holes
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryRing {
    polygon: Polygon<f64>,
}

impl BoundaryRing {
    /// Build a ring from its vertices, closing it if needed
    pub fn new(points: &[GeoPoint]) -> Result<Self, RingError> {
        Self::from_coords(points.iter().map(|p| Coord { x: p.lon, y: p.lat }).collect())
    }

    /// Build a ring from `geo` coordinates (x = lon, y = lat)
    pub fn from_coords(mut coords: Vec<Coord<f64>>) -> Result<Self, RingError> {
        if coords.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(RingError::NonFinite);
        }

        let distinct = coords
            .iter()
            .map(|c| (c.x.to_bits(), c.y.to_bits()))
            .collect::<HashSet<_>>()
            .len();
        if distinct < 3 {
            return Err(RingError::TooFewVertices { distinct });
        }

        // Close the ring if needed
        if coords.first() != coords.last() {
            coords.push(coords[0]);
        }

        Ok(Self {
            polygon: Polygon::new(LineString::new(coords), vec![]),
        })
    }

    /// Vertices including the closing one
    pub fn vertices(&self) -> impl Iterator<Item = GeoPoint> + '_ {
        self.polygon
            .exterior()
            .coords()
            .map(|c| GeoPoint::from_lon_lat(c.x, c.y))
    }

    /// Number of stored vertices, closing vertex included
    pub fn len(&self) -> usize {
        self.polygon.exterior().0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bbox(&self) -> Option<GeoBbox> {
        self.polygon
            .bounding_rect()
            .map(|rect| GeoBbox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }
}

/// Whether `p` lies in `ring`.
///
/// Points on an edge or a vertex count as inside, for every ring.
pub fn point_in_ring(p: GeoPoint, ring: &BoundaryRing) -> bool {
    if !p.is_finite() {
        return false;
    }
    let coord = Coord { x: p.lon, y: p.lat };
    ring.polygon.coordinate_position(&coord) != CoordPos::Outside
}

/// Regular polygon approximating a circle of `radius_km` around `center`.
///
/// Vertex `i` sits at great-circle distance `radius_km` and bearing
/// `-i * 360 / steps` degrees; the first vertex is repeated to close the ring.
/// A radius so small that the vertices coincide (well under a millimeter)
/// yields `TooFewVertices`.
pub fn circle_polygon(
    center: GeoPoint,
    radius_km: f64,
    steps: usize,
) -> Result<BoundaryRing, RingError> {
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(RingError::InvalidRadius(radius_km));
    }
    if !center.is_finite() {
        return Err(RingError::NonFinite);
    }

    let steps = steps.max(3);
    let origin = center.to_geo();
    let radius_m = radius_km * 1000.0;

    let coords: Vec<Coord<f64>> = (0..steps)
        .map(|i| {
            let bearing = (i as f64) * -360.0 / (steps as f64);
            Haversine.destination(origin, bearing, radius_m).0
        })
        .collect();

    BoundaryRing::from_coords(coords)
}
