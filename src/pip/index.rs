//! Spatial index for fast boundary ring lookups.

use std::sync::Arc;

use rstar::{RTree, RTreeObject, AABB};
use tracing::debug;

use super::geometry::{point_in_ring, BoundaryRing};
use crate::models::GeoPoint;

/// Wrapper for R-tree indexing of boundary rings
#[derive(Clone)]
pub struct IndexedRing {
    pub ring: Arc<BoundaryRing>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedRing {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedRing {
    pub fn new(ring: Arc<BoundaryRing>) -> Option<Self> {
        let bbox = ring.bbox()?;
        Some(Self {
            ring,
            envelope: AABB::from_corners([bbox.min_lon, bbox.min_lat], [bbox.max_lon, bbox.max_lat]),
        })
    }
}

/// Spatial index over the rings of one boundary, keyed on (lon, lat) envelopes
#[derive(Clone)]
pub struct RingSpatialIndex {
    tree: RTree<IndexedRing>,
}

impl RingSpatialIndex {
    /// Build spatial index from boundary rings
    pub fn build(rings: &[Arc<BoundaryRing>]) -> Self {
        let indexed: Vec<IndexedRing> = rings
            .iter()
            .cloned()
            .filter_map(IndexedRing::new)
            .collect();

        let tree = RTree::bulk_load(indexed);
        debug!("Ring index built with {} entries", tree.size());

        Self { tree }
    }

    /// Whether any indexed ring contains the point
    pub fn any_contains(&self, point: GeoPoint) -> bool {
        if !point.is_finite() {
            return false;
        }
        // Envelope prefilter, then exact containment
        let query_envelope = AABB::from_point([point.lon, point.lat]);
        self.tree
            .locate_in_envelope_intersecting(&query_envelope)
            .any(|ir| point_in_ring(point, &ir.ring))
    }

    /// Get total number of indexed rings
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(min_lat: f64, min_lon: f64, size: f64) -> Arc<BoundaryRing> {
        Arc::new(
            BoundaryRing::new(&[
                GeoPoint::new(min_lat, min_lon),
                GeoPoint::new(min_lat, min_lon + size),
                GeoPoint::new(min_lat + size, min_lon + size),
                GeoPoint::new(min_lat + size, min_lon),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_any_contains_overlapping_rings() {
        let index = RingSpatialIndex::build(&[ring(0.0, 0.0, 2.0), ring(1.0, 1.0, 2.0), ring(10.0, 10.0, 1.0)]);
        assert_eq!(index.len(), 3);

        assert!(index.any_contains(GeoPoint::new(1.5, 1.5)));
        assert!(index.any_contains(GeoPoint::new(0.5, 0.5)));
        assert!(!index.any_contains(GeoPoint::new(5.0, 5.0)));
        assert!(index.any_contains(GeoPoint::new(10.5, 10.5)));
        assert!(!index.any_contains(GeoPoint::new(f64::NAN, 0.5)));
    }

    #[test]
    fn test_envelope_hit_but_outside_ring() {
        // Triangle: the envelope covers (0.9, 0.9) but the ring does not
        let tri = Arc::new(
            BoundaryRing::new(&[
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(0.0, 1.0),
                GeoPoint::new(1.0, 0.0),
            ])
            .unwrap(),
        );
        let index = RingSpatialIndex::build(&[tri]);
        assert!(!index.any_contains(GeoPoint::new(0.9, 0.9)));
        assert!(index.any_contains(GeoPoint::new(0.1, 0.1)));
    }

    #[test]
    fn test_empty_index() {
        let index = RingSpatialIndex::build(&[]);
        assert!(index.is_empty());
        assert!(!index.any_contains(GeoPoint::new(0.0, 0.0)));
    }
}
