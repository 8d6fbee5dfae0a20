//! PIP service answering "is this point inside the reference boundary".

use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use super::Boundary;
use crate::models::GeoPoint;

/// Whether `point` is inside any ring of `boundary`.
///
/// A missing or empty boundary fails closed: every point is outside.
pub fn is_inside(point: GeoPoint, boundary: Option<&Boundary>) -> bool {
    match boundary {
        Some(b) => b.index().any_contains(point),
        None => false,
    }
}

/// Evaluate many points against the same boundary in parallel
pub fn classify_many(points: &[GeoPoint], boundary: Option<&Boundary>) -> Vec<bool> {
    points.par_iter().map(|p| is_inside(*p, boundary)).collect()
}

/// Point-in-Polygon lookup service
#[derive(Clone, Default)]
pub struct PipService {
    boundary: Option<Arc<Boundary>>,
}

impl PipService {
    /// Create a new PIP service from a loaded boundary
    pub fn new(boundary: Boundary) -> Self {
        Self {
            boundary: Some(Arc::new(boundary)),
        }
    }

    /// Service whose boundary has not loaded (yet)
    pub fn missing() -> Self {
        Self { boundary: None }
    }

    pub fn is_inside(&self, point: GeoPoint) -> bool {
        let inside = is_inside(point, self.boundary.as_deref());
        debug!(
            "PIP lookup at ({}, {}): inside={} (boundary loaded: {})",
            point.lat,
            point.lon,
            inside,
            self.boundary.is_some()
        );
        inside
    }

    pub fn classify_many(&self, points: &[GeoPoint]) -> Vec<bool> {
        classify_many(points, self.boundary.as_deref())
    }

    /// Get the boundary (for stats/debugging)
    pub fn boundary(&self) -> Option<&Arc<Boundary>> {
        self.boundary.as_ref()
    }
}
