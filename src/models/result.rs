//! Plain-data query results handed back to map consumers.

use serde::Serialize;

use super::CandidatePoint;

/// Winning candidate of a nearest-point search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Nearest {
    pub candidate: CandidatePoint,
    pub distance_km: f64,
}

/// `None` when the candidate set is empty
pub type NearestResult = Option<Nearest>;

/// A candidate that fell inside the radius buffer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadiusHit {
    /// Insertion index within the candidate set, for stable display
    pub order: usize,
    pub candidate: CandidatePoint,
    pub distance_km: f64,
}

/// Hits in candidate insertion order (not sorted by distance)
pub type RadiusResult = Vec<RadiusHit>;

/// Straight-line (great-circle) distance between two chosen candidates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairwiseResult {
    pub distance_km: f64,
    pub distance_m: f64,
}

impl PairwiseResult {
    pub fn from_km(distance_km: f64) -> Self {
        Self {
            distance_km,
            distance_m: distance_km * 1000.0,
        }
    }
}
