//! Nearest, within-radius and pairwise queries over a candidate set.

use tracing::debug;

use super::{distance_km, CandidateSet};
use crate::models::{
    CandidatePoint, GeoPoint, Nearest, NearestResult, PairwiseResult, RadiusHit, RadiusResult,
};
use crate::pip::{circle_polygon, point_in_ring, DEFAULT_CIRCLE_STEPS};

/// Closest candidate to `reference`.
///
/// Scans in insertion order and only replaces the current best on a strictly
/// smaller distance, so the first of several equidistant candidates wins.
/// `None` for an empty set or a non-finite reference.
pub fn find_nearest(reference: GeoPoint, candidates: &CandidateSet) -> NearestResult {
    if !reference.is_finite() {
        debug!("Nearest query skipped: non-finite reference");
        return None;
    }

    let mut nearest: Option<&CandidatePoint> = None;
    let mut min_km = f64::INFINITY;

    for candidate in candidates {
        let d = distance_km(reference, candidate.point);
        if d < min_km {
            min_km = d;
            nearest = Some(candidate);
        }
    }

    nearest.map(|candidate| Nearest {
        candidate: candidate.clone(),
        distance_km: min_km,
    })
}

/// Candidates inside the circular buffer of `radius_km` around `reference`.
///
/// Membership is tested against the same 80-step circle polygon that is drawn
/// on the map, not against a raw distance threshold. A non-positive or
/// non-finite radius yields no hits.
pub fn find_within_radius(
    reference: GeoPoint,
    candidates: &CandidateSet,
    radius_km: f64,
) -> RadiusResult {
    let buffer = match circle_polygon(reference, radius_km, DEFAULT_CIRCLE_STEPS) {
        Ok(ring) => ring,
        Err(e) => {
            debug!("Radius query skipped: {}", e);
            return Vec::new();
        }
    };

    let hits: RadiusResult = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| point_in_ring(c.point, &buffer))
        .map(|(order, c)| RadiusHit {
            order,
            candidate: c.clone(),
            distance_km: distance_km(reference, c.point),
        })
        .collect();

    debug!(
        "Radius query at ({}, {}) r={}km: {} of {} candidates",
        reference.lat,
        reference.lon,
        radius_km,
        hits.len(),
        candidates.len()
    );
    hits
}

/// Great-circle distance between two chosen candidates.
///
/// Passing the same candidate twice is allowed and yields zero.
pub fn pairwise_distance(a: &CandidatePoint, b: &CandidatePoint) -> PairwiseResult {
    PairwiseResult::from_km(distance_km(a.point, b.point))
}
