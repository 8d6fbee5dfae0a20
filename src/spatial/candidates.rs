//! Insertion-ordered vendor collection and its GeoJSON loader.

use std::path::Path;

use geojson::{Feature, Value};
use hashbrown::HashMap;
use tracing::{debug, info};

use crate::dataset::{into_features, read_geojson, LoadError};
use crate::models::{CandidatePoint, GeoPoint, VendorProps};

/// Vendors keyed by normalized name, iterated in insertion order.
///
/// Iteration order is what breaks ties in nearest-point search, so it is kept
/// stable: re-inserting an existing key replaces the entry in place.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    entries: Vec<CandidatePoint>,
    by_key: HashMap<String, usize>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a candidate; returns the replaced value
    pub fn insert(&mut self, candidate: CandidatePoint) -> Option<CandidatePoint> {
        match self.by_key.get(&candidate.key) {
            Some(&idx) => Some(std::mem::replace(&mut self.entries[idx], candidate)),
            None => {
                self.by_key.insert(candidate.key.clone(), self.entries.len());
                self.entries.push(candidate);
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&CandidatePoint> {
        self.by_key.get(key).map(|&idx| &self.entries[idx])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CandidatePoint> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive substring search over keys, in insertion order
    pub fn search(&self, query: &str, limit: usize) -> Vec<&CandidatePoint> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|c| c.key.contains(&q))
            .take(limit)
            .collect()
    }

    /// Add every named Point feature of a layer; returns how many were added or replaced
    pub fn extend_from_features(&mut self, layer: &str, features: &[Feature]) -> usize {
        let mut added = 0;
        for feature in features {
            if let Some(candidate) = candidate_from_feature(layer, feature) {
                self.insert(candidate);
                added += 1;
            }
        }
        added
    }
}

impl FromIterator<CandidatePoint> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = CandidatePoint>>(iter: I) -> Self {
        let mut set = CandidateSet::new();
        for c in iter {
            set.insert(c);
        }
        set
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a CandidatePoint;
    type IntoIter = std::slice::Iter<'a, CandidatePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Build a candidate from a named Point feature
pub fn candidate_from_feature(layer: &str, feature: &Feature) -> Option<CandidatePoint> {
    let props = VendorProps::from_properties(layer, feature.properties.as_ref()?)?;

    let point = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Point(pos)) if pos.len() >= 2 => GeoPoint::from_lon_lat(pos[0], pos[1]),
        _ => {
            debug!("Skipping '{}' in layer '{}': not a point", props.name, layer);
            return None;
        }
    };

    if !point.is_finite() {
        debug!("Skipping '{}' in layer '{}': bad coordinates", props.name, layer);
        return None;
    }

    Some(CandidatePoint::new(point, props))
}

/// Load one layer file into `set`
pub fn load_layer<P: AsRef<Path>>(
    set: &mut CandidateSet,
    layer: &str,
    path: P,
) -> Result<usize, LoadError> {
    let path = path.as_ref();
    let features = into_features(read_geojson(path)?);
    let added = set.extend_from_features(layer, &features);
    info!(
        "Layer '{}': {} of {} features are vendors ({})",
        layer,
        added,
        features.len(),
        path.display()
    );
    Ok(added)
}
