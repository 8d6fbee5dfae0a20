//! Map context: the loaded boundary and vendor set that queries run against.
//!
//! Replaces a process-wide layer registry with an explicit value that callers
//! own and pass around. The boundary is read-only once loaded; vendors are only
//! ever added.

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::Config;
use crate::models::{
    normalize_key, CandidatePoint, GeoPoint, NearestResult, PairwiseResult, RadiusResult,
    VendorProps,
};
use crate::pip::{load_boundary, Boundary, PipService};
use crate::spatial::{
    find_nearest, find_within_radius, load_layer, pairwise_distance, CandidateSet,
};

/// A crowd-sourced vendor proposed by a map user
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmissionError {
    #[error("vendor name must not be empty")]
    EmptyName,
    #[error("point ({lat}, {lon}) is outside the city boundary")]
    OutsideBoundary { lat: f64, lon: f64 },
    #[error("a vendor named '{0}' already exists")]
    DuplicateName(String),
}

pub struct MapContext {
    pip: PipService,
    candidates: CandidateSet,
    submission_layer: String,
}

impl MapContext {
    pub fn new(boundary: Option<Boundary>, candidates: CandidateSet) -> Self {
        Self {
            pip: boundary.map(PipService::new).unwrap_or_else(PipService::missing),
            candidates,
            submission_layer: "Kiriman Pengguna".to_string(),
        }
    }

    pub fn with_submission_layer(mut self, layer: impl Into<String>) -> Self {
        self.submission_layer = layer.into();
        self
    }

    /// Load every configured dataset.
    ///
    /// A boundary or layer that fails to load is logged and left out; the
    /// context is still usable, with containment failing closed when the
    /// boundary is missing.
    pub fn from_config(config: &Config) -> Self {
        let boundary = config.boundary.as_ref().and_then(|b| {
            load_boundary(&b.name, &b.path)
                .map_err(|e| warn!("Could not load boundary '{}': {}", b.name, e))
                .ok()
        });

        let mut candidates = CandidateSet::new();
        for layer in &config.layers {
            if let Err(e) = load_layer(&mut candidates, &layer.name, &layer.path) {
                warn!("Could not load layer '{}': {}", layer.name, e);
            }
        }

        info!(
            "Map context ready: boundary={}, {} vendors",
            boundary.as_ref().map(|b| b.name()).unwrap_or("<missing>"),
            candidates.len()
        );

        Self::new(boundary, candidates).with_submission_layer(&config.global.submission_layer)
    }

    pub fn boundary(&self) -> Option<&Boundary> {
        self.pip.boundary().map(|b| b.as_ref())
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    pub fn pip(&self) -> &PipService {
        &self.pip
    }

    pub fn is_inside(&self, point: GeoPoint) -> bool {
        self.pip.is_inside(point)
    }

    pub fn nearest(&self, reference: GeoPoint) -> NearestResult {
        find_nearest(reference, &self.candidates)
    }

    pub fn within_radius(&self, reference: GeoPoint, radius_km: f64) -> RadiusResult {
        find_within_radius(reference, &self.candidates, radius_km)
    }

    /// Distance between two vendors by key; `None` if either key is unknown
    pub fn distance_between(&self, a: &str, b: &str) -> Option<PairwiseResult> {
        let a = self.candidates.get(&normalize_key(a))?;
        let b = self.candidates.get(&normalize_key(b))?;
        Some(pairwise_distance(a, b))
    }

    pub fn search(&self, query: &str, limit: usize) -> Vec<&CandidatePoint> {
        self.candidates.search(query, limit)
    }

    /// Accept a user-submitted vendor if it lies inside the boundary
    pub fn submit(&mut self, submission: Submission) -> Result<CandidatePoint, SubmissionError> {
        let name = submission.name.trim();
        if name.is_empty() {
            return Err(SubmissionError::EmptyName);
        }

        let point = GeoPoint::new(submission.lat, submission.lon);
        if !self.is_inside(point) {
            return Err(SubmissionError::OutsideBoundary {
                lat: point.lat,
                lon: point.lon,
            });
        }

        if self.candidates.contains_key(&normalize_key(name)) {
            return Err(SubmissionError::DuplicateName(name.to_string()));
        }

        let mut props = VendorProps {
            name: name.to_string(),
            layer: self.submission_layer.clone(),
            photo_url: submission.photo_url,
            ..Default::default()
        };
        if let Some(desc) = submission.description.filter(|d| !d.trim().is_empty()) {
            props
                .extra
                .insert("description".to_string(), Value::String(desc.trim().to_string()));
        }

        let candidate = CandidatePoint::new(point, props);
        self.candidates.insert(candidate.clone());
        info!(
            "Accepted submission '{}' at ({}, {})",
            candidate.props.name, point.lat, point.lon
        );
        Ok(candidate)
    }
}
