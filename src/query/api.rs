//! Request parameters, response bodies and error mapping for the HTTP API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kedai::context::SubmissionError;
use kedai::models::{normalize_key, CandidatePoint, Nearest, RadiusHit};
use kedai::pip::Boundary;
use kedai::tracking::{PositionFix, TrackSnapshot, TrackingError};
use kedai::GeoPoint;

/// Default number of name search suggestions
pub const DEFAULT_SEARCH_SIZE: usize = 8;
const MAX_SEARCH_SIZE: usize = 40;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unprocessable(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(msg) = &self {
            tracing::error!("Request failed: {}", msg);
        }
        (self.status(), self.to_string()).into_response()
    }
}

impl From<SubmissionError> for ApiError {
    fn from(e: SubmissionError) -> Self {
        match e {
            SubmissionError::DuplicateName(_) => ApiError::Conflict(e.to_string()),
            SubmissionError::EmptyName | SubmissionError::OutsideBoundary { .. } => {
                ApiError::Unprocessable(e.to_string())
            }
        }
    }
}

impl From<TrackingError> for ApiError {
    fn from(e: TrackingError) -> Self {
        match e {
            TrackingError::AlreadyActive | TrackingError::NotActive => {
                ApiError::Conflict(e.to_string())
            }
            TrackingError::Closed => ApiError::Internal(e.to_string()),
        }
    }
}

/// Validate a latitude/longitude pair from a request
pub fn parse_point(lat: f64, lon: f64) -> Result<GeoPoint, ApiError> {
    if !lat.is_finite() || !lon.is_finite() {
        return Err(ApiError::BadRequest(
            "lat and lon must be finite numbers".to_string(),
        ));
    }
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(ApiError::BadRequest(format!(
            "coordinates out of range: ({}, {})",
            lat, lon
        )));
    }
    Ok(GeoPoint::new(lat, lon))
}

/// Smallest radius handed to the engine; tinier buffers collapse to a point
pub const MIN_RADIUS_M: f64 = 1.0;

/// Convert a radius given in meters to kilometers; must be positive.
///
/// Radii below [`MIN_RADIUS_M`] are raised to it.
pub fn radius_km(radius_m: f64) -> Result<f64, ApiError> {
    if !radius_m.is_finite() || radius_m <= 0.0 {
        return Err(ApiError::BadRequest(format!(
            "radius_m must be greater than 0, got {}",
            radius_m
        )));
    }
    Ok(radius_m.max(MIN_RADIUS_M) / 1000.0)
}

/// Two different vendor keys, normalized
pub fn distinct_keys(a: &str, b: &str) -> Result<(String, String), ApiError> {
    let (a, b) = (normalize_key(a.trim()), normalize_key(b.trim()));
    if a.is_empty() || b.is_empty() {
        return Err(ApiError::BadRequest("both a and b are required".to_string()));
    }
    if a == b {
        return Err(ApiError::BadRequest(
            "choose two different vendors".to_string(),
        ));
    }
    Ok((a, b))
}

pub fn search_size(size: Option<usize>) -> usize {
    size.unwrap_or(DEFAULT_SEARCH_SIZE).min(MAX_SEARCH_SIZE)
}

#[derive(Deserialize)]
pub struct PointQueryParams {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Deserialize)]
pub struct RadiusQueryParams {
    pub lat: f64,
    pub lon: f64,
    /// Search radius in meters
    pub radius_m: f64,
}

#[derive(Deserialize)]
pub struct DistanceQueryParams {
    pub a: String,
    pub b: String,
}

#[derive(Deserialize)]
pub struct SearchQueryParams {
    /// Search text
    pub text: String,
    /// Number of results
    pub size: Option<usize>,
}

/// A live position report
#[derive(Debug, Deserialize)]
pub struct FixRequest {
    pub lat: f64,
    pub lon: f64,
    /// Time the position was taken; server time when absent
    pub timestamp: Option<DateTime<Utc>>,
}

impl FixRequest {
    pub fn into_fix(self, received_at: DateTime<Utc>) -> Result<PositionFix, ApiError> {
        Ok(PositionFix {
            point: parse_point(self.lat, self.lon)?,
            timestamp: self.timestamp.unwrap_or(received_at),
        })
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub boundary: Option<String>,
    pub vendors: usize,
}

impl HealthResponse {
    /// Degraded unless a boundary with at least one ring is loaded
    pub fn new(boundary: Option<&Boundary>, vendors: usize) -> Self {
        let usable = boundary.filter(|b| !b.is_empty());
        Self {
            status: if usable.is_some() { "ok" } else { "degraded" },
            boundary: usable.map(|b| b.name().to_string()),
            vendors,
        }
    }
}

#[derive(Serialize)]
pub struct InsideResponse {
    pub inside: bool,
}

#[derive(Serialize)]
pub struct NearestResponse {
    pub nearest: Option<Nearest>,
}

#[derive(Serialize)]
pub struct RadiusResponse {
    pub radius_m: f64,
    pub count: usize,
    pub hits: Vec<RadiusHit>,
}

#[derive(Serialize)]
pub struct DistanceResponse {
    pub a: String,
    pub b: String,
    pub distance_km: f64,
    pub distance_m: f64,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub features: Vec<CandidatePoint>,
}

#[derive(Serialize)]
pub struct FixResponse {
    pub speed_mps: f64,
    /// Whether the reported position lies inside the city boundary
    pub inside: bool,
    pub tracking: TrackSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use kedai::pip::BoundaryRing;

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point(-6.92, 106.93).unwrap(), GeoPoint::new(-6.92, 106.93));
        assert!(parse_point(f64::NAN, 0.0).is_err());
        assert!(parse_point(91.0, 0.0).is_err());
        assert!(parse_point(0.0, -180.5).is_err());
    }

    #[test]
    fn test_radius_must_be_positive() {
        assert_eq!(radius_km(1500.0).unwrap(), 1.5);
        assert_eq!(radius_km(1e-9).unwrap(), MIN_RADIUS_M / 1000.0);
        for bad in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            let err = radius_km(bad).unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_distinct_keys() {
        assert_eq!(
            distinct_keys(" Mochi Kaswari", "Bolu Pandan").unwrap(),
            ("mochi kaswari".to_string(), "bolu pandan".to_string())
        );
        assert!(distinct_keys("Mochi", "MOCHI").is_err());
        assert!(distinct_keys("", "Mochi").is_err());
    }

    #[test]
    fn test_search_size() {
        assert_eq!(search_size(None), DEFAULT_SEARCH_SIZE);
        assert_eq!(search_size(Some(3)), 3);
        assert_eq!(search_size(Some(1000)), MAX_SEARCH_SIZE);
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            ApiError::from(SubmissionError::EmptyName).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(SubmissionError::OutsideBoundary { lat: 0.0, lon: 0.0 }).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(SubmissionError::DuplicateName("x".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(TrackingError::NotActive).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(TrackingError::Closed).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_health_status() {
        let ring = BoundaryRing::new(&[
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(1.0, 1.0),
        ])
        .unwrap();
        let city = Boundary::new("Kota", vec![ring]);

        let health = HealthResponse::new(Some(&city), 4);
        assert_eq!(health.status, "ok");
        assert_eq!(health.boundary.as_deref(), Some("Kota"));
        assert_eq!(health.vendors, 4);

        let empty = Boundary::empty("Kota");
        let health = HealthResponse::new(Some(&empty), 4);
        assert_eq!(health.status, "degraded");
        assert!(health.boundary.is_none());

        assert_eq!(HealthResponse::new(None, 0).status, "degraded");
    }

    #[test]
    fn test_fix_request_timestamp() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let reported = Utc.timestamp_opt(1_699_999_990, 0).unwrap();

        let fix = FixRequest {
            lat: -6.92,
            lon: 106.93,
            timestamp: None,
        }
        .into_fix(now)
        .unwrap();
        assert_eq!(fix.timestamp, now);

        let fix = FixRequest {
            lat: -6.92,
            lon: 106.93,
            timestamp: Some(reported),
        }
        .into_fix(now)
        .unwrap();
        assert_eq!(fix.timestamp, reported);

        assert!(FixRequest {
            lat: 100.0,
            lon: 0.0,
            timestamp: None
        }
        .into_fix(now)
        .is_err());
    }
}
