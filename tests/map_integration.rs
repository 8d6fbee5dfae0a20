//! Integration tests for the vendor map engine.
//!
//! These tests verify the complete data flows:
//! - Config → GeoJSON files → MapContext
//! - Boundary containment across multiple rings
//! - Nearest / radius / pairwise queries over a loaded vendor set
//! - Submission feeding later queries
//!
//! Run with: `cargo test --test map_integration`

use std::fs;
use std::path::Path;

use kedai::config::Config;
use kedai::pip::{is_inside, Boundary, BoundaryRing};
use kedai::spatial::{distance_km, find_nearest, find_within_radius, pairwise_distance, CandidateSet};
use kedai::{CandidatePoint, GeoPoint, MapContext, Submission, SubmissionError};

// ============================================================================
// Test Helpers
// ============================================================================

fn ring(points: &[(f64, f64)]) -> BoundaryRing {
    let vertices: Vec<GeoPoint> = points.iter().map(|&(lat, lon)| GeoPoint::new(lat, lon)).collect();
    BoundaryRing::new(&vertices).unwrap()
}

fn abc() -> CandidateSet {
    vec![
        CandidatePoint::named("A", 0.0, 0.0),
        CandidatePoint::named("B", 0.0, 1.0),
        CandidatePoint::named("C", 10.0, 10.0),
    ]
    .into_iter()
    .collect()
}

const BOUNDARY: &str = r#"{
    "type": "FeatureCollection",
    "features": [{
        "type": "Feature",
        "properties": {"name": "Kota Sukabumi"},
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[106.90, -6.95], [106.95, -6.95], [106.95, -6.90], [106.90, -6.90], [106.90, -6.95]]]
        }
    }]
}"#;

const MAKANAN: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {"type":"Feature","properties":{"nama":"Mochi Kaswari","jenis":"Makanan","produk_utama":"Mochi"},
         "geometry":{"type":"Point","coordinates":[106.93,-6.92]}},
        {"type":"Feature","properties":{"nama":"Bolu Pandan"},
         "geometry":{"type":"Point","coordinates":[106.94,-6.93]}}
    ]
}"#;

const MINUMAN: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {"type":"Feature","properties":{"nama":"Kopi Luar Kota"},
         "geometry":{"type":"Point","coordinates":[107.50,-7.50]}}
    ]
}"#;

fn write_dataset(dir: &Path) -> std::path::PathBuf {
    fs::create_dir_all(dir.join("data")).unwrap();
    fs::write(dir.join("data/kota.geojson"), BOUNDARY).unwrap();
    fs::write(dir.join("data/makanan.geojson"), MAKANAN).unwrap();
    fs::write(dir.join("data/minuman.geojson"), MINUMAN).unwrap();

    let config = dir.join("kedai.toml");
    fs::write(
        &config,
        r#"
        [boundary]
        name = "Kota Sukabumi"
        path = "data/kota.geojson"

        [[layers]]
        name = "Makanan Khas"
        path = "data/makanan.geojson"

        [[layers]]
        name = "Minuman"
        path = "data/minuman.geojson"

        [[layers]]
        name = "Hilang"
        path = "data/missing.geojson"
        "#,
    )
    .unwrap();
    config
}

// ============================================================================
// Core scenarios
// ============================================================================

#[test]
fn test_square_boundary_containment() {
    let boundary = Boundary::new(
        "square",
        vec![ring(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)])],
    );
    assert!(is_inside(GeoPoint::new(0.5, 0.5), Some(&boundary)));
    assert!(!is_inside(GeoPoint::new(2.0, 2.0), Some(&boundary)));
}

#[test]
fn test_nearest_matches_haversine() {
    let reference = GeoPoint::new(0.0, 0.1);
    let nearest = find_nearest(reference, &abc()).unwrap();
    assert_eq!(nearest.candidate.props.name, "A");
    let expected = distance_km(reference, GeoPoint::new(0.0, 0.0));
    assert!((nearest.distance_km - expected).abs() < 1e-9);
    assert!((nearest.distance_km - 11.1).abs() < 0.1);
}

#[test]
fn test_radius_membership_follows_distance() {
    // B is one degree (~111 km) from the origin, so it joins only once the
    // radius passes that distance; C (~1570 km) needs a far larger one.
    let set = abc();
    let origin = GeoPoint::new(0.0, 0.0);
    let names = |r: f64| -> Vec<String> {
        find_within_radius(origin, &set, r)
            .into_iter()
            .map(|h| h.candidate.props.name)
            .collect()
    };
    assert_eq!(names(20.0), vec!["A"]);
    assert_eq!(names(120.0), vec!["A", "B"]);
    assert_eq!(names(2000.0), vec!["A", "B", "C"]);
}

#[test]
fn test_pairwise_one_degree() {
    let set = abc();
    let r = pairwise_distance(set.get("a").unwrap(), set.get("b").unwrap());
    assert!((r.distance_km - 111.2).abs() < 0.05);
}

#[test]
fn test_empty_candidates() {
    let empty = CandidateSet::new();
    assert!(find_nearest(GeoPoint::new(0.0, 0.0), &empty).is_none());
    assert!(find_within_radius(GeoPoint::new(0.0, 0.0), &empty, 10.0).is_empty());
}

#[test]
fn test_disjoint_rings_or_semantics() {
    let boundary = Boundary::new(
        "two islands",
        vec![
            ring(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]),
            ring(&[(5.0, 5.0), (5.0, 6.0), (6.0, 6.0), (6.0, 5.0)]),
        ],
    );
    assert!(is_inside(GeoPoint::new(5.5, 5.5), Some(&boundary)));
    assert!(!is_inside(GeoPoint::new(3.0, 3.0), Some(&boundary)));
}

// ============================================================================
// Loaded map context
// ============================================================================

#[test]
fn test_context_from_config_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from_file(write_dataset(dir.path())).unwrap();
    let ctx = MapContext::from_config(&config);

    // The missing layer is skipped, the others load
    assert_eq!(ctx.candidates().len(), 3);
    assert_eq!(ctx.boundary().unwrap().name(), "Kota Sukabumi");

    let mochi = ctx.candidates().get("mochi kaswari").unwrap();
    assert_eq!(mochi.point, GeoPoint::new(-6.92, 106.93));
    assert_eq!(mochi.props.main_product.as_deref(), Some("Mochi"));

    assert!(ctx.is_inside(mochi.point));
    assert!(!ctx.is_inside(ctx.candidates().get("kopi luar kota").unwrap().point));

    let hits = ctx.within_radius(GeoPoint::new(-6.92, 106.93), 2.0);
    let keys: Vec<&str> = hits.iter().map(|h| h.candidate.key.as_str()).collect();
    assert_eq!(keys, vec!["mochi kaswari", "bolu pandan"]);
}

#[test]
fn test_submission_visible_to_queries() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from_file(write_dataset(dir.path())).unwrap();
    let mut ctx = MapContext::from_config(&config);

    let outside = ctx.submit(Submission {
        name: "Jauh".to_string(),
        lat: -7.5,
        lon: 107.5,
        description: None,
        photo_url: None,
    });
    assert!(matches!(outside, Err(SubmissionError::OutsideBoundary { .. })));

    ctx.submit(Submission {
        name: "Dodol Garut".to_string(),
        lat: -6.905,
        lon: 106.905,
        description: Some("Oleh-oleh".to_string()),
        photo_url: None,
    })
    .unwrap();

    let nearest = ctx.nearest(GeoPoint::new(-6.905, 106.905)).unwrap();
    assert_eq!(nearest.candidate.key, "dodol garut");
    assert_eq!(nearest.candidate.props.layer, "Kiriman Pengguna");
    assert_eq!(ctx.search("dodol", 8).len(), 1);
}
