//! Reference boundary (e.g. city limits) and its extraction from GeoJSON.

use std::path::Path;
use std::sync::Arc;

use geo::Coord;
use geojson::{Feature, Geometry, Value};
use tracing::{debug, info, warn};

use super::geometry::{BoundaryRing, RingError};
use super::index::RingSpatialIndex;
use crate::dataset::{into_features, read_geojson, LoadError};
use crate::models::GeoBbox;

/// A named set of rings defining one reference region.
///
/// Rings are independent: a point inside any of them is inside the boundary.
/// Inner rings (holes) of the source polygons are kept as ordinary rings and
/// are not subtracted, so a point in a hole still tests as inside.
#[derive(Clone)]
pub struct Boundary {
    name: String,
    rings: Vec<Arc<BoundaryRing>>,
    index: RingSpatialIndex,
}

impl Boundary {
    pub fn new(name: impl Into<String>, rings: Vec<BoundaryRing>) -> Self {
        let rings: Vec<Arc<BoundaryRing>> = rings.into_iter().map(Arc::new).collect();
        let index = RingSpatialIndex::build(&rings);
        Self {
            name: name.into(),
            rings,
            index,
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> &RingSpatialIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.rings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    /// Envelope covering every ring
    pub fn bbox(&self) -> Option<GeoBbox> {
        self.rings
            .iter()
            .filter_map(|r| r.bbox())
            .reduce(GeoBbox::union)
    }
}

impl std::fmt::Debug for Boundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Boundary")
            .field("name", &self.name)
            .field("rings", &self.rings.len())
            .finish()
    }
}

/// Load a boundary from a GeoJSON file
pub fn load_boundary<P: AsRef<Path>>(name: &str, path: P) -> Result<Boundary, LoadError> {
    let path = path.as_ref();
    info!("Loading boundary '{}' from {}", name, path.display());

    let features = into_features(read_geojson(path)?);
    let rings = extract_boundary_rings(&features);
    if rings.is_empty() {
        return Err(LoadError::UnsupportedGeometry {
            path: path.to_path_buf(),
            expected: "polygon",
        });
    }

    info!("Boundary '{}' has {} rings", name, rings.len());
    Ok(Boundary::new(name, rings))
}

/// Collect every polygon ring from Polygon / MultiPolygon features.
///
/// Coordinates are transposed from GeoJSON `[lon, lat]`. Rings that cannot
/// form a polygon are skipped.
pub fn extract_boundary_rings(features: &[Feature]) -> Vec<BoundaryRing> {
    let mut rings = Vec::new();

    for feature in features {
        match &feature.geometry {
            Some(geometry) => collect_rings(geometry, &mut rings),
            None => debug!("Skipping feature without geometry"),
        }
    }

    rings
}

fn collect_rings(geometry: &Geometry, out: &mut Vec<BoundaryRing>) {
    match &geometry.value {
        Value::Polygon(polygon) => push_polygon(polygon, out),
        Value::MultiPolygon(polygons) => {
            for polygon in polygons {
                push_polygon(polygon, out);
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_rings(g, out);
            }
        }
        _ => debug!("Skipping non-polygon geometry in boundary source"),
    }
}

fn push_polygon(polygon: &[Vec<Vec<f64>>], out: &mut Vec<BoundaryRing>) {
    for positions in polygon {
        match ring_from_positions(positions) {
            Ok(ring) => out.push(ring),
            Err(e) => warn!("Skipping invalid boundary ring: {}", e),
        }
    }
}

fn ring_from_positions(positions: &[Vec<f64>]) -> Result<BoundaryRing, RingError> {
    let coords: Vec<Coord<f64>> = positions
        .iter()
        .filter(|pos| pos.len() >= 2)
        .map(|pos| Coord {
            x: pos[0],
            y: pos[1],
        })
        .collect();
    BoundaryRing::from_coords(coords)
}
