//! GeoJSON dataset reading shared by the boundary and vendor loaders.

use std::fs;
use std::path::{Path, PathBuf};

use geojson::{Feature, GeoJson};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),
    #[error("{path} has no usable {expected} geometry")]
    UnsupportedGeometry {
        path: PathBuf,
        expected: &'static str,
    },
    #[error("failed to parse config: {0}")]
    Config(#[from] toml::de::Error),
}

/// Read and parse a GeoJSON file
pub fn read_geojson<P: AsRef<Path>>(path: P) -> Result<GeoJson, LoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Read {} bytes from {}", text.len(), path.display());
    parse_geojson(&text)
}

pub fn parse_geojson(text: &str) -> Result<GeoJson, LoadError> {
    Ok(text.parse::<GeoJson>()?)
}

/// Flatten any GeoJSON document into a list of features.
///
/// A bare geometry becomes a single feature without properties.
pub fn into_features(geojson: GeoJson) -> Vec<Feature> {
    match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(g) => vec![Feature::from(g)],
    }
}
