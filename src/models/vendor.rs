//! Vendor (candidate point) documents queried by the spatial engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::GeoPoint;

/// Normalize a display name into a candidate key.
///
/// Keys are the trimmed, lowercase form of the name, so "Mochi Kaswari " and
/// "mochi kaswari" refer to the same vendor.
pub fn normalize_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Display metadata attached to a vendor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VendorProps {
    /// Display name (`nama` in the source datasets)
    pub name: String,

    /// Layer label the vendor was loaded from (e.g. "Makanan Khas")
    pub layer: String,

    /// Vendor type (`jenis`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Flagship product (`produk_utama`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_product: Option<String>,

    /// Photo link (`foto_url`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,

    /// Any remaining feature properties, passed through untouched
    #[serde(skip_serializing_if = "Map::is_empty", default)]
    pub extra: Map<String, Value>,
}

impl VendorProps {
    /// Build metadata from raw GeoJSON feature properties.
    ///
    /// Returns `None` when the feature carries no usable name.
    pub fn from_properties(layer: &str, properties: &Map<String, Value>) -> Option<Self> {
        let name = string_prop(properties, &["nama", "name"])?;
        if name.trim().is_empty() {
            return None;
        }

        let mut extra = Map::new();
        for (key, value) in properties {
            match key.as_str() {
                "nama" | "name" | "jenis" | "category" | "role" | "produk_utama"
                | "main_product" | "foto_url" | "photo_url" => {}
                _ => {
                    extra.insert(key.clone(), value.clone());
                }
            }
        }

        Some(Self {
            name,
            layer: layer.to_string(),
            category: string_prop(properties, &["jenis", "category"]),
            role: string_prop(properties, &["role"]),
            main_product: string_prop(properties, &["produk_utama", "main_product"]),
            photo_url: string_prop(properties, &["foto_url", "photo_url"]),
            extra,
        })
    }
}

/// First non-null property among `keys`, stringified if it is a number or bool
fn string_prop(properties: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match properties.get(*key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// One queryable vendor: a location plus its label and metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePoint {
    /// Unique, normalized identifier (see [`normalize_key`])
    pub key: String,
    pub point: GeoPoint,
    pub props: VendorProps,
}

impl CandidatePoint {
    pub fn new(point: GeoPoint, props: VendorProps) -> Self {
        Self {
            key: normalize_key(&props.name),
            point,
            props,
        }
    }

    /// Shorthand for tests and ad-hoc construction
    pub fn named(name: &str, lat: f64, lon: f64) -> Self {
        Self::new(
            GeoPoint::new(lat, lon),
            VendorProps {
                name: name.to_string(),
                ..Default::default()
            },
        )
    }
}
