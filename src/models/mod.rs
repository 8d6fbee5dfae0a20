//! Core data models for the vendor map.

pub mod place;
pub mod result;
pub mod vendor;

pub use place::{GeoBbox, GeoPoint};
pub use result::{Nearest, NearestResult, PairwiseResult, RadiusHit, RadiusResult};
pub use vendor::{normalize_key, CandidatePoint, VendorProps};
