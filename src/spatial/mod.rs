//! Spatial query engine: distances and rankings over the vendor set.
//!
//! All operations are synchronous and read-only over their inputs; empty
//! inputs produce explicit empty results rather than errors.

mod candidates;
mod distance;
mod engine;

pub use candidates::{candidate_from_feature, load_layer, CandidateSet};
pub use distance::distance_km;
pub use engine::{find_nearest, find_within_radius, pairwise_distance};
