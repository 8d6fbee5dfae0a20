//! Point-in-Polygon (PIP) boundary containment.
//!
//! Loads a reference boundary from GeoJSON and answers containment queries
//! using an R-tree over ring envelopes followed by an exact ring test.

mod boundary;
pub mod geometry;
mod index;
mod service;

pub use boundary::{extract_boundary_rings, load_boundary, Boundary};
pub use geometry::{circle_polygon, point_in_ring, BoundaryRing, RingError, DEFAULT_CIRCLE_STEPS};
pub use index::RingSpatialIndex;
pub use service::{classify_many, is_inside, PipService};
