//! Kedai - A Rust-based vendor map engine for a single city
//!
//! This library provides boundary containment, spatial queries over vendor
//! layers and live position tracking for the query and validate binaries.

pub mod config;
pub mod context;
pub mod dataset;
pub mod models;
pub mod pip;
pub mod spatial;
pub mod tracking;

pub use context::{MapContext, Submission, SubmissionError};
pub use models::{CandidatePoint, GeoPoint};
