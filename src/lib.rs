//! Intrusion screening for packet captures exported as CSV.
//!
//! A capture's `Protocol`, `Time` and `Length` columns are encoded and
//! scaled with pre-fitted artifacts into a three-column feature table, which
//! every configured classifier labels in one batch. See [`detector::Detector`]
//! for the pipeline entry point.

pub mod cli;
pub mod config;
pub mod detector;
pub mod error;
pub mod output;

pub use detector::{Artifacts, Detector};
pub use error::{ArtifactError, DataError, DetectionError, InferenceError};
