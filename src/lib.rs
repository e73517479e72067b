//! Barangay - region classification for incident coordinates
//!
//! This library resolves raw report coordinates to named administrative
//! regions and provides shared types for the query and locate binaries.

pub mod boundaries;
pub mod config;
pub mod error;
pub mod models;
pub mod pip;

pub use error::{LocateError, Result};
pub use models::{ClassificationResult, ContextKey, Place, PlaceData, Point, Polygon, PolygonSet};
pub use pip::{classify, locate, nearby, RegionClassifier, RegionIndex};
