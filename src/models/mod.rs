//! Core data models for region classification.

pub mod place;
pub mod point;
pub mod polygon;
pub mod result;

pub use place::{Place, PlaceData, DEFAULT_KIND};
pub use point::Point;
pub use polygon::{validate_all, ContextKey, Polygon, PolygonSet};
pub use result::ClassificationResult;
