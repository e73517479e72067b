//! Point-in-Polygon (PIP) region classification.
//!
//! Ray-casting containment and boundary-distance proximity over named
//! polygons, with an optional R-tree bounding-box pre-filter.

pub mod geometry;
mod index;
mod service;

pub use geometry::{distance_to_polygon_meters, haversine_meters};
pub use index::RegionIndex;
pub use service::{classify, locate, nearby, RegionClassifier, DEFAULT_BANDS};
