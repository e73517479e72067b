//! Bounding-box pre-filter over a polygon sequence.

use rstar::{RTree, RTreeObject, AABB};
use tracing::debug;

use super::geometry::degree_extent;
use crate::error::Result;
use crate::models::{validate_all, Point, Polygon};

/// R-tree entry pointing back at a polygon's position in the sequence
#[derive(Debug, Clone)]
struct IndexedPolygon {
    position: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedPolygon {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Validated polygon sequence with an R-tree over polygon bounding boxes.
///
/// The index only narrows the candidates; classification results are
/// identical to a full scan and always come back in sequence order.
#[derive(Debug)]
pub struct RegionIndex {
    polygons: Vec<Polygon>,
    tree: RTree<IndexedPolygon>,
}

impl RegionIndex {
    /// Validate the polygons and build the index
    pub fn build(polygons: Vec<Polygon>) -> Result<Self> {
        validate_all(&polygons)?;

        let entries: Vec<IndexedPolygon> = polygons
            .iter()
            .enumerate()
            .filter_map(|(position, polygon)| {
                let rect = polygon.bbox()?;
                Some(IndexedPolygon {
                    position,
                    envelope: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                })
            })
            .collect();

        let tree = RTree::bulk_load(entries);
        debug!("Built region index with {} polygons", tree.size());

        Ok(Self { polygons, tree })
    }

    pub fn empty() -> Self {
        Self {
            polygons: Vec::new(),
            tree: RTree::new(),
        }
    }

    /// Positions of polygons whose bounding box contains the point, ascending
    pub fn candidates_containing(&self, point: &Point) -> Vec<usize> {
        let query = AABB::from_point([point.longitude, point.latitude]);
        self.sorted_positions(&query)
    }

    /// Positions of polygons whose bounding box comes within `radius_meters`
    /// of the point, ascending
    pub fn candidates_within(&self, point: &Point, radius_meters: f64) -> Vec<usize> {
        let (dlat, dlon) = degree_extent(point.latitude, radius_meters);
        let query = AABB::from_corners(
            [point.longitude - dlon, point.latitude - dlat],
            [point.longitude + dlon, point.latitude + dlat],
        );
        self.sorted_positions(&query)
    }

    fn sorted_positions(&self, query: &AABB<[f64; 2]>) -> Vec<usize> {
        let mut positions: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(query)
            .map(|entry| entry.position)
            .collect();
        positions.sort_unstable();
        positions
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
}
