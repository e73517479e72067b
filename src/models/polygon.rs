//! Named region polygons and the context-keyed sets they are grouped into.

use std::borrow::Cow;

use geo::{BoundingRect, LineString, Rect};
use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use super::Point;
use crate::error::{LocateError, Result};

/// A named region with a closed ring of vertices.
///
/// The ring is implicitly closed: the last vertex connects back to the first.
/// A trailing copy of the first vertex is tolerated and ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    /// Display label (e.g. a barangay name)
    pub name: String,

    /// Region kind reported as `polType` (e.g. "barangay")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    pub vertices: Vec<Point>,
}

impl Polygon {
    pub fn new(name: impl Into<String>, vertices: Vec<Point>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            vertices,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Vertices of the ring without a duplicated closing vertex
    pub fn ring(&self) -> &[Point] {
        match (self.vertices.first(), self.vertices.last()) {
            (Some(first), Some(last)) if self.vertices.len() > 1 && first == last => {
                &self.vertices[..self.vertices.len() - 1]
            }
            _ => &self.vertices,
        }
    }

    /// Check that the polygon can be used for classification.
    ///
    /// `index` is the polygon's position in the caller's sequence and is only
    /// used for error reporting.
    pub fn validate(&self, index: usize) -> Result<()> {
        let invalid = |reason: String| LocateError::InvalidPolygon {
            index,
            name: self.name.clone(),
            reason,
        };

        let ring = self.ring();
        if ring.len() < 3 {
            return Err(invalid(format!(
                "ring has {} vertices, at least 3 required",
                ring.len()
            )));
        }

        for (i, vertex) in self.vertices.iter().enumerate() {
            if let Err(LocateError::InvalidCoordinates { reason }) = vertex.validate() {
                return Err(invalid(format!("vertex {}: {}", i, reason)));
            }
        }

        let distinct = distinct_positions(ring);
        if distinct < 3 {
            return Err(invalid(format!(
                "ring has {} distinct positions, at least 3 required",
                distinct
            )));
        }

        Ok(())
    }

    /// Bounding box in planar (x = longitude, y = latitude) coordinates
    pub fn bbox(&self) -> Option<Rect<f64>> {
        let line: LineString<f64> = self.ring().iter().map(Point::to_coord).collect();
        line.bounding_rect()
    }
}

/// Number of distinct vertex positions; vertices must already be finite
fn distinct_positions(ring: &[Point]) -> usize {
    // + 0.0 folds -0.0 into 0.0
    ring.iter()
        .map(|v| ((v.latitude + 0.0).to_bits(), (v.longitude + 0.0).to_bits()))
        .collect::<HashSet<_>>()
        .len()
}

/// Validate every polygon of a sequence, failing on the first malformed one
pub fn validate_all(polygons: &[Polygon]) -> Result<()> {
    polygons
        .iter()
        .enumerate()
        .try_for_each(|(i, polygon)| polygon.validate(i))
}

/// Classification context a polygon sequence applies to.
///
/// Names are compared trimmed and case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextKey {
    pub province: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub municipality: Option<String>,
}

impl ContextKey {
    pub fn new(province: &str, municipality: Option<&str>) -> Self {
        Self {
            province: normalize(province),
            municipality: municipality
                .map(normalize)
                .filter(|m| !m.is_empty()),
        }
    }

    pub fn province(province: &str) -> Self {
        Self::new(province, None)
    }

    fn province_only(&self) -> Self {
        Self {
            province: self.province.clone(),
            municipality: None,
        }
    }
}

impl std::fmt::Display for ContextKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.municipality {
            Some(m) => write!(f, "{}/{}", self.province, m),
            None => write!(f, "{}", self.province),
        }
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Polygon sequences grouped by [`ContextKey`], in load order.
#[derive(Debug, Clone, Default)]
pub struct PolygonSet {
    groups: Vec<(ContextKey, Vec<Polygon>)>,
    positions: HashMap<ContextKey, usize>,
}

impl PolygonSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a polygon to the sequence for `key`
    pub fn insert(&mut self, key: ContextKey, polygon: Polygon) {
        match self.positions.get(&key) {
            Some(&pos) => self.groups[pos].1.push(polygon),
            None => {
                self.positions.insert(key.clone(), self.groups.len());
                self.groups.push((key, vec![polygon]));
            }
        }
    }

    /// Exact lookup
    pub fn get(&self, key: &ContextKey) -> Option<&[Polygon]> {
        self.positions
            .get(key)
            .map(|&pos| self.groups[pos].1.as_slice())
    }

    /// Resolve the polygons that apply to a query context.
    ///
    /// Tries the exact key, then the province-only key, then every
    /// municipality set of the province concatenated in load order.
    pub fn resolve(&self, key: &ContextKey) -> Result<Cow<'_, [Polygon]>> {
        if let Some(polygons) = self.get(key) {
            return Ok(Cow::Borrowed(polygons));
        }

        let province_key = key.province_only();
        if let Some(polygons) = self.get(&province_key) {
            return Ok(Cow::Borrowed(polygons));
        }

        let merged: Vec<Polygon> = self
            .groups
            .iter()
            .filter(|(k, _)| k.province == key.province)
            .flat_map(|(_, polygons)| polygons.iter().cloned())
            .collect();
        if !merged.is_empty() {
            return Ok(Cow::Owned(merged));
        }

        Err(LocateError::UnknownContext {
            province: key.province.clone(),
            municipality: key.municipality.clone(),
        })
    }

    /// Every polygon, in load order
    pub fn all(&self) -> Vec<Polygon> {
        self.groups
            .iter()
            .flat_map(|(_, polygons)| polygons.iter().cloned())
            .collect()
    }

    /// Iterate over context groups in load order
    pub fn groups(&self) -> impl Iterator<Item = (&ContextKey, &[Polygon])> {
        self.groups.iter().map(|(k, p)| (k, p.as_slice()))
    }

    /// Distinct provinces in load order
    pub fn provinces(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for (key, _) in &self.groups {
            if !seen.contains(&key.province.as_str()) {
                seen.push(&key.province);
            }
        }
        seen
    }

    /// Number of context groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of polygons across all groups
    pub fn polygon_count(&self) -> usize {
        self.groups.iter().map(|(_, p)| p.len()).sum()
    }
}
