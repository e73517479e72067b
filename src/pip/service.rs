//! Region classification: containment plus radius-band proximity.

use std::collections::BTreeMap;

use tracing::debug;

use super::geometry::{contains, distance_to_polygon_meters};
use super::RegionIndex;
use crate::error::{LocateError, Result};
use crate::models::{validate_all, ClassificationResult, Place, PlaceData, Point, Polygon};

/// Radius bands reported when none are configured
pub const DEFAULT_BANDS: [u32; 2] = [200, 500];

/// Names of all polygons containing the point, in input order.
///
/// Fails on an invalid point or on the first malformed polygon; malformed
/// polygons are never skipped.
pub fn classify(point: &Point, polygons: &[Polygon]) -> Result<ClassificationResult> {
    locate(point, polygons, &[])
}

/// Names of polygons whose boundary lies within `radius_meters` of the point
/// and which do not contain it, in input order.
pub fn nearby(point: &Point, polygons: &[Polygon], radius_meters: f64) -> Result<Vec<String>> {
    check_radius(radius_meters)?;
    point.validate()?;
    validate_all(polygons)?;

    Ok(polygons
        .iter()
        .filter(|polygon| !contains(polygon, point))
        .filter(|polygon| distance_to_polygon_meters(point, polygon) <= radius_meters)
        .map(|polygon| polygon.name.clone())
        .collect())
}

/// Containment plus one nearby list per radius band
pub fn locate(point: &Point, polygons: &[Polygon], bands: &[u32]) -> Result<ClassificationResult> {
    point.validate()?;
    check_bands(bands)?;
    validate_all(polygons)?;

    let positions: Vec<usize> = (0..polygons.len()).collect();
    let matches = match_positions(point, polygons, &positions, bands);
    Ok(matches.into_result(polygons))
}

/// Polygon positions matched for one point
#[derive(Debug, Default)]
struct Matches {
    contained: Vec<usize>,
    nearby: BTreeMap<u32, Vec<usize>>,
}

impl Matches {
    fn into_result(self, polygons: &[Polygon]) -> ClassificationResult {
        let names = |positions: Vec<usize>| -> Vec<String> {
            positions
                .into_iter()
                .map(|i| polygons[i].name.clone())
                .collect()
        };

        ClassificationResult {
            matched_names: names(self.contained),
            nearby: self
                .nearby
                .into_iter()
                .map(|(radius, positions)| (radius, names(positions)))
                .collect(),
        }
    }

    fn into_places(self, polygons: &[Polygon]) -> PlaceData {
        let places = |positions: Vec<usize>| -> Vec<Place> {
            positions
                .into_iter()
                .map(|i| Place::from_polygon(&polygons[i]))
                .collect()
        };

        PlaceData {
            current: places(self.contained),
            nearby: self
                .nearby
                .into_iter()
                .map(|(radius, positions)| (PlaceData::band_key(radius), places(positions)))
                .collect(),
        }
    }
}

/// Test the candidate positions (ascending) against the point.
///
/// Inputs must already be validated.
fn match_positions(
    point: &Point,
    polygons: &[Polygon],
    candidates: &[usize],
    bands: &[u32],
) -> Matches {
    let mut matches = Matches::default();
    for &radius in bands {
        matches.nearby.entry(radius).or_default();
    }

    let widest = bands.iter().copied().max().unwrap_or(0);

    for &position in candidates {
        let polygon = &polygons[position];
        if contains(polygon, point) {
            matches.contained.push(position);
            continue;
        }

        if widest == 0 {
            continue;
        }

        let distance = distance_to_polygon_meters(point, polygon);
        for (&radius, positions) in matches.nearby.iter_mut() {
            if distance <= f64::from(radius) {
                positions.push(position);
            }
        }
    }

    debug!(
        "Classified {}: {} containing, {} candidates",
        point,
        matches.contained.len(),
        candidates.len()
    );

    matches
}

fn check_radius(radius_meters: f64) -> Result<()> {
    if radius_meters.is_finite() && radius_meters > 0.0 {
        Ok(())
    } else {
        Err(LocateError::InvalidRadius(radius_meters))
    }
}

fn check_bands(bands: &[u32]) -> Result<()> {
    bands
        .iter()
        .try_for_each(|&radius| check_radius(f64::from(radius)))
}

/// Classifier bound to a set of radius bands.
///
/// Works either on a plain polygon slice or on a prebuilt [`RegionIndex`],
/// which skips polygons whose bounding box is out of reach.
#[derive(Debug, Clone)]
pub struct RegionClassifier {
    bands: Vec<u32>,
}

impl Default for RegionClassifier {
    fn default() -> Self {
        Self {
            bands: DEFAULT_BANDS.to_vec(),
        }
    }
}

impl RegionClassifier {
    /// Create a classifier reporting the given radius bands
    pub fn new(bands: Vec<u32>) -> Result<Self> {
        check_bands(&bands)?;
        let mut bands = bands;
        bands.sort_unstable();
        bands.dedup();
        Ok(Self { bands })
    }

    pub fn bands(&self) -> &[u32] {
        &self.bands
    }

    /// Classify against a polygon slice
    pub fn locate(&self, point: &Point, polygons: &[Polygon]) -> Result<ClassificationResult> {
        locate(point, polygons, &self.bands)
    }

    /// Classify against an index; same result as [`RegionClassifier::locate`]
    /// on the index's polygons
    pub fn locate_indexed(
        &self,
        point: &Point,
        index: &RegionIndex,
    ) -> Result<ClassificationResult> {
        point.validate()?;
        let candidates = self.candidates(point, index);
        Ok(match_positions(point, index.polygons(), &candidates, &self.bands)
            .into_result(index.polygons()))
    }

    /// Places response for a point
    pub fn places(&self, point: &Point, index: &RegionIndex) -> Result<PlaceData> {
        point.validate()?;
        let candidates = self.candidates(point, index);
        Ok(match_positions(point, index.polygons(), &candidates, &self.bands)
            .into_places(index.polygons()))
    }

    fn candidates(&self, point: &Point, index: &RegionIndex) -> Vec<usize> {
        match self.bands.last() {
            Some(&widest) => index.candidates_within(point, f64::from(widest)),
            None => index.candidates_containing(point),
        }
    }
}
