//! Geographic point with validated latitude/longitude.

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::error::{LocateError, Result};

/// Geographic point (lat/long), always finite and in range once constructed
/// through [`Point::new`] or [`Point::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

impl Point {
    /// Create a validated point
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let point = Self {
            latitude,
            longitude,
        };
        point.validate()?;
        Ok(point)
    }

    /// Parse a point from the string fields carried on incident reports.
    ///
    /// Empty or non-numeric input is rejected, never coerced to zero.
    pub fn parse(latitude: &str, longitude: &str) -> Result<Self> {
        let lat = parse_component("latitude", latitude)?;
        let lon = parse_component("longitude", longitude)?;
        Self::new(lat, lon)
    }

    /// Check the point invariants
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(LocateError::coordinates(format!(
                "non-finite value ({}, {})",
                self.latitude, self.longitude
            )));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(LocateError::coordinates(format!(
                "latitude {} outside [-90, 90]",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(LocateError::coordinates(format!(
                "longitude {} outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }

    /// Planar coordinate: x = longitude, y = latitude
    pub fn to_coord(&self) -> Coord<f64> {
        Coord {
            x: self.longitude,
            y: self.latitude,
        }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

fn parse_component(field: &str, raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LocateError::coordinates(format!("{} is missing", field)));
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| LocateError::coordinates(format!("{} '{}' is not a number", field, trimmed)))
}
