//! Boundary records as served by the external boundaries endpoint.

use serde::{Deserialize, Serialize};

use crate::error::{LocateError, Result};
use crate::models::{ContextKey, Point, Polygon, PolygonSet};

/// One polygon as it arrives from the boundaries endpoint:
/// `{ name, points: [{lat, long}], province: { provinceName } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryRecord {
    pub name: String,

    pub points: Vec<RawVertex>,

    pub province: ProvinceRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipality: Option<MunicipalityRef>,

    #[serde(rename = "polType", default, skip_serializing_if = "Option::is_none")]
    pub pol_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawVertex {
    pub lat: f64,
    pub long: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvinceRef {
    #[serde(rename = "provinceName")]
    pub province_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MunicipalityRef {
    #[serde(rename = "munName")]
    pub mun_name: String,
}

/// How a source fills the `lat`/`long` fields of its vertices.
///
/// Sources disagree on this, so it is configured per source and never
/// guessed from the data.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum AxisOrder {
    /// `lat` holds latitude, `long` holds longitude
    #[default]
    LatLong,
    /// `lat` holds longitude, `long` holds latitude
    LongLat,
}

impl AxisOrder {
    /// Convert a raw vertex to the canonical point
    pub fn to_point(self, vertex: &RawVertex) -> Result<Point> {
        match self {
            AxisOrder::LatLong => Point::new(vertex.lat, vertex.long),
            AxisOrder::LongLat => Point::new(vertex.long, vertex.lat),
        }
    }

    /// Convert a canonical point back to the raw vertex layout
    pub fn to_raw(self, point: &Point) -> RawVertex {
        match self {
            AxisOrder::LatLong => RawVertex {
                lat: point.latitude,
                long: point.longitude,
            },
            AxisOrder::LongLat => RawVertex {
                lat: point.longitude,
                long: point.latitude,
            },
        }
    }
}

impl BoundaryRecord {
    /// Context the record belongs to
    pub fn context(&self) -> ContextKey {
        ContextKey::new(
            &self.province.province_name,
            self.municipality.as_ref().map(|m| m.mun_name.as_str()),
        )
    }

    /// Convert to a validated polygon. `index` is the record's position in
    /// its source, used for error reporting.
    pub fn to_polygon(&self, index: usize, axis: AxisOrder) -> Result<Polygon> {
        let vertices = self
            .points
            .iter()
            .enumerate()
            .map(|(i, vertex)| {
                axis.to_point(vertex).map_err(|err| LocateError::InvalidPolygon {
                    index,
                    name: self.name.clone(),
                    reason: format!("vertex {} with {:?} axis order: {}", i, axis, err),
                })
            })
            .collect::<Result<Vec<Point>>>()?;

        let mut polygon = Polygon::new(self.name.clone(), vertices);
        polygon.kind = self.pol_type.clone();
        polygon.validate(index)?;
        Ok(polygon)
    }

    /// Build a record from a polygon, writing vertices in `axis` layout
    pub fn from_polygon(polygon: &Polygon, context: &ContextKey, axis: AxisOrder) -> Self {
        Self {
            name: polygon.name.clone(),
            points: polygon.vertices.iter().map(|p| axis.to_raw(p)).collect(),
            province: ProvinceRef {
                province_name: context.province.clone(),
            },
            municipality: context.municipality.as_ref().map(|m| MunicipalityRef {
                mun_name: m.clone(),
            }),
            pol_type: polygon.kind.clone(),
        }
    }
}

impl PolygonSet {
    /// Validate and group boundary records by context, preserving order
    pub fn from_records(records: &[BoundaryRecord], axis: AxisOrder) -> Result<Self> {
        let mut set = PolygonSet::new();
        for (index, record) in records.iter().enumerate() {
            let polygon = record.to_polygon(index, axis)?;
            set.insert(record.context(), polygon);
        }
        Ok(set)
    }
}
