//! Places response returned to map and list views.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Polygon;

/// Region kind reported when a polygon carries none
pub const DEFAULT_KIND: &str = "barangay";

/// A named region in a places response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    #[serde(rename = "polType")]
    pub pol_type: String,
    pub name: String,
}

impl Place {
    pub fn from_polygon(polygon: &Polygon) -> Self {
        Self {
            pol_type: polygon
                .kind
                .clone()
                .unwrap_or_else(|| DEFAULT_KIND.to_string()),
            name: polygon.name.clone(),
        }
    }
}

/// Places around a point: `{"current": [...], "nearby200": [...], "nearby500": [...]}`
///
/// One `nearby{radius}` key is emitted per computed radius band.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceData {
    pub current: Vec<Place>,

    #[serde(flatten)]
    pub nearby: BTreeMap<String, Vec<Place>>,
}

impl PlaceData {
    /// Key used for a radius band
    pub fn band_key(radius_meters: u32) -> String {
        format!("nearby{}", radius_meters)
    }

    pub fn band(&self, radius_meters: u32) -> &[Place] {
        self.nearby
            .get(&Self::band_key(radius_meters))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Point;

    #[test]
    fn test_place_default_kind() {
        let poly = Polygon::new("Labuo", vec![Point::new(7.0, 125.0).unwrap()]);
        assert_eq!(Place::from_polygon(&poly).pol_type, "barangay");

        let poly = poly.with_kind("purok");
        assert_eq!(Place::from_polygon(&poly).pol_type, "purok");
    }

    #[test]
    fn test_place_data_wire_shape() {
        let mut data = PlaceData {
            current: vec![Place {
                pol_type: "barangay".to_string(),
                name: "Del Carmen".to_string(),
            }],
            nearby: BTreeMap::new(),
        };
        data.nearby.insert(PlaceData::band_key(200), vec![]);
        data.nearby.insert(
            PlaceData::band_key(500),
            vec![Place {
                pol_type: "barangay".to_string(),
                name: "Labuo".to_string(),
            }],
        );

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "current": [{ "polType": "barangay", "name": "Del Carmen" }],
                "nearby200": [],
                "nearby500": [{ "polType": "barangay", "name": "Labuo" }]
            })
        );

        let parsed: PlaceData = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.band(500)[0].name, "Labuo");
        assert!(parsed.band(1000).is_empty());
    }
}
