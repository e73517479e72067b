//! Classification output types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Result of classifying a point against a polygon sequence.
///
/// Built fresh per query and never mutated after it is returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Names of all polygons containing the point, in input order
    pub matched_names: Vec<String>,

    /// Radius in meters -> names of polygons within that radius which do not
    /// contain the point. Bands are cumulative.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub nearby: BTreeMap<u32, Vec<String>>,
}

impl ClassificationResult {
    /// First containing polygon, if any
    pub fn best_match(&self) -> Option<&str> {
        self.matched_names.first().map(String::as_str)
    }

    /// All matched names joined for display, `None` when nothing matched
    pub fn label(&self) -> Option<String> {
        if self.matched_names.is_empty() {
            None
        } else {
            Some(self.matched_names.join(", "))
        }
    }

    /// Names within a radius band, empty if the band was not computed
    pub fn nearby_within(&self, radius_meters: u32) -> &[String] {
        self.nearby
            .get(&radius_meters)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.matched_names.is_empty() && self.nearby.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label() {
        let mut result = ClassificationResult::default();
        assert_eq!(result.label(), None);
        assert_eq!(result.best_match(), None);
        assert!(result.is_empty());

        result.matched_names = vec!["Del Carmen".to_string(), "Labuo".to_string()];
        assert_eq!(result.label().as_deref(), Some("Del Carmen, Labuo"));
        assert_eq!(result.best_match(), Some("Del Carmen"));
    }

    #[test]
    fn test_nearby_within() {
        let mut result = ClassificationResult::default();
        result.nearby.insert(200, vec!["New Cebu".to_string()]);
        assert_eq!(result.nearby_within(200), ["New Cebu".to_string()]);
        assert!(result.nearby_within(500).is_empty());
        assert!(!result.is_empty());
    }

    #[test]
    fn test_serialization_shape() {
        let mut result = ClassificationResult {
            matched_names: vec!["Del Carmen".to_string()],
            nearby: BTreeMap::new(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, serde_json::json!({ "matched_names": ["Del Carmen"] }));

        result.nearby.insert(500, vec![]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["nearby"]["500"], serde_json::json!([]));
    }
}
