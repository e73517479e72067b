//! Error types for region classification.

use thiserror::Error;

/// Errors surfaced by classification and boundary lookups.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocateError {
    /// Latitude/longitude missing, non-numeric, non-finite or out of range
    #[error("invalid coordinates: {reason}")]
    InvalidCoordinates { reason: String },

    /// A supplied polygon cannot be used for classification
    #[error("invalid polygon #{index} ({name}): {reason}")]
    InvalidPolygon {
        index: usize,
        name: String,
        reason: String,
    },

    /// Non-positive or non-finite radius passed to a nearby lookup
    #[error("invalid radius: {0} (must be a positive number of meters)")]
    InvalidRadius(f64),

    /// No polygons are loaded for the requested province/municipality
    #[error("no boundaries loaded for {}", describe_context(.province, .municipality))]
    UnknownContext {
        province: String,
        municipality: Option<String>,
    },
}

impl LocateError {
    pub(crate) fn coordinates(reason: impl Into<String>) -> Self {
        LocateError::InvalidCoordinates {
            reason: reason.into(),
        }
    }
}

fn describe_context(province: &str, municipality: &Option<String>) -> String {
    match municipality {
        Some(m) => format!("province '{}', municipality '{}'", province, m),
        None => format!("province '{}'", province),
    }
}

pub type Result<T> = std::result::Result<T, LocateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_context_message() {
        let err = LocateError::UnknownContext {
            province: "Cotabato".to_string(),
            municipality: Some("Kabacan".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "no boundaries loaded for province 'Cotabato', municipality 'Kabacan'"
        );

        let err = LocateError::UnknownContext {
            province: "Cotabato".to_string(),
            municipality: None,
        };
        assert_eq!(
            err.to_string(),
            "no boundaries loaded for province 'Cotabato'"
        );
    }
}
