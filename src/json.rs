use serde::Serialize;

use crate::error::CurationError;

/// Serialisation of results to JSON, implemented on the output values of the engine
/// so they can be handed to a presentation layer as-is.
pub trait ToJson
where
    Self: Serialize,
{
    /// Serializes this item to a JSON string
    fn to_json_string(&self) -> Result<String, CurationError> {
        serde_json::to_string_pretty(self).map_err(|e| {
            CurationError::JsonError(e, String::new(), "Serializing to JSON string")
        })
    }

    /// Serializes this item to a compact JSON string (no indentation)
    fn to_json_compact(&self) -> Result<String, CurationError> {
        serde_json::to_string(self).map_err(|e| {
            CurationError::JsonError(e, String::new(), "Serializing to compact JSON string")
        })
    }

    /// Serializes this item to a JSON value
    fn to_json_value(&self) -> Result<serde_json::Value, CurationError> {
        serde_json::to_value(self).map_err(|e| {
            CurationError::JsonError(e, String::new(), "Serializing to JSON value")
        })
    }
}
