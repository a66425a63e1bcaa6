use crate::model::FieldType;
use thiserror::Error;

/// Result type alias using EavError
pub type Result<T> = std::result::Result<T, EavError>;

/// Error taxonomy for eavlite operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EavError {
    /// Entity not found in storage
    #[error("Entity not found: {entity_id}")]
    EntityNotFound { entity_id: i64 },

    /// ENTITY-typed fields are synthesized at read time and cannot be written
    #[error("Field '{name}' has type ENTITY, which cannot be written directly")]
    UnwritableFieldType { name: String },

    /// The declared field type disagrees with the populated value table
    #[error("Value slot {slot_id} has no {expected} value despite its declared type")]
    TypeMismatch { slot_id: i64, expected: FieldType },

    /// A persisted value could not be decoded (bad JSON, out-of-range timestamp)
    #[error("Malformed value in slot {slot_id}: {reason}")]
    MalformedValue { slot_id: i64, reason: String },

    /// A field definition row carries a type label outside the known set
    #[error("Unknown field type: {value}")]
    UnknownFieldType { value: String },

    /// The relation graph contains a cycle through this entity
    #[error("Relation cycle detected at entity {entity_id}")]
    CycleDetected { entity_id: i64 },

    /// Descendant resolution exceeded the fixed depth bound
    #[error("Descendant resolution exceeded max depth {max_depth}")]
    DepthExceeded { max_depth: usize },

    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Database-level failure, propagated from the backend
    #[error("Persistence error in {op}: {message}")]
    Persistence { op: String, message: String },
}

/// Conversion from serde_json::Error to EavError
impl From<serde_json::Error> for EavError {
    fn from(err: serde_json::Error) -> Self {
        EavError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_display_names_expected_type() {
        let err = EavError::TypeMismatch {
            slot_id: 7,
            expected: FieldType::Number,
        };
        let rendered = err.to_string();
        assert!(rendered.contains("7"));
        assert!(rendered.contains("NUMBER"));
    }

    #[test]
    fn test_serde_json_error_converts_to_serialization() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: EavError = parse_err.into();
        assert!(matches!(err, EavError::Serialization { .. }));
    }
}
