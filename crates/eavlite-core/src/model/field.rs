use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::EavError;

/// Declared type of an entity field
///
/// The four scalar/structured types each map to their own value table.
/// `Entity` is a logical type only: it is synthesized at read time for
/// nested child entities and is never persisted as a field definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    String,
    Number,
    Datetime,
    Json,
    Entity,
}

impl FieldType {
    /// Text encoding used in the field definition table
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "STRING",
            FieldType::Number => "NUMBER",
            FieldType::Datetime => "DATETIME",
            FieldType::Json => "JSON",
            FieldType::Entity => "ENTITY",
        }
    }

    /// Parse the text encoding back into a FieldType
    pub fn parse(value: &str) -> Result<Self, EavError> {
        match value {
            "STRING" => Ok(FieldType::String),
            "NUMBER" => Ok(FieldType::Number),
            "DATETIME" => Ok(FieldType::Datetime),
            "JSON" => Ok(FieldType::Json),
            "ENTITY" => Ok(FieldType::Entity),
            other => Err(EavError::UnknownFieldType {
                value: other.to_string(),
            }),
        }
    }

    /// Whether this type has a backing value table
    pub fn is_persistable(&self) -> bool {
        !matches!(self, FieldType::Entity)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field's value, tagged by its declared type
///
/// The tag is attached at write time and validated at read time, so a
/// value row in the wrong table surfaces as an error instead of being
/// silently taken as the field's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    String(String),
    Number(i64),
    Datetime(DateTime<Utc>),
    Json(serde_json::Value),
    /// Nested child entity: the child's own resolved field list
    Entity(Vec<Field>),
}

impl FieldValue {
    /// The declared type this value is tagged with
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::String(_) => FieldType::String,
            FieldValue::Number(_) => FieldType::Number,
            FieldValue::Datetime(_) => FieldType::Datetime,
            FieldValue::Json(_) => FieldType::Json,
            FieldValue::Entity(_) => FieldType::Entity,
        }
    }
}

/// A resolved field as returned by reads
///
/// For scalar/structured fields `id` is the field-value slot id; for
/// synthesized ENTITY fields both `id` and `entity_id` carry the child
/// entity's id and `value` holds the child's resolved field list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: i64,
    pub entity_id: i64,
    pub name: String,
    pub value: FieldValue,
}

impl Field {
    pub fn field_type(&self) -> FieldType {
        self.value.field_type()
    }
}

/// A field to be written: name plus tagged value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewField {
    pub name: String,
    pub value: FieldValue,
}

impl NewField {
    pub fn new(name: impl Into<String>, value: FieldValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_text_round_trip() {
        for ty in [
            FieldType::String,
            FieldType::Number,
            FieldType::Datetime,
            FieldType::Json,
            FieldType::Entity,
        ] {
            assert_eq!(FieldType::parse(ty.as_str()).unwrap(), ty);
        }
    }

    #[test]
    fn test_unknown_field_type_rejected() {
        let err = FieldType::parse("BLOB").unwrap_err();
        assert_eq!(
            err,
            EavError::UnknownFieldType {
                value: "BLOB".to_string()
            }
        );
    }

    #[test]
    fn test_entity_type_is_not_persistable() {
        assert!(FieldType::String.is_persistable());
        assert!(FieldType::Json.is_persistable());
        assert!(!FieldType::Entity.is_persistable());
    }

    #[test]
    fn test_value_carries_its_tag() {
        assert_eq!(
            FieldValue::Number(5).field_type(),
            FieldType::Number
        );
        assert_eq!(
            FieldValue::Json(serde_json::json!({"key": "value"})).field_type(),
            FieldType::Json
        );
        assert_eq!(
            FieldValue::Entity(Vec::new()).field_type(),
            FieldType::Entity
        );
    }
}
