//! Value codec - maps field types to their typed value tables
//!
//! Writes route a tagged value into the table matching its type; reads
//! validate the declared type tag against the populated column instead
//! of taking the first non-null value.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use chrono::{DateTime, Utc};
use eavlite_core::errors::EavError;
use eavlite_core::model::{Field, FieldType, FieldValue};
use rusqlite::Connection;

/// The typed value table backing a persistable field type
pub fn value_table(ty: FieldType) -> Option<&'static str> {
    match ty {
        FieldType::String => Some("custom_entity_field_value_string"),
        FieldType::Number => Some("custom_entity_field_value_number"),
        FieldType::Datetime => Some("custom_entity_field_value_datetime"),
        FieldType::Json => Some("custom_entity_field_value_json"),
        FieldType::Entity => None,
    }
}

/// Write a tagged value into the typed table for its type
///
/// Overwrite-in-place semantics: one typed row per slot. Repeated
/// writes update `value` and `updated_at` and keep `created_at`.
pub fn write_value(
    conn: &Connection,
    slot_id: i64,
    name: &str,
    value: &FieldValue,
) -> Result<()> {
    let Some(table) = value_table(value.field_type()) else {
        return Err(EavError::UnwritableFieldType {
            name: name.to_string(),
        });
    };

    let now = Utc::now().timestamp_millis();
    match value {
        FieldValue::String(text) => upsert_unique_slot(conn, table, slot_id, text, now),
        FieldValue::Number(number) => update_or_insert_number(conn, table, slot_id, *number, now),
        FieldValue::Datetime(dt) => {
            upsert_unique_slot(conn, table, slot_id, dt.timestamp_millis(), now)
        }
        FieldValue::Json(doc) => {
            let serialized = serde_json::to_string(doc)?;
            upsert_unique_slot(conn, table, slot_id, serialized, now)
        }
        // Unreachable past the table lookup, kept for exhaustiveness
        FieldValue::Entity(_) => Err(EavError::UnwritableFieldType {
            name: name.to_string(),
        }),
    }
}

/// Upsert for the tables that enforce uniqueness on the slot reference
fn upsert_unique_slot<V: rusqlite::ToSql>(
    conn: &Connection,
    table: &str,
    slot_id: i64,
    value: V,
    now: i64,
) -> Result<()> {
    let sql = format!(
        "INSERT INTO {table} (custom_entity_field_value_id, value, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?3)
         ON CONFLICT(custom_entity_field_value_id) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at"
    );
    conn.execute(&sql, rusqlite::params![slot_id, value, now])
        .map_err(|e| from_rusqlite("write_value", e))?;

    Ok(())
}

/// The number table has no unique slot constraint, so overwrite is
/// update-first with insert as the miss path
fn update_or_insert_number(
    conn: &Connection,
    table: &str,
    slot_id: i64,
    value: i64,
    now: i64,
) -> Result<()> {
    let updated = conn
        .execute(
            &format!(
                "UPDATE {table} SET value = ?2, updated_at = ?3
                 WHERE custom_entity_field_value_id = ?1"
            ),
            rusqlite::params![slot_id, value, now],
        )
        .map_err(|e| from_rusqlite("write_value", e))?;

    if updated == 0 {
        conn.execute(
            &format!(
                "INSERT INTO {table} (custom_entity_field_value_id, value, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)"
            ),
            rusqlite::params![slot_id, value, now],
        )
        .map_err(|e| from_rusqlite("write_value", e))?;
    }

    Ok(())
}

/// One joined row from the field read query: declared type tag plus
/// the four typed value columns
pub(crate) struct RawFieldRow {
    pub entity_id: i64,
    pub slot_id: i64,
    pub name: String,
    pub type_label: String,
    pub value_string: Option<String>,
    pub value_number: Option<i64>,
    pub value_datetime: Option<i64>,
    pub value_json: Option<String>,
}

/// Reconstruct a field from a raw row, validating the type tag
///
/// The column selected by the declared type must be populated; a slot
/// whose value landed in another table is a TypeMismatch, not a
/// silently wrong value.
pub(crate) fn decode_field(row: RawFieldRow) -> Result<Field> {
    let ty = FieldType::parse(&row.type_label)?;
    let mismatch = || EavError::TypeMismatch {
        slot_id: row.slot_id,
        expected: ty,
    };

    let value = match ty {
        FieldType::String => FieldValue::String(row.value_string.ok_or_else(mismatch)?),
        FieldType::Number => FieldValue::Number(row.value_number.ok_or_else(mismatch)?),
        FieldType::Datetime => {
            let millis = row.value_datetime.ok_or_else(mismatch)?;
            let dt = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
                EavError::MalformedValue {
                    slot_id: row.slot_id,
                    reason: format!("timestamp out of range: {millis}"),
                }
            })?;
            FieldValue::Datetime(dt)
        }
        FieldType::Json => {
            let text = row.value_json.ok_or_else(mismatch)?;
            let doc = serde_json::from_str(&text).map_err(|e| EavError::MalformedValue {
                slot_id: row.slot_id,
                reason: e.to_string(),
            })?;
            FieldValue::Json(doc)
        }
        // ENTITY never reaches the definition table (schema CHECK)
        FieldType::Entity => {
            return Err(EavError::UnknownFieldType {
                value: row.type_label,
            })
        }
    };

    Ok(Field {
        id: row.slot_id,
        entity_id: row.entity_id,
        name: row.name,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations;
    use crate::repo::{catalog, values};

    fn raw_row(type_label: &str) -> RawFieldRow {
        RawFieldRow {
            entity_id: 1,
            slot_id: 11,
            name: "field".to_string(),
            type_label: type_label.to_string(),
            value_string: None,
            value_number: None,
            value_datetime: None,
            value_json: None,
        }
    }

    #[test]
    fn test_value_table_dispatch() {
        assert_eq!(
            value_table(FieldType::Number),
            Some("custom_entity_field_value_number")
        );
        assert_eq!(value_table(FieldType::Entity), None);
    }

    #[test]
    fn test_write_lands_in_dispatched_table() {
        // Every scalar write must land in the table named by the
        // dispatch function, exactly one row per slot.
        let mut conn = Connection::open_in_memory().unwrap();
        migrations::apply_migrations(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO custom_entity (name, created_at) VALUES ('e', 0)",
            [],
        )
        .unwrap();
        let entity = conn.last_insert_rowid();

        let cases = [
            FieldValue::String("text".to_string()),
            FieldValue::Number(7),
            FieldValue::Datetime(Utc::now()),
            FieldValue::Json(serde_json::json!({"k": 1})),
        ];
        for value in cases {
            let ty = value.field_type();
            let definition = catalog::resolve_field_definition(&conn, "field", ty).unwrap();
            let slot = values::resolve_slot(&conn, entity, definition).unwrap();
            write_value(&conn, slot, "field", &value).unwrap();

            let table = value_table(ty).unwrap();
            let rows: i64 = conn
                .query_row(
                    &format!(
                        "SELECT COUNT(*) FROM {table} WHERE custom_entity_field_value_id = ?1"
                    ),
                    [slot],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(rows, 1, "one row expected in {table}");
        }
    }

    #[test]
    fn test_decode_takes_tagged_column() {
        let mut row = raw_row("STRING");
        row.value_string = Some("csöcsös".to_string());
        // A stray number row for the same slot must not win
        row.value_number = Some(42);

        let field = decode_field(row).unwrap();
        assert_eq!(field.value, FieldValue::String("csöcsös".to_string()));
    }

    #[test]
    fn test_decode_mismatch_when_tagged_column_empty() {
        let mut row = raw_row("NUMBER");
        row.value_string = Some("not a number".to_string());

        let err = decode_field(row).unwrap_err();
        assert_eq!(
            err,
            EavError::TypeMismatch {
                slot_id: 11,
                expected: FieldType::Number
            }
        );
    }

    #[test]
    fn test_decode_malformed_json() {
        let mut row = raw_row("JSON");
        row.value_json = Some("{".to_string());

        let err = decode_field(row).unwrap_err();
        assert!(matches!(err, EavError::MalformedValue { slot_id: 11, .. }));
    }

    #[test]
    fn test_decode_datetime_millis() {
        let mut row = raw_row("DATETIME");
        row.value_datetime = Some(1_700_000_000_123);

        let field = decode_field(row).unwrap();
        match field.value {
            FieldValue::Datetime(dt) => assert_eq!(dt.timestamp_millis(), 1_700_000_000_123),
            other => panic!("expected datetime, got {other:?}"),
        }
    }
}
