//! Field value store - binds field definitions to entities and writes
//! typed values
//!
//! Slots use the same race-safe get-or-create pattern as the catalog;
//! the typed value itself is written through the codec.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use crate::repo::{catalog, codec};
use eavlite_core::model::NewField;
use rusqlite::Connection;

/// Get or create the value slot binding (entity, field definition)
pub fn resolve_slot(conn: &Connection, entity_id: i64, field_definition_id: i64) -> Result<i64> {
    conn.execute(
        "INSERT INTO custom_entity_field_value (custom_entity_id, custom_entity_field_id)
         VALUES (?1, ?2)
         ON CONFLICT(custom_entity_id, custom_entity_field_id) DO NOTHING",
        rusqlite::params![entity_id, field_definition_id],
    )
    .map_err(|e| from_rusqlite("resolve_slot", e))?;

    conn.query_row(
        "SELECT id FROM custom_entity_field_value
         WHERE custom_entity_id = ?1 AND custom_entity_field_id = ?2",
        rusqlite::params![entity_id, field_definition_id],
        |row| row.get(0),
    )
    .map_err(|e| from_rusqlite("resolve_slot", e))
}

/// Write one field: resolve definition and slot, then store the value
///
/// Definition and slot resolution are idempotent; the value write
/// overwrites in place, so repeated calls leave one typed row.
pub fn set_field(conn: &Connection, entity_id: i64, field: &NewField) -> Result<i64> {
    let ty = field.value.field_type();
    let field_definition_id = catalog::resolve_field_definition(conn, &field.name, ty)?;
    let slot_id = resolve_slot(conn, entity_id, field_definition_id)?;
    codec::write_value(conn, slot_id, &field.name, &field.value)?;

    Ok(slot_id)
}

/// Write fields one at a time
///
/// Sequential on purpose: each write is itself a get-or-create, so
/// serializing them avoids duplicate-slot races within one call. No
/// internal transaction boundary; atomicity belongs to the caller.
pub fn set_fields(conn: &Connection, entity_id: i64, fields: &[NewField]) -> Result<()> {
    for field in fields {
        set_field(conn, entity_id, field)?;
    }

    Ok(())
}
