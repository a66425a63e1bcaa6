//! Field catalog - shared dictionary of field definitions
//!
//! One definition row per (name, type), shared by every entity using
//! that attribute. Creation is race-safe: insert with conflict
//! absorption, then re-select, so concurrent callers all observe the
//! same id regardless of interleaving.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use eavlite_core::errors::EavError;
use eavlite_core::model::FieldType;
use rusqlite::Connection;

/// Get or create the field definition for (name, type), returning its id
///
/// Conflicts with an existing definition are fully absorbed; the
/// re-select covers both the inserted and the pre-existing case.
pub fn resolve_field_definition(conn: &Connection, name: &str, ty: FieldType) -> Result<i64> {
    if !ty.is_persistable() {
        return Err(EavError::UnwritableFieldType {
            name: name.to_string(),
        });
    }

    conn.execute(
        "INSERT INTO custom_entity_field (name, type) VALUES (?1, ?2)
         ON CONFLICT(name, type) DO NOTHING",
        rusqlite::params![name, ty.as_str()],
    )
    .map_err(|e| from_rusqlite("resolve_field_definition", e))?;

    conn.query_row(
        "SELECT id FROM custom_entity_field WHERE name = ?1 AND type = ?2",
        rusqlite::params![name, ty.as_str()],
        |row| row.get(0),
    )
    .map_err(|e| from_rusqlite("resolve_field_definition", e))
}
