//! Entity repository
//!
//! Creates entity rows, links parent relations, and orchestrates field
//! writes. Operates on a caller-supplied connection, which may sit
//! inside a caller-managed transaction.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use crate::repo::{resolver, values};
use chrono::Utc;
use eavlite_core::errors::EavError;
use eavlite_core::model::{EntityTree, NewEntity, NewField};
use rusqlite::Connection;

/// Repository for EAV entities
pub struct EntityRepo;

impl EntityRepo {
    /// Create an entity, link its parent, write its initial fields,
    /// and return the materialized tree
    ///
    /// The relation edge is written and error-checked before this
    /// returns; a pre-existing edge is absorbed, a missing parent
    /// surfaces as a foreign-key violation.
    pub fn create(conn: &Connection, new: &NewEntity) -> Result<EntityTree> {
        let now = Utc::now().timestamp_millis();
        conn.execute(
            "INSERT INTO custom_entity (name, is_deleted, is_private, created_at)
             VALUES (?1, 0, ?2, ?3)",
            rusqlite::params![new.name, if new.is_private { 1 } else { 0 }, now],
        )
        .map_err(|e| from_rusqlite("create_entity", e))?;
        let entity_id = conn.last_insert_rowid();

        if let Some(parent_id) = new.parent_id {
            Self::link_parent(conn, entity_id, parent_id)?;
        }

        values::set_fields(conn, entity_id, &new.fields)?;

        tracing::debug!(
            entity_id,
            field_count = new.fields.len(),
            parent_id = ?new.parent_id,
            "created entity"
        );

        // Just created, so the row must resolve
        resolver::get(conn, entity_id)?.ok_or(EavError::EntityNotFound { entity_id })
    }

    /// Insert the directed relation edge child -> parent
    ///
    /// Idempotent per ordered pair.
    pub fn link_parent(conn: &Connection, entity_id: i64, parent_id: i64) -> Result<()> {
        conn.execute(
            "INSERT INTO custom_entity_relation (custom_entity_id, custom_entity_id_related)
             VALUES (?1, ?2)
             ON CONFLICT(custom_entity_id, custom_entity_id_related) DO NOTHING",
            rusqlite::params![entity_id, parent_id],
        )
        .map_err(|e| from_rusqlite("link_parent", e))?;

        Ok(())
    }

    /// Write one field on an existing entity
    pub fn set_field(conn: &Connection, entity_id: i64, field: &NewField) -> Result<i64> {
        values::set_field(conn, entity_id, field)
    }

    /// Write fields one at a time on an existing entity
    pub fn set_fields(conn: &Connection, entity_id: i64, fields: &[NewField]) -> Result<()> {
        values::set_fields(conn, entity_id, fields)
    }

    /// Materialize an entity and its full descendant tree
    ///
    /// Returns None when the entity id does not exist, so callers can
    /// tell "absent" apart from "has no fields".
    pub fn get(conn: &Connection, entity_id: i64) -> Result<Option<EntityTree>> {
        resolver::get(conn, entity_id)
    }
}
