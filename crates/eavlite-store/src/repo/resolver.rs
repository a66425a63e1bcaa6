//! Hierarchy resolver
//!
//! Materializes an entity's full descendant tree: one recursive
//! closure query collects every transitive relation edge, one batched
//! query fetches all descendant fields, and the nested tree is
//! assembled bottom-up in memory.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use crate::repo::codec::{self, RawFieldRow};
use eavlite_core::errors::EavError;
use eavlite_core::model::{EntityTree, Field, FieldValue};
use rusqlite::{Connection, OptionalExtension};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Backstop for runaway recursion; the relation graph is expected to
/// stay acyclic and far shallower than this.
const MAX_DEPTH: usize = 64;

/// Materialize an entity: its own row, its own fields, and one
/// synthetic ENTITY field per direct child carrying the child's
/// recursively resolved subtree
pub fn get(conn: &Connection, entity_id: i64) -> Result<Option<EntityTree>> {
    let Some((name, parent_id)) = fetch_entity(conn, entity_id)? else {
        return Ok(None);
    };

    let mut fields = fetch_fields(conn, &[entity_id])?
        .remove(&entity_id)
        .unwrap_or_default();
    fields.extend(resolve_children(conn, entity_id)?);

    tracing::debug!(entity_id, field_count = fields.len(), "resolved entity tree");

    Ok(Some(EntityTree {
        id: entity_id,
        name,
        parent_id,
        fields,
    }))
}

/// Fetch the entity row merged with its direct parent edge
///
/// First edge wins when an entity carries several parents.
fn fetch_entity(conn: &Connection, entity_id: i64) -> Result<Option<(String, Option<i64>)>> {
    conn.query_row(
        "SELECT e.name, r.custom_entity_id_related
         FROM custom_entity e
         LEFT JOIN custom_entity_relation r ON r.custom_entity_id = e.id
         WHERE e.id = ?1
         LIMIT 1",
        [entity_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()
    .map_err(|e| from_rusqlite("fetch_entity", e))
}

/// Fetch the own fields of every listed entity in one query, grouped
/// by entity id and ordered by slot id within each entity
fn fetch_fields(conn: &Connection, entity_ids: &[i64]) -> Result<HashMap<i64, Vec<Field>>> {
    if entity_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders = vec!["?"; entity_ids.len()].join(", ");
    let sql = format!(
        "SELECT v.custom_entity_id, v.id, f.name, f.type,
                s.value, n.value, d.value, j.value
         FROM custom_entity_field f
         INNER JOIN custom_entity_field_value v ON v.custom_entity_field_id = f.id
         LEFT JOIN custom_entity_field_value_string s ON s.custom_entity_field_value_id = v.id
         LEFT JOIN custom_entity_field_value_number n ON n.custom_entity_field_value_id = v.id
         LEFT JOIN custom_entity_field_value_datetime d ON d.custom_entity_field_value_id = v.id
         LEFT JOIN custom_entity_field_value_json j ON j.custom_entity_field_value_id = v.id
         WHERE v.custom_entity_id IN ({placeholders})
         ORDER BY v.custom_entity_id, v.id"
    );

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| from_rusqlite("fetch_fields", e))?;

    let raw_rows: Vec<RawFieldRow> = stmt
        .query_map(rusqlite::params_from_iter(entity_ids.iter()), |row| {
            Ok(RawFieldRow {
                entity_id: row.get(0)?,
                slot_id: row.get(1)?,
                name: row.get(2)?,
                type_label: row.get(3)?,
                value_string: row.get(4)?,
                value_number: row.get(5)?,
                value_datetime: row.get(6)?,
                value_json: row.get(7)?,
            })
        })
        .map_err(|e| from_rusqlite("fetch_fields", e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| from_rusqlite("fetch_fields", e))?;

    let mut by_entity: HashMap<i64, Vec<Field>> = HashMap::new();
    for raw in raw_rows {
        let entity_id = raw.entity_id;
        let field = codec::decode_field(raw)?;
        by_entity.entry(entity_id).or_default().push(field);
    }

    Ok(by_entity)
}

/// One transitive relation edge under the resolution root
struct DescendantEdge {
    child_id: i64,
    parent_id: i64,
    child_name: String,
}

/// Walk the relation graph transitively from the root in one round
/// trip
///
/// UNION (not UNION ALL) deduplicates rows, so the SQL walk itself
/// terminates even on a cyclic graph; cycles are then rejected during
/// assembly.
fn fetch_descendant_edges(conn: &Connection, root: i64) -> Result<Vec<DescendantEdge>> {
    let mut stmt = conn
        .prepare(
            "WITH RECURSIVE relation_closure AS (
                SELECT custom_entity_id, custom_entity_id_related
                FROM custom_entity_relation
                WHERE custom_entity_id_related = ?1
                UNION
                SELECT r.custom_entity_id, r.custom_entity_id_related
                FROM custom_entity_relation r
                INNER JOIN relation_closure c ON r.custom_entity_id_related = c.custom_entity_id
            )
            SELECT c.custom_entity_id, c.custom_entity_id_related, e.name
            FROM relation_closure c
            INNER JOIN custom_entity e ON e.id = c.custom_entity_id
            ORDER BY c.custom_entity_id",
        )
        .map_err(|e| from_rusqlite("fetch_descendant_edges", e))?;

    let edges = stmt
        .query_map([root], |row| {
            Ok(DescendantEdge {
                child_id: row.get(0)?,
                parent_id: row.get(1)?,
                child_name: row.get(2)?,
            })
        })
        .map_err(|e| from_rusqlite("fetch_descendant_edges", e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| from_rusqlite("fetch_descendant_edges", e));
    edges
}

/// Resolve the root's direct children as ENTITY-typed fields, each
/// carrying its recursively assembled subtree
fn resolve_children(conn: &Connection, root: i64) -> Result<Vec<Field>> {
    let edges = fetch_descendant_edges(conn, root)?;
    if edges.is_empty() {
        return Ok(Vec::new());
    }

    let descendant_ids: Vec<i64> = edges
        .iter()
        .map(|e| e.child_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let fields_by_entity = fetch_fields(conn, &descendant_ids)?;

    // parent -> (child id, child name), in child-id order from the query
    let mut children_of: HashMap<i64, Vec<(i64, String)>> = HashMap::new();
    for edge in edges {
        children_of
            .entry(edge.parent_id)
            .or_default()
            .push((edge.child_id, edge.child_name));
    }

    let mut path = HashSet::from([root]);
    build_subtree(root, &children_of, &fields_by_entity, &mut path, 0)
}

/// Assemble the subtree under `parent` bottom-up
///
/// `path` tracks the current ancestor chain: revisiting a node on the
/// path is a relation cycle. A node reachable through two distinct
/// parents (a diamond) is duplicated under both, not rejected.
fn build_subtree(
    parent: i64,
    children_of: &HashMap<i64, Vec<(i64, String)>>,
    fields_by_entity: &HashMap<i64, Vec<Field>>,
    path: &mut HashSet<i64>,
    depth: usize,
) -> Result<Vec<Field>> {
    if depth >= MAX_DEPTH {
        return Err(EavError::DepthExceeded {
            max_depth: MAX_DEPTH,
        });
    }

    let mut out = Vec::new();
    if let Some(children) = children_of.get(&parent) {
        for (child_id, child_name) in children {
            if !path.insert(*child_id) {
                return Err(EavError::CycleDetected {
                    entity_id: *child_id,
                });
            }

            let mut child_fields = fields_by_entity.get(child_id).cloned().unwrap_or_default();
            child_fields.extend(build_subtree(
                *child_id,
                children_of,
                fields_by_entity,
                path,
                depth + 1,
            )?);
            path.remove(child_id);

            out.push(Field {
                id: *child_id,
                entity_id: *child_id,
                name: child_name.clone(),
                value: FieldValue::Entity(child_fields),
            });
        }
    }

    Ok(out)
}
