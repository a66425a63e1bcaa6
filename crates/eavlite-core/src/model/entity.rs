use serde::{Deserialize, Serialize};

use super::field::{Field, NewField};

/// Input for creating an entity
///
/// The parent id, when present, becomes a directed relation edge from
/// the new entity to its parent. Initial fields are written one at a
/// time after the entity row exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntity {
    pub name: String,
    pub parent_id: Option<i64>,
    pub is_private: bool,
    pub fields: Vec<NewField>,
}

impl NewEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_id: None,
            is_private: false,
            fields: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_field(mut self, field: NewField) -> Self {
        self.fields.push(field);
        self
    }
}

/// A fully materialized entity: its own row merged with its resolved
/// field list
///
/// The field list holds the entity's scalar/structured fields followed
/// by one synthetic ENTITY-typed field per direct child, each carrying
/// that child's recursively resolved subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTree {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub fields: Vec<Field>,
}

impl EntityTree {
    /// Look up a field by name in this entity's own field list
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Iterate the synthetic ENTITY-typed fields (direct children)
    pub fn children(&self) -> impl Iterator<Item = &Field> {
        self.fields
            .iter()
            .filter(|f| f.field_type() == super::field::FieldType::Entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::field::{FieldType, FieldValue};

    #[test]
    fn test_new_entity_builder() {
        let new = NewEntity::new("Custom Entity")
            .with_parent(49)
            .with_field(NewField::new("count", FieldValue::Number(5)));

        assert_eq!(new.name, "Custom Entity");
        assert_eq!(new.parent_id, Some(49));
        assert_eq!(new.fields.len(), 1);
        assert!(!new.is_private);
    }

    #[test]
    fn test_tree_field_lookup_and_children() {
        let tree = EntityTree {
            id: 1,
            name: "root".to_string(),
            parent_id: None,
            fields: vec![
                Field {
                    id: 10,
                    entity_id: 1,
                    name: "count".to_string(),
                    value: FieldValue::Number(5),
                },
                Field {
                    id: 2,
                    entity_id: 2,
                    name: "child".to_string(),
                    value: FieldValue::Entity(Vec::new()),
                },
            ],
        };

        assert_eq!(tree.field("count").unwrap().field_type(), FieldType::Number);
        assert!(tree.field("missing").is_none());
        let children: Vec<_> = tree.children().collect();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].entity_id, 2);
    }
}
