//! EAVlite Core - Domain model for entity-attribute-value storage
//!
//! This crate provides the foundational data structures for eavlite:
//! - Entity trees with dynamically named, typed fields
//! - Tagged field values over the four persisted types plus the
//!   synthesized ENTITY type for nested children
//! - The canonical error taxonomy shared by all crates

pub mod errors;
pub mod model;

// Re-export commonly used types
pub use errors::{EavError, Result};
pub use model::{EntityTree, Field, FieldType, FieldValue, NewEntity, NewField};
