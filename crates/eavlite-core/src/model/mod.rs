pub mod entity;
pub mod field;

pub use entity::{EntityTree, NewEntity};
pub use field::{Field, FieldType, FieldValue, NewField};
