//! Repository layer
//!
//! Field catalog, field value store, entity repository, and the
//! hierarchy resolver over the EAV schema.

pub mod catalog;
pub mod codec;
pub mod entities;
pub mod resolver;
pub mod values;

pub use entities::EntityRepo;
