//! EAVlite Store - SQLite persistence for entity-attribute-value records
//!
//! Provides:
//! - SQLite schema with migrations framework
//! - Field catalog and field value store with race-safe get-or-create
//! - Typed value codec dispatching to per-type value tables
//! - Entity repository with recursive hierarchy resolution

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

// Re-export key types
pub use errors::Result;
pub use repo::EntityRepo;
