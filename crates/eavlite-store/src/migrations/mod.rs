//! Database migrations
//!
//! Embedded SQL migrations with checksum validation

pub mod checksums;
pub mod embedded;
pub mod runner;

pub use runner::apply_migrations;
