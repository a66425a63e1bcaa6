//! Error handling for eavlite-store
//!
//! Wraps eavlite-core EavError with store-specific helpers

use eavlite_core::errors::EavError;

/// Result type alias using EavError
pub type Result<T> = eavlite_core::errors::Result<T>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> EavError {
    EavError::Persistence {
        op: "migration".to_string(),
        message: format!("Migration {} failed: {}", migration_id, reason),
    }
}

/// Create a database error from rusqlite::Error, tagged with the failing operation
pub fn from_rusqlite(op: &str, err: rusqlite::Error) -> EavError {
    EavError::Persistence {
        op: op.to_string(),
        message: err.to_string(),
    }
}
