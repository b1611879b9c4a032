//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
///
/// Every variant is a storage failure from the caller's point of view; an
/// absent document is never an error at this layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Document serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Field name that cannot be used in a filter or mutation.
    #[error("invalid field name: {0:?}")]
    InvalidField(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("store lock poisoned: {0}")]
    Poisoned(String),

    /// The blocking task running a database call failed.
    #[error("background task failed: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
