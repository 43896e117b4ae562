//! Manifest persistence error types.

use std::path::PathBuf;

use thiserror::Error;

/// Schema creation or persistence failures.
///
/// Fatal to the persistence step only: mutated output files already written
/// by the engine are never rolled back.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("manifest schema file not found at {path}")]
    SchemaMissing { path: PathBuf },

    #[error("failed to read manifest schema {path}: {source}")]
    SchemaIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest schema from {origin} is malformed: {reason}")]
    MalformedSchema { origin: String, reason: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for manifest operations.
pub type Result<T> = std::result::Result<T, StorageError>;
