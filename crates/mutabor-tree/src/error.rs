//! Provider error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by an [`crate::AstProvider`] implementation.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in {file}: {message}")]
    Parse { file: String, message: String },

    #[error("cannot pretty-print node: {0}")]
    Print(String),
}

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;
