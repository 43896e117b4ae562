//! Engine error taxonomy.

use std::path::PathBuf;

use mutabor_manifest::StorageError;
use mutabor_policy::RegistryError;
use mutabor_tree::ProviderError;
use thiserror::Error;

/// Fatal configuration failures, raised before any mutation work begins.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("input directory must not be blank")]
    BlankInputDir,

    #[error("output directory must not be blank")]
    BlankOutputDir,

    #[error("unknown scope strategy '{0}'")]
    UnknownScope(String),

    #[error("number of transformations must not be negative, got {0}")]
    NegativeQuota(i64),

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Failures surfaced by [`Engine::run`](crate::Engine::run).
///
/// Constraint violations and compile-check failures never appear here; they
/// are recovered as `Empty` results inside the bounded retry loop.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("engine has already run")]
    AlreadyRan,
}
