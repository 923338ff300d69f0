//! Registry error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by registry backends
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid inventory {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode inventory: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("invalid page token: {0}")]
    InvalidPageToken(String),
}
