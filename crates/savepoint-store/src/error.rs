//! Error types for the store crate.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the version store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The configured location is absent, missing on disk, or not writable.
    #[error("{location} does not exist or is not writable")]
    CannotInitializeRepository { location: String },

    /// The path uses a scheme the store recognizes but does not support.
    #[error("unimplemented feature: {0}")]
    UnimplementedFeature(String),

    /// IO error. NotFound from a missing source file surfaces here
    /// unchanged.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend error.
    #[error("backend error: {0}")]
    Backend(#[from] git2::Error),
}
