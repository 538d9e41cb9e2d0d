//! Error types for the core crate.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A user-supplied exclusion pattern failed to compile. Surfaced when
    /// a commit is attempted, not at configuration time.
    #[error("invalid exclusion pattern {pattern:?}: {message}")]
    PatternCompilation { pattern: String, message: String },

    /// Out-of-range revision passed to revert.
    #[error("invalid revision {revision} ({available} available)")]
    InvalidRevision { revision: i64, available: usize },

    /// Store error.
    #[error(transparent)]
    Store(#[from] savepoint_store::StoreError),

    /// IO error on the source file side.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Unknown configuration key at construction.
    #[error("unknown configuration key: {key}")]
    UnknownKey { key: String },
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
