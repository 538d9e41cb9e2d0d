//! Shared utilities for savepoint.
//!
//! This crate provides common utilities used across the savepoint workspace:
//! - Lexical path normalization for storage keys
//! - English ordinal formatting for revert messages and history listings
//! - Logging setup with tracing

pub mod log;
pub mod ordinal;
pub mod path;

pub use ordinal::ordinal;
pub use path::{normalize, strip_root};
