//! Versioning engine for savepoint.
//!
//! This crate composes the version store into the per-save history
//! engine: it decides whether a path should be captured (exclusion
//! rules), normalizes paths into stable storage keys, and exposes the
//! commit / revision-query / checkout / revert operations with precise
//! indexing and failure semantics.
//!
//! # Example
//!
//! ```no_run
//! use savepoint_core::{Engine, EngineConfig, Setting};
//!
//! # fn example() -> savepoint_core::CoreResult<()> {
//! let engine = Engine::new(
//!     EngineConfig::new().with_location(Setting::value("/home/user/.savepoint")),
//! );
//!
//! // Capture a save.
//! engine.commit_file("/home/user/notes.txt")?;
//!
//! // One version ago.
//! if let Some(tmp) = engine.checkout_file(Some("/home/user/notes.txt"), 1)? {
//!     println!("previous version at {}", tmp.display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod exclude;
pub mod revision;

pub use config::{EngineConfig, Setting};
pub use engine::{Engine, SNAPSHOT_COMMIT_MESSAGE};
pub use error::{ConfigError, CoreError, CoreResult};
pub use exclude::ExclusionFilter;
pub use revision::{RevisionField, RevisionRecord, MAX_REVISION_RECORDS};
