//! Version store for savepoint.
//!
//! This crate owns all interaction with the underlying content-versioned
//! backend. The storage area is a mirrored tree of absolute source paths
//! beneath a configurable location (`/a/b/c` is stored at `location/a/b/c`),
//! with a git repository recording one commit per captured snapshot.
//!
//! The backend is an implementation detail behind the [`VersionBackend`]
//! trait; [`GitBackend`] is the library-linked git implementation.

mod backend;
mod error;
mod git;
mod ownership;
mod store;

pub use backend::VersionBackend;
pub use error::{StoreError, StoreResult};
pub use git::GitBackend;
pub use ownership::{HostOwnership, OwnershipPolicy};
pub use store::{LocationProvider, VersionStore, INITIAL_COMMIT_MESSAGE};
