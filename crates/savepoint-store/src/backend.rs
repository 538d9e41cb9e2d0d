//! Backend abstraction.
//!
//! The narrow surface the engine needs from a content-versioned backend.
//! Keeping it this small lets the git implementation be swapped for another
//! commit-graph store without touching the engine.

use crate::error::StoreResult;
use std::path::Path;

/// A content-versioned backend rooted at a storage location.
///
/// All methods take the location explicitly: the location is resolved from
/// live configuration on every call, so implementations must not cache an
/// open handle across calls.
pub trait VersionBackend: Send + Sync {
    /// Name of the metadata directory the backend creates at the location
    /// (e.g. `.git`). Its presence is what "initialized" means.
    fn metadata_dir_name(&self) -> &'static str;

    /// Initialize a repository at `location` and record one initial empty
    /// commit with `message`, so revision counting is well-defined from the
    /// first snapshot on.
    fn init(&self, location: &Path, message: &str) -> StoreResult<()>;

    /// Stage every change under `location` and commit atomically with
    /// `message`. Returns `false` when there was nothing to record (the
    /// tree is unchanged), `true` when a commit was created.
    fn stage_and_commit_all(&self, location: &Path, message: &str) -> StoreResult<bool>;

    /// Newest-first identifiers of the commits whose change set touched
    /// `rel_path` (relative to `location`). Empty when the repository or
    /// the path has no history.
    fn list_revisions(&self, location: &Path, rel_path: &Path) -> StoreResult<Vec<String>>;

    /// File content of `rel_path` as recorded by the commit `revision`.
    fn show_at_revision(
        &self,
        location: &Path,
        revision: &str,
        rel_path: &Path,
    ) -> StoreResult<Vec<u8>>;

    /// Restore the content of `rel_path` at `revision` into the working
    /// tree under `location` (the store's copy, never the original source
    /// file). Does not commit.
    fn checkout_path(&self, location: &Path, revision: &str, rel_path: &Path) -> StoreResult<()>;

    /// Resolve metadata fields for `revision`, one value per requested
    /// field name, in request order. Field names are backend-native format
    /// placeholders; unknown names resolve to empty strings.
    fn describe_revision(
        &self,
        location: &Path,
        revision: &str,
        fields: &[String],
    ) -> StoreResult<Vec<String>>;
}
