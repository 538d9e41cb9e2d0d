//! Snapshot storage over a versioned backend.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::backend::VersionBackend;
use crate::error::{StoreError, StoreResult};
use crate::git::GitBackend;
use crate::ownership::{HostOwnership, OwnershipPolicy};

/// Message recorded by the one-time backend initialization commit.
pub const INITIAL_COMMIT_MESSAGE: &str = "Initial commit from Savepoint";

/// Resolver for the storage location.
///
/// Invoked on every access, never cached, so external reconfiguration takes
/// effect without reconstructing the store.
pub type LocationProvider = Box<dyn Fn() -> Option<PathBuf> + Send + Sync>;

/// Storage for file snapshots.
///
/// Snapshots live in a mirrored tree of absolute source paths beneath the
/// resolved location, with the backend's metadata directory alongside:
/// ```text
/// location/
///   .git/                # backend metadata
///   home/user/project/f  # store copy of /home/user/project/f
/// ```
pub struct VersionStore<B: VersionBackend = GitBackend> {
    backend: B,
    location: LocationProvider,
    ownership: Box<dyn OwnershipPolicy>,
}

impl VersionStore<GitBackend> {
    /// Create a git-backed store whose location is re-resolved per call.
    pub fn new(location: LocationProvider) -> Self {
        Self::with_backend(GitBackend, location)
    }
}

impl<B: VersionBackend> VersionStore<B> {
    /// Create a store over an arbitrary backend.
    pub fn with_backend(backend: B, location: LocationProvider) -> Self {
        Self {
            backend,
            location,
            ownership: Box::new(HostOwnership),
        }
    }

    /// Replace the ownership capability (used by tests and non-POSIX
    /// embedders).
    pub fn with_ownership(mut self, ownership: Box<dyn OwnershipPolicy>) -> Self {
        self.ownership = ownership;
        self
    }

    /// The currently resolved location, with empty values treated as
    /// unset.
    pub fn location(&self) -> Option<PathBuf> {
        (self.location)().filter(|p| !p.as_os_str().is_empty())
    }

    fn location_display(&self) -> String {
        self.location()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(unset)".to_string())
    }

    fn require_location(&self) -> StoreResult<PathBuf> {
        self.location()
            .ok_or_else(|| StoreError::CannotInitializeRepository {
                location: self.location_display(),
            })
    }

    /// Whether the store can be used at all: a location is configured,
    /// exists, and is writable. Re-evaluated on every call.
    pub fn is_enabled(&self) -> bool {
        match self.location() {
            Some(location) => fs::metadata(&location)
                .map(|meta| meta.is_dir() && !meta.permissions().readonly())
                .unwrap_or(false),
            None => false,
        }
    }

    /// Whether the backend metadata directory already exists at the
    /// location.
    pub fn is_initialized(&self) -> bool {
        if !self.is_enabled() {
            return false;
        }
        match self.location() {
            Some(location) => location.join(self.backend.metadata_dir_name()).exists(),
            None => false,
        }
    }

    /// Initialize the backend on first use.
    ///
    /// Fails with [`StoreError::CannotInitializeRepository`] when the
    /// location is unset, missing, or unwritable.
    pub fn ensure_initialized(&self) -> StoreResult<()> {
        if !self.is_enabled() {
            return Err(StoreError::CannotInitializeRepository {
                location: self.location_display(),
            });
        }

        if !self.is_initialized() {
            let location = self.require_location()?;
            info!(location = %location.display(), "initializing version store");
            self.backend.init(&location, INITIAL_COMMIT_MESSAGE)?;
        }

        Ok(())
    }

    /// Copy the source file's current bytes into the mirrored tree.
    ///
    /// Symlinked sources are captured as regular-file copies of the
    /// target's bytes at the symlink's own storage key. A missing source
    /// surfaces the platform's NotFound error unchanged. The copied file
    /// ends up owner-read/write only, and ownership of it and of any newly
    /// created intermediate directories is aligned with the owner of the
    /// store root.
    pub fn copy_snapshot(&self, normalized: &Path) -> StoreResult<PathBuf> {
        let location = self.require_location()?;
        let rel = savepoint_util::strip_root(normalized);
        let dest = location.join(&rel);

        let mut created = Vec::new();
        if let Some(parent) = dest.parent() {
            collect_missing_dirs(&location, parent, &mut created);
            fs::create_dir_all(parent)?;
        }

        // fs::read follows symlinks, fs::write creates a regular file.
        let bytes = fs::read(normalized)?;
        fs::write(&dest, bytes)?;
        restrict_permissions(&dest)?;

        created.push(dest.clone());
        self.ownership.align_to_root(&location, &created);

        debug!(source = %normalized.display(), dest = %dest.display(), "snapshotted");
        Ok(dest)
    }

    /// Stage all changes under the location and commit once.
    ///
    /// Returns `false` when there was nothing to record.
    pub fn stage_and_commit(&self, message: &str) -> StoreResult<bool> {
        let location = self.require_location()?;
        self.backend.stage_and_commit_all(&location, message)
    }

    /// Newest-first identifiers of commits that touched the storage key.
    ///
    /// Empty when the store is uninitialized or the path was never
    /// committed; those are not errors.
    pub fn list_revisions(&self, normalized: &Path) -> StoreResult<Vec<String>> {
        if !self.is_initialized() {
            return Ok(Vec::new());
        }
        let location = self.require_location()?;
        self.backend
            .list_revisions(&location, &savepoint_util::strip_root(normalized))
    }

    /// File content at the given revision.
    pub fn show_at_revision(&self, revision: &str, normalized: &Path) -> StoreResult<Vec<u8>> {
        let location = self.require_location()?;
        self.backend
            .show_at_revision(&location, revision, &savepoint_util::strip_root(normalized))
    }

    /// Restore the store's copy of the path to `revision` and commit the
    /// restoration as a new snapshot with `message`.
    pub fn checkout_to_working_tree(
        &self,
        revision: &str,
        normalized: &Path,
        message: &str,
    ) -> StoreResult<()> {
        let location = self.require_location()?;
        let rel = savepoint_util::strip_root(normalized);
        self.backend.checkout_path(&location, revision, &rel)?;
        self.backend.stage_and_commit_all(&location, message)?;
        Ok(())
    }

    /// Resolve metadata fields for a revision, in request order.
    pub fn describe_revision(
        &self,
        revision: &str,
        fields: &[String],
    ) -> StoreResult<Vec<String>> {
        let location = self.require_location()?;
        self.backend.describe_revision(&location, revision, fields)
    }
}

/// Record the ancestors of `leaf` (up to, not including, `root`) that do
/// not exist yet, deepest last, so freshly created directories can have
/// their ownership normalized after the copy.
fn collect_missing_dirs(root: &Path, leaf: &Path, out: &mut Vec<PathBuf>) {
    let mut missing: Vec<PathBuf> = leaf
        .ancestors()
        .take_while(|p| *p != root)
        .filter(|p| !p.exists())
        .map(Path::to_path_buf)
        .collect();
    missing.reverse();
    out.extend(missing);
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_at(dir: &TempDir) -> VersionStore {
        let location = dir.path().to_path_buf();
        VersionStore::new(Box::new(move || Some(location.clone())))
    }

    #[test]
    fn test_unset_location_disables_store() {
        let store = VersionStore::new(Box::new(|| None));
        assert!(!store.is_enabled());
        assert!(!store.is_initialized());

        let store = VersionStore::new(Box::new(|| Some(PathBuf::new())));
        assert!(!store.is_enabled());
    }

    #[test]
    fn test_missing_location_disables_store() {
        let store = VersionStore::new(Box::new(|| Some(PathBuf::from("/no/such/path"))));
        assert!(!store.is_enabled());
        assert!(matches!(
            store.ensure_initialized(),
            Err(StoreError::CannotInitializeRepository { .. })
        ));
    }

    #[test]
    fn test_location_change_observed_without_reconstruction() {
        use std::sync::{Arc, Mutex};

        let dir = TempDir::new().unwrap();
        let current = Arc::new(Mutex::new(None::<PathBuf>));
        let resolver = Arc::clone(&current);
        let store = VersionStore::new(Box::new(move || resolver.lock().unwrap().clone()));

        assert!(!store.is_enabled());
        *current.lock().unwrap() = Some(dir.path().to_path_buf());
        assert!(store.is_enabled());
    }

    #[test]
    fn test_ensure_initialized_creates_backend_once() {
        let dir = TempDir::new().unwrap();
        let store = store_at(&dir);

        assert!(!store.is_initialized());
        store.ensure_initialized().unwrap();
        assert!(store.is_initialized());
        assert!(dir.path().join(".git").exists());

        // Second call is a no-op.
        store.ensure_initialized().unwrap();
    }

    #[test]
    fn test_copy_snapshot_mirrors_absolute_path() {
        let dir = TempDir::new().unwrap();
        let source_dir = TempDir::new().unwrap();
        let source = source_dir.path().join("f.txt");
        fs::write(&source, "content").unwrap();

        let store = store_at(&dir);
        store.ensure_initialized().unwrap();
        let dest = store.copy_snapshot(&source).unwrap();

        let rel = savepoint_util::strip_root(&source);
        assert_eq!(dest, dir.path().join(rel));
        assert_eq!(fs::read(&dest).unwrap(), b"content");
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_snapshot_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let source_dir = TempDir::new().unwrap();
        let source = source_dir.path().join("f.txt");
        fs::write(&source, "content").unwrap();

        let store = store_at(&dir);
        store.ensure_initialized().unwrap();
        let dest = store.copy_snapshot(&source).unwrap();

        let mode = fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_snapshot_stores_symlink_as_regular_file() {
        let dir = TempDir::new().unwrap();
        let source_dir = TempDir::new().unwrap();
        let target = source_dir.path().join("target.txt");
        fs::write(&target, "linked bytes").unwrap();
        let link = source_dir.path().join("link.txt");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let store = store_at(&dir);
        store.ensure_initialized().unwrap();
        let dest = store.copy_snapshot(&link).unwrap();

        let meta = fs::symlink_metadata(&dest).unwrap();
        assert!(!meta.file_type().is_symlink());
        assert_eq!(fs::read(&dest).unwrap(), b"linked bytes");
    }

    #[test]
    fn test_copy_snapshot_missing_source_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store_at(&dir);
        store.ensure_initialized().unwrap();

        let err = store
            .copy_snapshot(Path::new("/no/such/file.txt"))
            .unwrap_err();
        match err {
            StoreError::Io(io) => assert_eq!(io.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn test_list_revisions_uninitialized_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_at(&dir);
        let revs = store.list_revisions(Path::new("/some/file.txt")).unwrap();
        assert!(revs.is_empty());
    }

    #[test]
    fn test_snapshot_commit_roundtrip() {
        let dir = TempDir::new().unwrap();
        let source_dir = TempDir::new().unwrap();
        let source = source_dir.path().join("f.txt");

        let store = store_at(&dir);
        store.ensure_initialized().unwrap();

        fs::write(&source, "one").unwrap();
        store.copy_snapshot(&source).unwrap();
        assert!(store.stage_and_commit("Commit from Savepoint").unwrap());

        fs::write(&source, "two").unwrap();
        store.copy_snapshot(&source).unwrap();
        assert!(store.stage_and_commit("Commit from Savepoint").unwrap());

        let revs = store.list_revisions(&source).unwrap();
        assert_eq!(revs.len(), 2);
        assert_eq!(store.show_at_revision(&revs[1], &source).unwrap(), b"one");
        assert_eq!(store.show_at_revision(&revs[0], &source).unwrap(), b"two");
    }

    #[test]
    fn test_checkout_to_working_tree_commits_restoration() {
        let dir = TempDir::new().unwrap();
        let source_dir = TempDir::new().unwrap();
        let source = source_dir.path().join("f.txt");

        let store = store_at(&dir);
        store.ensure_initialized().unwrap();

        fs::write(&source, "one").unwrap();
        store.copy_snapshot(&source).unwrap();
        store.stage_and_commit("first").unwrap();
        fs::write(&source, "two").unwrap();
        store.copy_snapshot(&source).unwrap();
        store.stage_and_commit("second").unwrap();

        let revs = store.list_revisions(&source).unwrap();
        store
            .checkout_to_working_tree(&revs[1], &source, "Reverted to 1st prior commit")
            .unwrap();

        let revs = store.list_revisions(&source).unwrap();
        assert_eq!(revs.len(), 3);
        assert_eq!(store.show_at_revision(&revs[0], &source).unwrap(), b"one");
    }
}
