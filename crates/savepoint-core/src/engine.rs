//! The versioning engine facade.
//!
//! Composes the exclusion filter, the path normalizer, and the version
//! store into the four operations the host adapter calls: commit, revision
//! query, checkout, revert. Every operation is synchronous and blocking;
//! configuration is re-resolved on each call.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use savepoint_store::{GitBackend, StoreError, VersionBackend, VersionStore};
use savepoint_util::ordinal;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{CoreError, CoreResult};
use crate::exclude::ExclusionFilter;
use crate::revision::{RevisionField, RevisionRecord, MAX_REVISION_RECORDS};

/// Message recorded for ordinary per-save snapshot commits.
pub const SNAPSHOT_COMMIT_MESSAGE: &str = "Commit from Savepoint";

/// Remote paths are recognized but unsupported; versioning is local-only.
const UNSUPPORTED_SCHEME_PREFIX: &str = "scp://";

/// The versioning engine.
///
/// One engine per host instance; save events are serialized by the host,
/// so no internal locking is needed.
pub struct Engine<B: VersionBackend = GitBackend> {
    config: Arc<EngineConfig>,
    filter: ExclusionFilter,
    store: VersionStore<B>,
}

impl Engine<GitBackend> {
    /// Create a git-backed engine over the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        let config = Arc::new(config);
        let location_config = Arc::clone(&config);
        let store = VersionStore::new(Box::new(move || location_config.location()));
        Self {
            filter: ExclusionFilter::new(Arc::clone(&config)),
            config,
            store,
        }
    }
}

impl<B: VersionBackend> Engine<B> {
    /// Create an engine over an arbitrary store (swapped backends, tests).
    pub fn with_store(config: Arc<EngineConfig>, store: VersionStore<B>) -> Self {
        Self {
            filter: ExclusionFilter::new(Arc::clone(&config)),
            config,
            store,
        }
    }

    /// The live configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The underlying version store.
    pub fn store(&self) -> &VersionStore<B> {
        &self.store
    }

    /// Whether the store is usable right now (re-evaluated per call).
    pub fn is_enabled(&self) -> bool {
        self.store.is_enabled()
    }

    /// Capture a snapshot of `path`.
    ///
    /// Excluded paths are a silent no-op. Remote (`scp://`) paths fail
    /// with [`StoreError::UnimplementedFeature`] before the store is
    /// touched. Otherwise the path is normalized, the backend lazily
    /// initialized, the bytes copied into the mirrored tree, and
    /// everything staged and committed once.
    pub fn commit_file(&self, path: &str) -> CoreResult<()> {
        debug!(path, "commit requested");

        if self.filter.is_excluded(path)? {
            return Ok(());
        }

        if path.starts_with(UNSUPPORTED_SCHEME_PREFIX) {
            return Err(StoreError::UnimplementedFeature(format!(
                "remote paths are not supported: {path}"
            ))
            .into());
        }

        let normalized = savepoint_util::normalize(Path::new(path));
        self.store.ensure_initialized()?;
        self.store.copy_snapshot(&normalized)?;
        self.store.stage_and_commit(SNAPSHOT_COMMIT_MESSAGE)?;

        info!(path = %normalized.display(), "snapshot committed");
        Ok(())
    }

    /// Query up to [`MAX_REVISION_RECORDS`] most recent revisions of
    /// `path`.
    ///
    /// Each record carries the implicit commit identifier plus one value
    /// per requested field name, in request order. An absent path or a
    /// path with no history yields an empty list, never an error.
    pub fn revision_information(
        &self,
        path: Option<&str>,
        fields: &[String],
    ) -> CoreResult<Vec<RevisionRecord>> {
        let Some(path) = path else {
            return Ok(Vec::new());
        };

        let normalized = savepoint_util::normalize(Path::new(path));
        let revisions = self.store.list_revisions(&normalized)?;

        let mut records = Vec::with_capacity(revisions.len().min(MAX_REVISION_RECORDS));
        for commit in revisions.into_iter().take(MAX_REVISION_RECORDS) {
            let values = self.store.describe_revision(&commit, fields)?;
            let fields = fields
                .iter()
                .cloned()
                .zip(values)
                .map(|(name, value)| RevisionField { name, value })
                .collect();
            records.push(RevisionRecord { commit, fields });
        }
        Ok(records)
    }

    /// Materialize revision `revision` of `path` into a fresh temporary
    /// file and return its path.
    ///
    /// Returns `None` for an absent path, a negative revision, a revision
    /// beyond the historical count, or a path with no history. The
    /// returned file is owned by the caller: the engine never deletes it.
    pub fn checkout_file(&self, path: Option<&str>, revision: i64) -> CoreResult<Option<PathBuf>> {
        let Some(path) = path else {
            return Ok(None);
        };
        if revision < 0 {
            return Ok(None);
        }

        let normalized = savepoint_util::normalize(Path::new(path));
        let revisions = self.store.list_revisions(&normalized)?;
        let index = revision as usize;
        if revisions.is_empty() || index >= revisions.len() {
            debug!(path, revision, "no such revision to checkout");
            return Ok(None);
        }

        let bytes = self.store.show_at_revision(&revisions[index], &normalized)?;

        let name = normalized
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut tmp = tempfile::Builder::new()
            .prefix("savepoint-")
            .suffix(&format!("-{name}"))
            .tempfile()?;
        tmp.write_all(&bytes)?;
        let (_, tmp_path) = tmp.keep().map_err(|e| e.error)?;

        debug!(path, revision, tmp = %tmp_path.display(), "revision checked out");
        Ok(Some(tmp_path))
    }

    /// Revert `path` to revision `revision`.
    ///
    /// Returns `false` (no error, no side effect) for an absent path,
    /// revision 0, or a path with no history. A negative or out-of-range
    /// revision fails with [`CoreError::InvalidRevision`]. Otherwise the
    /// store's copy is restored and committed ("Reverted to Nth prior
    /// commit"), the restored bytes are copied back onto the real source
    /// path, and `true` is returned.
    pub fn revert_file(&self, path: Option<&str>, revision: i64) -> CoreResult<bool> {
        let Some(path) = path else {
            return Ok(false);
        };
        if revision == 0 {
            debug!(path, "revert to live copy is a no-op");
            return Ok(false);
        }

        let normalized = savepoint_util::normalize(Path::new(path));
        let revisions = self.store.list_revisions(&normalized)?;
        if revisions.is_empty() {
            debug!(path, "no history to revert to");
            return Ok(false);
        }

        let available = revisions.len() - 1;
        if revision < 0 || revision as usize > available {
            return Err(CoreError::InvalidRevision {
                revision,
                available,
            });
        }

        let index = revision as usize;
        let bytes = self.store.show_at_revision(&revisions[index], &normalized)?;

        let message = format!("Reverted to {} prior commit", ordinal(index));
        self.store
            .checkout_to_working_tree(&revisions[index], &normalized, &message)?;
        fs::write(&normalized, &bytes)?;

        info!(path = %normalized.display(), revision, "reverted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Setting;
    use tempfile::TempDir;

    fn engine_at(dir: &TempDir) -> Engine {
        Engine::new(
            EngineConfig::new()
                .with_location(Setting::value(dir.path().to_string_lossy().into_owned())),
        )
    }

    #[test]
    fn test_commit_scp_path_is_unimplemented() {
        let dir = TempDir::new().unwrap();
        let engine = engine_at(&dir);

        let err = engine
            .commit_file("scp://host//home/user/f.txt")
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Store(StoreError::UnimplementedFeature(_))
        ));

        // Failed before the store was touched.
        assert!(!engine.store().is_initialized());
    }

    #[test]
    fn test_excluded_path_makes_no_store_calls() {
        let dir = TempDir::new().unwrap();
        let engine = engine_at(&dir);

        engine.commit_file(".git/config").unwrap();
        assert!(!engine.store().is_initialized());
    }

    #[test]
    fn test_queries_with_absent_path() {
        let dir = TempDir::new().unwrap();
        let engine = engine_at(&dir);

        assert!(engine.revision_information(None, &[]).unwrap().is_empty());
        assert!(engine.checkout_file(None, 1).unwrap().is_none());
        assert!(!engine.revert_file(None, 1).unwrap());
    }

    #[test]
    fn test_disabled_engine_cannot_commit() {
        let engine = Engine::new(EngineConfig::new());
        assert!(!engine.is_enabled());

        let err = engine.commit_file("/tmp/whatever.txt").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Store(StoreError::CannotInitializeRepository { .. })
        ));
    }
}
