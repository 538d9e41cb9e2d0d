//! Ownership normalization capability.
//!
//! After a snapshot copy, the owner of the copied file and of any newly
//! created intermediate directories is aligned with the owner of the
//! repository root, so privilege-elevated edits do not leave root-owned
//! artifacts inside the store. Best-effort only: platforms without POSIX
//! ownership semantics no-op, and failures are logged, never fatal.

use std::path::{Path, PathBuf};

/// Capability for aligning ownership of store artifacts with the store
/// root.
pub trait OwnershipPolicy: Send + Sync {
    /// Align the owner of each of `paths` with the owner of `root`.
    fn align_to_root(&self, root: &Path, paths: &[PathBuf]);
}

/// Ownership normalization using the host platform's semantics.
#[derive(Debug, Default)]
pub struct HostOwnership;

impl OwnershipPolicy for HostOwnership {
    #[cfg(unix)]
    fn align_to_root(&self, root: &Path, paths: &[PathBuf]) {
        use std::os::unix::fs::MetadataExt;
        use tracing::warn;

        let meta = match std::fs::metadata(root) {
            Ok(meta) => meta,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "cannot stat store root");
                return;
            }
        };

        for path in paths {
            if let Err(e) = std::os::unix::fs::chown(path, Some(meta.uid()), Some(meta.gid())) {
                warn!(path = %path.display(), error = %e, "ownership normalization failed");
            }
        }
    }

    #[cfg(not(unix))]
    fn align_to_root(&self, _root: &Path, _paths: &[PathBuf]) {}
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_align_to_root_is_best_effort() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, "x").unwrap();

        // Same owner already; must not fail either way.
        HostOwnership.align_to_root(dir.path(), &[file]);

        // Missing targets are logged, not raised.
        HostOwnership.align_to_root(dir.path(), &[dir.path().join("missing")]);
    }
}
