// georepd - app/snapshot.rs
//
// Snapshot lifecycle: a point-in-time view of the watched tree so the
// walk observes a stable state.
//
// Snapshot names embed the pid (parallel instances and crash-restarts
// never collide) and the triggering rctime (leftover snapshots can be
// correlated with the cycle that created them post mortem).

use crate::core::rctime::Rctime;
use crate::util::constants::{SNAP_DIR_NAME, SNAP_NAME_SUFFIX};
use crate::util::error::SnapshotError;
use std::fs;
use std::path::{Path, PathBuf};

/// Creates and destroys named point-in-time views of the watched tree.
pub trait Snapshotter {
    /// Materialise a snapshot for the cycle triggered by `rctime`;
    /// returns its root path.
    fn create(&self, rctime: Rctime) -> Result<PathBuf, SnapshotError>;

    /// Remove a snapshot. A failure here is non-fatal: the next cycle
    /// uses a distinct name.
    fn destroy(&self, path: &Path) -> Result<(), SnapshotError>;
}

/// Snapshots materialised by creating a directory under the
/// filesystem's `.snap` namespace.
pub struct SnapDirSnapshots {
    base: PathBuf,
}

impl SnapDirSnapshots {
    pub fn new(base: PathBuf) -> Self {
        Self { base }
    }
}

impl Snapshotter for SnapDirSnapshots {
    fn create(&self, rctime: Rctime) -> Result<PathBuf, SnapshotError> {
        let name = format!("{}{}{}", std::process::id(), rctime, SNAP_NAME_SUFFIX);
        let path = self.base.join(SNAP_DIR_NAME).join(name);

        tracing::debug!(path = %path.display(), "Creating snapshot");
        fs::create_dir_all(&path).map_err(|e| SnapshotError::Create {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }

    fn destroy(&self, path: &Path) -> Result<(), SnapshotError> {
        tracing::debug!(path = %path.display(), "Removing snapshot");
        fs::remove_dir(path).map_err(|e| SnapshotError::Remove {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
