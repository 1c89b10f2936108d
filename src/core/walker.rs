// georepd - core/walker.rs
//
// Snapshot walker: enumerates the files a cycle must replicate.
//
// Two strategies, selected by the worker count:
//   - 1 worker: single-threaded depth-first descent via `walkdir`,
//     pruning ignored subtrees with `filter_entry`.
//   - 2+ workers: breadth-first crawl over a shared work queue;
//     expanding a directory pushes its children instead of recursing.
//
// Every accepted path is rewritten as
// `<snapshot_root>/./<relative remainder>`; the `/./` marker tells the
// downstream transfer tool where to start preserving directory
// structure.
//
// Per-entry I/O errors are non-fatal: an unreadable directory loses its
// subtree only, and the walk carries on.

use crate::core::filter::{Filter, Freshness};
use crate::core::queue::WorkQueue;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Result of one walk: the rewritten file list and the byte total of
/// the regular files on it (symlinks are listed but not accounted).
#[derive(Debug)]
pub struct WalkReport {
    pub files: Vec<PathBuf>,
    pub total_bytes: u64,
}

/// Enumerates candidate files under a snapshot root.
pub struct Walker<'a, F: Freshness> {
    filter: &'a Filter,
    freshness: &'a F,
    workers: usize,
}

impl<'a, F: Freshness> Walker<'a, F> {
    pub fn new(filter: &'a Filter, freshness: &'a F, workers: usize) -> Self {
        Self {
            filter,
            freshness,
            workers: workers.max(1),
        }
    }

    /// Walk the snapshot and collect the file list.
    ///
    /// The snapshot root itself is always descended; name rules never
    /// apply to it. List order is directory-iteration order for the
    /// depth-first mode and unspecified for the breadth-first mode.
    pub fn walk(&self, snap_root: &Path) -> WalkReport {
        tracing::debug!(
            snapshot = %snap_root.display(),
            workers = self.workers,
            "Launching crawler"
        );
        if self.workers == 1 {
            self.walk_dfs(snap_root)
        } else {
            self.walk_bfs(snap_root)
        }
    }

    fn walk_dfs(&self, snap_root: &Path) -> WalkReport {
        let mut files = Vec::new();
        let mut total_bytes: u64 = 0;

        let walker = walkdir::WalkDir::new(snap_root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.filter.ignore(e.path(), self.freshness));

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable subtree");
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue; // descended by the iterator
            } else if file_type.is_file() {
                match entry.metadata() {
                    Ok(meta) => total_bytes += meta.len(),
                    Err(e) => {
                        tracing::warn!(path = %entry.path().display(), error = %e, "Cannot stat file")
                    }
                }
                files.push(rewrite_path(snap_root, entry.path()));
            } else if file_type.is_symlink() {
                files.push(rewrite_path(snap_root, entry.path()));
            } else {
                tracing::debug!(path = %entry.path().display(), "Ignoring unknown file type");
            }
        }

        WalkReport { files, total_bytes }
    }

    fn walk_bfs(&self, snap_root: &Path) -> WalkReport {
        let queue = WorkQueue::new();
        let files = Mutex::new(Vec::new());
        let total_bytes = AtomicU64::new(0);
        // Every worker counts as active until its first pop.
        let active = AtomicUsize::new(self.workers);

        queue.push(snap_root.to_path_buf());

        std::thread::scope(|scope| {
            for _ in 0..self.workers {
                scope.spawn(|| {
                    self.bfs_worker(&queue, snap_root, &files, &total_bytes, &active);
                });
            }
        });

        WalkReport {
            files: files.into_inner().unwrap(),
            total_bytes: total_bytes.into_inner(),
        }
    }

    fn bfs_worker(
        &self,
        queue: &WorkQueue<PathBuf>,
        snap_root: &Path,
        files: &Mutex<Vec<PathBuf>>,
        total_bytes: &AtomicU64,
        active: &AtomicUsize,
    ) {
        while let Some(node) = queue.pop(active) {
            let meta = match fs::symlink_metadata(&node) {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(path = %node.display(), error = %e, "Cannot stat entry");
                    continue;
                }
            };

            let file_type = meta.file_type();
            if file_type.is_dir() {
                let entries = match fs::read_dir(&node) {
                    Ok(it) => it,
                    Err(e) => {
                        tracing::warn!(dir = %node.display(), error = %e, "Skipping unreadable subtree");
                        continue;
                    }
                };
                for child in entries {
                    match child {
                        Ok(child) => {
                            let path = child.path();
                            if !self.filter.ignore(&path, self.freshness) {
                                queue.push(path);
                            }
                        }
                        Err(e) => {
                            tracing::warn!(dir = %node.display(), error = %e, "Error reading directory entry")
                        }
                    }
                }
            } else if file_type.is_file() {
                total_bytes.fetch_add(meta.len(), Ordering::Relaxed);
                files.lock().unwrap().push(rewrite_path(snap_root, &node));
            } else if file_type.is_symlink() {
                files
                    .lock()
                    .unwrap()
                    .push(rewrite_symlink_path(snap_root, &node));
            } else {
                tracing::debug!(path = %node.display(), "Ignoring unknown file type");
            }
        }
    }
}

/// Rewrite `path` as `<snap_root>/./<relative remainder>`.
fn rewrite_path(snap_root: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix(snap_root) {
        Ok(rel) => snap_root.join(".").join(rel),
        Err(_) => path.to_path_buf(),
    }
}

/// Symlink variant: the basename is joined onto the parent's relative
/// path so the link target is never resolved while computing the
/// remainder.
fn rewrite_symlink_path(snap_root: &Path, path: &Path) -> PathBuf {
    let parent_rel = path
        .parent()
        .and_then(|p| p.strip_prefix(snap_root).ok())
        .unwrap_or_else(|| Path::new(""));

    let mut rewritten = snap_root.join(".").join(parent_rel);
    if let Some(name) = path.file_name() {
        rewritten.push(name);
    }
    rewritten
}
