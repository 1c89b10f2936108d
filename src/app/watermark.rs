// georepd - app/watermark.rs
//
// The watermark cell: the rctime below which (or equal to which) every
// change is considered already replicated.
//
// Design principles:
// - The in-memory value is authoritative; the durable cell trails it
//   (flushes are throttled by the poll loop).
// - The cell is saved atomically (write→temp, rename→final) so a crash
//   during save never corrupts the previous good value.
// - Load errors degrade to the seed sentinel: a watermark that is too
//   old re-replicates files, a watermark that is too new loses them.

use crate::core::filter::Freshness;
use crate::core::rctime::Rctime;
use crate::platform::attr::RctimeSource;
use crate::util::error::WatermarkError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Version stamp for forward-compatibility checks.
///
/// Increment whenever `WatermarkFile` changes shape in a breaking way.
/// Version mismatches discard the stored value.
pub const WATERMARK_VERSION: u32 = 1;

/// On-disk form of the cell.
#[derive(Debug, Serialize, Deserialize)]
struct WatermarkFile {
    version: u32,
    sec: i64,
    nsec: u32,
}

/// Durable cursor over the watched tree's change history.
pub struct WatermarkCell {
    current: Rctime,
    path: PathBuf,
    attrs: Box<dyn RctimeSource>,
}

impl WatermarkCell {
    /// Load the cell from `path`, falling back to the seed sentinel
    /// when the file is missing, malformed, or of a foreign version.
    pub fn load(path: PathBuf, attrs: Box<dyn RctimeSource>) -> Self {
        let current = read_cell(&path).unwrap_or(Rctime::SEED);
        tracing::info!(
            path = %path.display(),
            rctime = %current,
            "Watermark loaded"
        );
        Self {
            current,
            path,
            attrs,
        }
    }

    /// The current in-memory watermark.
    pub fn rctime(&self) -> Rctime {
        self.current
    }

    /// Replace the in-memory watermark. Does not flush.
    pub fn update(&mut self, new: Rctime) {
        self.current = new;
    }

    /// Commit the in-memory watermark to durable storage.
    pub fn flush(&self) -> Result<(), WatermarkError> {
        let data = WatermarkFile {
            version: WATERMARK_VERSION,
            sec: self.current.sec,
            nsec: self.current.nsec,
        };
        let json = serde_json::to_string_pretty(&data).map_err(|e| WatermarkError::Serialize {
            path: self.path.clone(),
            source: e,
        })?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| WatermarkError::Persist {
                path: self.path.clone(),
                source: e,
            })?;
        }

        // Atomic write: write to a sibling temp file then rename.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json.as_bytes()).map_err(|e| WatermarkError::Persist {
            path: tmp.clone(),
            source: e,
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            WatermarkError::Persist {
                path: self.path.clone(),
                source: e,
            }
        })?;

        tracing::debug!(path = %self.path.display(), rctime = %self.current, "Watermark flushed");
        Ok(())
    }

    /// Read the recursive change time of the watched root and compare
    /// it against the watermark. Returns the new rctime when the tree
    /// changed. A root without the attribute is fatal: the filesystem
    /// cannot drive change detection.
    pub fn check_for_change(&self, root: &Path) -> Result<Option<Rctime>, WatermarkError> {
        match self.attrs.dir_rctime(root) {
            Ok(Some(rctime)) if rctime > self.current => Ok(Some(rctime)),
            Ok(Some(_)) => Ok(None),
            Ok(None) => Err(WatermarkError::RootAttributeMissing {
                path: root.to_path_buf(),
            }),
            Err(e) => Err(WatermarkError::Attr(e)),
        }
    }

    /// Whether `path` changed after the watermark. Directories use the
    /// recursive attribute; files and symlinks use the stat change
    /// time. A descendant without the attribute reads as "not newer".
    pub fn is_newer(&self, path: &Path) -> bool {
        let meta = match fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Cannot classify entry");
                return false;
            }
        };

        let change_time = if meta.is_dir() {
            match self.attrs.dir_rctime(path) {
                Ok(Some(rctime)) => rctime,
                Ok(None) => return false,
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "Attribute read failed");
                    return false;
                }
            }
        } else {
            match self.attrs.entry_ctime(path) {
                Ok(ctime) => ctime,
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "Cannot stat entry");
                    return false;
                }
            }
        };

        change_time > self.current
    }
}

impl Freshness for WatermarkCell {
    fn is_newer(&self, path: &Path) -> bool {
        WatermarkCell::is_newer(self, path)
    }
}

/// Load and validate the stored rctime. `None` means "start from the
/// seed sentinel".
fn read_cell(path: &Path) -> Option<Rctime> {
    let content = fs::read_to_string(path)
        .map_err(|e| {
            // "Not found" is the normal first run.
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "Cannot read watermark file");
            }
        })
        .ok()?;

    let data: WatermarkFile = serde_json::from_str(&content)
        .map_err(|e| {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Watermark file is malformed — seeding everything"
            );
        })
        .ok()?;

    if data.version != WATERMARK_VERSION {
        tracing::warn!(
            found = data.version,
            expected = WATERMARK_VERSION,
            "Watermark file version mismatch — seeding everything"
        );
        return None;
    }

    Some(Rctime::new(data.sec, data.nsec))
}
