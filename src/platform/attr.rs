// georepd - platform/attr.rs
//
// Change-time attribute access.
//
// Directories carry a recursive change time in an extended attribute;
// regular files and symlinks use the stat change time. The trait seam
// lets tests substitute a deterministic source, so the crawl engine can
// be exercised on filesystems that do not maintain the attribute.

use crate::core::rctime::Rctime;
use crate::util::constants::RCTIME_XATTR;
use crate::util::error::AttrError;
use std::fs;
use std::path::Path;

/// Source of change times for the watermark cell.
pub trait RctimeSource: Send + Sync {
    /// Recursive change time of a directory. `Ok(None)` when the
    /// attribute is absent.
    fn dir_rctime(&self, path: &Path) -> Result<Option<Rctime>, AttrError>;

    /// Change time of a non-directory entry. Never follows symlinks.
    fn entry_ctime(&self, path: &Path) -> Result<Rctime, AttrError>;
}

/// Reads the recursive change time maintained by the filesystem.
pub struct FsRctimeSource;

impl RctimeSource for FsRctimeSource {
    fn dir_rctime(&self, path: &Path) -> Result<Option<Rctime>, AttrError> {
        let value = xattr::get(path, RCTIME_XATTR).map_err(|e| AttrError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let Some(bytes) = value else {
            return Ok(None);
        };

        let text = String::from_utf8_lossy(&bytes);
        let rctime = Rctime::parse(&text).map_err(|_| AttrError::Format {
            path: path.to_path_buf(),
            raw: text.trim_end_matches('\0').to_string(),
        })?;
        Ok(Some(rctime))
    }

    fn entry_ctime(&self, path: &Path) -> Result<Rctime, AttrError> {
        use std::os::unix::fs::MetadataExt;

        let meta = fs::symlink_metadata(path).map_err(|e| AttrError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Rctime::new(meta.ctime(), meta.ctime_nsec() as u32))
    }
}
