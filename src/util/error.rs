// georepd - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation; all errors preserve the causal
// chain for diagnostic logging.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all georepd operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum GeorepError {
    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// Change-time attribute access failed.
    Attr(AttrError),

    /// Watermark cell operation failed.
    Watermark(WatermarkError),

    /// Snapshot creation or removal failed.
    Snapshot(SnapshotError),

    /// The external transfer process failed.
    Sync(SyncError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for GeorepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Attr(e) => write!(f, "Attribute error: {e}"),
            Self::Watermark(e) => write!(f, "Watermark error: {e}"),
            Self::Snapshot(e) => write!(f, "Snapshot error: {e}"),
            Self::Sync(e) => write!(f, "Sync error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for GeorepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Attr(e) => Some(e),
            Self::Watermark(e) => Some(e),
            Self::Snapshot(e) => Some(e),
            Self::Sync(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: &'static str,
        value: String,
        expected: String,
    },

    /// I/O error reading the config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for GeorepError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Attribute errors
// ---------------------------------------------------------------------------

/// Errors related to change-time attribute access.
#[derive(Debug)]
pub enum AttrError {
    /// Reading the attribute (or the entry's metadata) failed.
    Read { path: PathBuf, source: io::Error },

    /// The attribute value did not parse as an rctime.
    Format { path: PathBuf, raw: String },
}

impl fmt::Display for AttrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(
                    f,
                    "Cannot read change time of '{}': {source}",
                    path.display()
                )
            }
            Self::Format { path, raw } => {
                write!(
                    f,
                    "Malformed change-time attribute on '{}': '{raw}'",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for AttrError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Format { .. } => None,
        }
    }
}

impl From<AttrError> for GeorepError {
    fn from(e: AttrError) -> Self {
        Self::Attr(e)
    }
}

// ---------------------------------------------------------------------------
// Watermark errors
// ---------------------------------------------------------------------------

/// Errors related to the watermark cell.
#[derive(Debug)]
pub enum WatermarkError {
    /// The watched root carries no recursive change-time attribute:
    /// the filesystem does not support the required feature.
    RootAttributeMissing { path: PathBuf },

    /// Attribute access on the watched root failed.
    Attr(AttrError),

    /// Writing the durable cell failed.
    Persist { path: PathBuf, source: io::Error },

    /// Serialising the cell contents failed.
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for WatermarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootAttributeMissing { path } => write!(
                f,
                "'{}' has no recursive change-time attribute; \
                 the filesystem is unsupported",
                path.display()
            ),
            Self::Attr(e) => write!(f, "{e}"),
            Self::Persist { path, source } => {
                write!(
                    f,
                    "Cannot persist watermark to '{}': {source}",
                    path.display()
                )
            }
            Self::Serialize { path, source } => {
                write!(
                    f,
                    "Cannot serialise watermark for '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for WatermarkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Attr(e) => Some(e),
            Self::Persist { source, .. } => Some(source),
            Self::Serialize { source, .. } => Some(source),
            Self::RootAttributeMissing { .. } => None,
        }
    }
}

impl From<AttrError> for WatermarkError {
    fn from(e: AttrError) -> Self {
        Self::Attr(e)
    }
}

impl From<WatermarkError> for GeorepError {
    fn from(e: WatermarkError) -> Self {
        Self::Watermark(e)
    }
}

// ---------------------------------------------------------------------------
// Snapshot errors
// ---------------------------------------------------------------------------

/// Errors related to snapshot lifecycle.
#[derive(Debug)]
pub enum SnapshotError {
    /// Creating the snapshot directory failed.
    Create { path: PathBuf, source: io::Error },

    /// Removing the snapshot directory failed. The leaked snapshot is
    /// non-fatal; the next cycle uses a distinct name.
    Remove { path: PathBuf, source: io::Error },
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create { path, source } => {
                write!(f, "Cannot create snapshot '{}': {source}", path.display())
            }
            Self::Remove { path, source } => {
                write!(f, "Cannot remove snapshot '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Create { source, .. } | Self::Remove { source, .. } => Some(source),
        }
    }
}

impl From<SnapshotError> for GeorepError {
    fn from(e: SnapshotError) -> Self {
        Self::Snapshot(e)
    }
}

// ---------------------------------------------------------------------------
// Sync errors
// ---------------------------------------------------------------------------

/// Errors related to the external transfer process.
#[derive(Debug)]
pub enum SyncError {
    /// The transfer executable could not be spawned.
    Spawn { bin: PathBuf, source: io::Error },

    /// The transfer process exited unsuccessfully. `None` means it was
    /// terminated by a signal.
    Failed { code: Option<i32> },
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn { bin, source } => {
                write!(f, "Cannot launch '{}': {source}", bin.display())
            }
            Self::Failed { code: Some(code) } => {
                write!(f, "Transfer process exited with status {code}")
            }
            Self::Failed { code: None } => {
                write!(f, "Transfer process was terminated by a signal")
            }
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn { source, .. } => Some(source),
            Self::Failed { .. } => None,
        }
    }
}

impl From<SyncError> for GeorepError {
    fn from(e: SyncError) -> Self {
        Self::Sync(e)
    }
}

/// Convenience type alias for georepd results.
pub type Result<T> = std::result::Result<T, GeorepError>;
