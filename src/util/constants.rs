// georepd - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "georepd";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "georepd";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Filesystem attribute
// =============================================================================

/// Extended attribute holding the recursive change time of a directory.
/// Maintained by the filesystem; equal to the maximum change time of any
/// descendant, the directory itself included.
pub const RCTIME_XATTR: &str = "ceph.dir.rctime";

// =============================================================================
// Snapshots
// =============================================================================

/// Directory under the watched root in which snapshots are materialised.
pub const SNAP_DIR_NAME: &str = ".snap";

/// Suffix appended to every snapshot name after the pid and rctime.
pub const SNAP_NAME_SUFFIX: &str = "snapshot";

// =============================================================================
// Polling
// =============================================================================

/// Default settling delay between snapshot creation and the walk (ms).
/// Gives the recursive change time time to propagate up the tree.
pub const DEFAULT_PROP_DELAY_MS: u64 = 100;

/// Hard upper bound on the settling delay (one minute).
pub const MAX_PROP_DELAY_MS: u64 = 60_000;

/// Default inter-cycle sync period (seconds).
pub const DEFAULT_SYNC_PERIOD_S: u64 = 10;

/// Minimum user-configurable sync period (seconds).
pub const MIN_SYNC_PERIOD_S: u64 = 1;

/// Maximum user-configurable sync period (one day).
pub const MAX_SYNC_PERIOD_S: u64 = 86_400;

// =============================================================================
// Walker
// =============================================================================

/// Default worker thread count. 1 selects the single-threaded
/// depth-first walker; 2 or more selects the parallel breadth-first
/// walker.
pub const DEFAULT_WORKER_THREADS: usize = 1;

/// Hard upper bound on the worker thread count.
pub const MAX_WORKER_THREADS: usize = 256;

// =============================================================================
// Watermark persistence
// =============================================================================

/// How often the in-memory watermark is committed to disk (seconds).
/// Bounds write amplification on the cell file; a lost flush only
/// causes re-replication of already-synced files, never skipping.
pub const WATERMARK_FLUSH_PERIOD_S: u64 = 3_600;

/// Watermark cell file name (stored in the platform data directory
/// unless `last_rctime_path` is configured).
pub const WATERMARK_FILE_NAME: &str = "last_rctime.json";

// =============================================================================
// Transfer process
// =============================================================================

/// Default transfer executable.
pub const DEFAULT_EXEC_BIN: &str = "rsync";

/// Default flags passed to the transfer executable. `--relative` makes
/// the remote side preserve directory structure from the `/./` marker
/// in each listed path.
pub const DEFAULT_EXEC_FLAGS: &str = "-a --relative";

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
