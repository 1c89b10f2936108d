// georepd - platform/config.rs
//
// Configuration loading and platform directory resolution.
// The config file is TOML; every limit references a named constant from
// `util::constants` so the bounds are auditable in one place. Platform
// default directories come from the `directories` crate.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// =============================================================================
// Platform paths
// =============================================================================

/// Resolved platform paths for georepd data and configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/georepd/).
    pub config_dir: PathBuf,

    /// Data directory holding the watermark cell by default.
    pub data_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to the current directory if platform dirs cannot be
    /// determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            Self {
                config_dir: proj_dirs.config_dir().to_path_buf(),
                data_dir: proj_dirs.data_dir().to_path_buf(),
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            let fallback = PathBuf::from(".");
            Self {
                config_dir: fallback.clone(),
                data_dir: fallback,
            }
        }
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Daemon configuration, deserialised from the TOML config file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Root of the watched directory tree.
    pub base_path: PathBuf,

    /// Location of the durable watermark cell. Defaults to the platform
    /// data directory when unset.
    #[serde(default)]
    pub last_rctime_path: Option<PathBuf>,

    /// Settling delay between snapshot creation and the walk (ms).
    #[serde(default = "default_prop_delay_ms")]
    pub prop_delay_ms: u64,

    /// Inter-cycle sync period (seconds).
    #[serde(default = "default_sync_period_s")]
    pub sync_period_s: u64,

    /// Walker worker count. 1 selects depth-first, 2+ breadth-first.
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Skip entries whose basename starts with a dot.
    #[serde(default)]
    pub ignore_hidden: bool,

    /// Skip Office owner-lock files (`~$...`).
    #[serde(default)]
    pub ignore_win_lock: bool,

    /// Skip vim swap files (`.*.swp`, `.*.swpx`).
    #[serde(default)]
    pub ignore_vim_swap: bool,

    /// Additional basename globs to skip. A matching directory is not
    /// descended into.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Transfer executable.
    #[serde(default = "default_exec_bin")]
    pub exec_bin: PathBuf,

    /// Flag string passed to the transfer executable, split on
    /// whitespace.
    #[serde(default = "default_exec_flags")]
    pub exec_flags: String,

    /// Remote login name. Empty means the current user.
    #[serde(default)]
    pub remote_user: String,

    /// Remote host. Empty selects the local-path destination variant.
    #[serde(default)]
    pub remote_host: String,

    /// Destination directory on the remote (or local) side.
    #[serde(default)]
    pub remote_directory: String,

    /// Log level, overridden by RUST_LOG and --debug.
    #[serde(default)]
    pub log_level: Option<String>,
}

/// Load and parse the config file at `path`.
///
/// Validation is separate (`Config::validate`) so CLI overrides can be
/// applied between parsing and validation.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::debug!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

impl Config {
    /// Check every bounded value against its named constant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 || self.threads > constants::MAX_WORKER_THREADS {
            return Err(ConfigError::ValueOutOfRange {
                field: "threads",
                value: self.threads.to_string(),
                expected: format!("1..={}", constants::MAX_WORKER_THREADS),
            });
        }
        if self.prop_delay_ms > constants::MAX_PROP_DELAY_MS {
            return Err(ConfigError::ValueOutOfRange {
                field: "prop_delay_ms",
                value: self.prop_delay_ms.to_string(),
                expected: format!("0..={}", constants::MAX_PROP_DELAY_MS),
            });
        }
        if self.sync_period_s < constants::MIN_SYNC_PERIOD_S
            || self.sync_period_s > constants::MAX_SYNC_PERIOD_S
        {
            return Err(ConfigError::ValueOutOfRange {
                field: "sync_period_s",
                value: self.sync_period_s.to_string(),
                expected: format!(
                    "{}..={}",
                    constants::MIN_SYNC_PERIOD_S,
                    constants::MAX_SYNC_PERIOD_S
                ),
            });
        }
        if self.remote_directory.is_empty() {
            return Err(ConfigError::ValueOutOfRange {
                field: "remote_directory",
                value: String::new(),
                expected: "a non-empty destination directory".to_string(),
            });
        }
        Ok(())
    }
}

fn default_prop_delay_ms() -> u64 {
    constants::DEFAULT_PROP_DELAY_MS
}

fn default_sync_period_s() -> u64 {
    constants::DEFAULT_SYNC_PERIOD_S
}

fn default_threads() -> usize {
    constants::DEFAULT_WORKER_THREADS
}

fn default_exec_bin() -> PathBuf {
    PathBuf::from(constants::DEFAULT_EXEC_BIN)
}

fn default_exec_flags() -> String {
    constants::DEFAULT_EXEC_FLAGS.to_string()
}
