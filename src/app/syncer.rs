// georepd - app/syncer.rs
//
// The transfer seam. The poll loop only depends on the trait; the
// process-spawning implementation hands the file list to an external
// tool (rsync by default) as arguments. Success of the process is the
// signal that allows the watermark to advance.

use crate::util::error::SyncError;
use crate::util::logging::format_bytes;
use std::path::PathBuf;
use std::process::Command;

/// External transfer process, abstract.
pub trait Syncer {
    /// Replicate `files` to the configured destination. Returning `Ok`
    /// asserts that every file was transferred.
    fn sync(&self, files: &[PathBuf], total_bytes: u64) -> Result<(), SyncError>;

    /// The command line this syncer would run, for dry-run logging.
    fn command_preview(&self) -> String;
}

/// Spawns the configured executable with the file list as arguments.
pub struct ProcessSyncer {
    bin: PathBuf,
    flags: Vec<String>,
    destination: String,
}

impl ProcessSyncer {
    pub fn new(bin: PathBuf, flags: &str, destination: String) -> Self {
        Self {
            bin,
            flags: flags.split_whitespace().map(str::to_owned).collect(),
            destination,
        }
    }

    /// Render the destination for the transfer tool:
    /// `<user>@<host>:<directory>`, with the user and host parts
    /// dropped when unset (an empty host selects a local destination).
    pub fn construct_destination(user: &str, host: &str, directory: &str) -> String {
        if host.is_empty() {
            directory.to_string()
        } else if user.is_empty() {
            format!("{host}:{directory}")
        } else {
            format!("{user}@{host}:{directory}")
        }
    }
}

impl Syncer for ProcessSyncer {
    fn sync(&self, files: &[PathBuf], total_bytes: u64) -> Result<(), SyncError> {
        tracing::info!(
            bin = %self.bin.display(),
            files = files.len(),
            size = %format_bytes(total_bytes),
            destination = %self.destination,
            "Launching transfer"
        );

        let status = Command::new(&self.bin)
            .args(&self.flags)
            .args(files)
            .arg(&self.destination)
            .status()
            .map_err(|e| SyncError::Spawn {
                bin: self.bin.clone(),
                source: e,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(SyncError::Failed {
                code: status.code(),
            })
        }
    }

    fn command_preview(&self) -> String {
        format!(
            "{} {} <file list> {}",
            self.bin.display(),
            self.flags.join(" "),
            self.destination
        )
    }
}
