// georepd - app/poller.rs
//
// The poll loop driving a replication cycle:
// detect → snapshot → settle → walk → hand off → advance watermark.
//
// The watermark advances only after the transfer process returns
// success, and never on a dry run. Anything that goes wrong inside a
// cycle (snapshot creation, transfer) leaves the watermark untouched so
// the next cycle replays the same changes; only a missing attribute on
// the watched root itself aborts the daemon.

use crate::app::snapshot::Snapshotter;
use crate::app::syncer::Syncer;
use crate::app::watermark::WatermarkCell;
use crate::core::filter::Filter;
use crate::core::rctime::Rctime;
use crate::core::walker::Walker;
use crate::platform::config::Config;
use crate::util::constants::WATERMARK_FLUSH_PERIOD_S;
use crate::util::logging::format_bytes;
use std::thread;
use std::time::{Duration, Instant};

/// Observable result of one cycle, for logging and tests.
#[derive(Debug)]
pub struct CycleOutcome {
    /// Whether the tree's rctime had moved past the watermark.
    pub changed: bool,
    /// Number of files handed to (or, on a dry run, withheld from) the
    /// syncer.
    pub files: usize,
    /// Byte total of the regular files on the list.
    pub total_bytes: u64,
    /// Whether the in-memory watermark advanced.
    pub advanced: bool,
}

impl CycleOutcome {
    fn unchanged() -> Self {
        Self {
            changed: false,
            files: 0,
            total_bytes: 0,
            advanced: false,
        }
    }
}

/// Single-threaded controller owning every per-cycle resource.
pub struct Poller {
    config: Config,
    watermark: WatermarkCell,
    snapshots: Box<dyn Snapshotter>,
    filter: Filter,
    syncer: Box<dyn Syncer>,
}

impl Poller {
    pub fn new(
        config: Config,
        watermark: WatermarkCell,
        snapshots: Box<dyn Snapshotter>,
        filter: Filter,
        syncer: Box<dyn Syncer>,
    ) -> Self {
        Self {
            config,
            watermark,
            snapshots,
            filter,
            syncer,
        }
    }

    /// The current watermark cell (read-only).
    pub fn watermark(&self) -> &WatermarkCell {
        &self.watermark
    }

    /// Run the poll loop.
    ///
    /// Steady state repeats forever on the configured period. Seed mode
    /// treats the whole tree as new and exits after one pass, flushing
    /// the watermark on the way out. Dry-run performs discovery and
    /// logging only. Seed combined with dry-run restores the cached
    /// watermark on exit and leaves no persistent trace.
    pub fn run(&mut self, seed: bool, dry_run: bool) -> crate::util::error::Result<()> {
        let sync_period = Duration::from_secs(self.config.sync_period_s);
        let flush_period = Duration::from_secs(WATERMARK_FLUSH_PERIOD_S);
        // Flush checkpoint starts at loop entry: the first durable
        // flush lands one full period after startup.
        let mut last_flush = Instant::now();

        tracing::info!(path = %self.config.base_path.display(), "Watching");

        let cached = if seed && dry_run {
            Some(self.watermark.rctime())
        } else {
            None
        };
        if seed {
            self.watermark.update(Rctime::SEED);
        }

        loop {
            let start = Instant::now();

            let outcome = self.run_cycle(dry_run)?;

            if outcome.advanced && last_flush.elapsed() >= flush_period {
                match self.watermark.flush() {
                    Ok(()) => last_flush = Instant::now(),
                    Err(e) => tracing::error!(error = %e, "Watermark flush failed"),
                }
            }

            if seed || dry_run {
                break;
            }
            // If the cycle took longer than the sync period, go again
            // immediately.
            let elapsed = start.elapsed();
            if elapsed < sync_period {
                thread::sleep(sync_period - elapsed);
            }
        }

        if let Some(old) = cached {
            // Dry seed: put the cursor back where it was.
            self.watermark.update(old);
        } else if seed {
            if let Err(e) = self.watermark.flush() {
                tracing::error!(error = %e, "Watermark flush failed");
            }
        }

        Ok(())
    }

    /// Execute one detect→walk→sync cycle.
    ///
    /// Errors returned here are fatal (the watched root cannot drive
    /// change detection); everything else is logged and absorbed.
    pub fn run_cycle(&mut self, dry_run: bool) -> crate::util::error::Result<CycleOutcome> {
        tracing::debug!("Checking for change");
        let new_rctime = match self.watermark.check_for_change(&self.config.base_path)? {
            Some(rctime) => rctime,
            None => return Ok(CycleOutcome::unchanged()),
        };
        tracing::info!(
            path = %self.config.base_path.display(),
            rctime = %new_rctime,
            changed_at = %new_rctime.to_utc().map(|t| t.to_rfc3339()).unwrap_or_default(),
            "Change detected"
        );

        let snap_path = match self.snapshots.create(new_rctime) {
            Ok(path) => path,
            Err(e) => {
                // Nothing to walk; the watermark stays put and the next
                // cycle retries.
                tracing::error!(error = %e, "Snapshot creation failed");
                return Ok(CycleOutcome {
                    changed: true,
                    files: 0,
                    total_bytes: 0,
                    advanced: false,
                });
            }
        };

        // Wait for the recursive change time to trickle to the root.
        thread::sleep(Duration::from_millis(self.config.prop_delay_ms));

        let report = Walker::new(&self.filter, &self.watermark, self.config.threads)
            .walk(&snap_path);
        tracing::info!(
            files = report.files.len(),
            size = %format_bytes(report.total_bytes),
            "New files to sync"
        );
        if tracing::enabled!(tracing::Level::DEBUG) {
            for file in &report.files {
                tracing::debug!(file = %file.display(), "Queued for sync");
            }
        }

        let files = report.files.len();
        let total_bytes = report.total_bytes;

        let mut synced = true;
        if !report.files.is_empty() {
            if dry_run {
                tracing::info!("{}", self.syncer.command_preview());
            } else if let Err(e) = self.syncer.sync(&report.files, report.total_bytes) {
                tracing::error!(error = %e, "Transfer failed; will retry next cycle");
                synced = false;
            }
        }

        // The file list dies with the report; the snapshot goes next.
        drop(report);
        if let Err(e) = self.snapshots.destroy(&snap_path) {
            tracing::error!(error = %e, "Snapshot removal failed");
        }

        let advanced = !dry_run && synced;
        if advanced {
            self.watermark.update(new_rctime);
        }

        Ok(CycleOutcome {
            changed: true,
            files,
            total_bytes,
            advanced,
        })
    }
}
