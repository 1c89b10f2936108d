// georepd - main.rs
//
// Binary entry point. Handles:
// 1. CLI argument parsing
// 2. Configuration loading and CLI overrides
// 3. Logging initialisation (debug mode support)
// 4. Wiring the watermark cell, filter, snapshotter and syncer into
//    the poll loop

use clap::Parser;
use georepd::app::poller::Poller;
use georepd::app::snapshot::SnapDirSnapshots;
use georepd::app::syncer::ProcessSyncer;
use georepd::app::watermark::WatermarkCell;
use georepd::core::filter::Filter;
use georepd::platform::attr::FsRctimeSource;
use georepd::platform::config::{self, PlatformPaths};
use georepd::util::{constants, logging};
use std::path::PathBuf;
use std::process::ExitCode;

/// georepd - geo-replication daemon for filesystems with a recursive
/// change-time attribute.
///
/// Polls the watched tree for changes, crawls a snapshot for files
/// newer than the last successful sync, and hands them to an external
/// transfer tool.
#[derive(Parser, Debug)]
#[command(name = "georepd", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Seed mode: treat every file under the watched tree as new,
    /// run one pass, then exit.
    #[arg(short = 's', long = "seed")]
    seed: bool,

    /// Dry run: discover and log changes without transferring data or
    /// advancing the watermark.
    #[arg(short = 'n', long = "dry-run")]
    dry_run: bool,

    /// Override the configured worker thread count (1 = depth-first).
    #[arg(short = 't', long = "threads")]
    threads: Option<usize>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let paths = PlatformPaths::resolve();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| paths.config_dir.join(constants::CONFIG_FILE_NAME));

    let mut config = match config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(threads) = cli.threads {
        config.threads = threads;
    }
    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    logging::init(cli.debug, config.log_level.as_deref());
    tracing::info!(
        version = constants::APP_VERSION,
        config = %config_path.display(),
        seed = cli.seed,
        dry_run = cli.dry_run,
        "georepd starting"
    );

    let watermark_path = config
        .last_rctime_path
        .clone()
        .unwrap_or_else(|| paths.data_dir.join(constants::WATERMARK_FILE_NAME));
    let watermark = WatermarkCell::load(watermark_path, Box::new(FsRctimeSource));

    let filter = Filter::new(
        config.ignore_hidden,
        config.ignore_win_lock,
        config.ignore_vim_swap,
        &config.exclude_patterns,
    );
    let snapshots = SnapDirSnapshots::new(config.base_path.clone());
    let destination = ProcessSyncer::construct_destination(
        &config.remote_user,
        &config.remote_host,
        &config.remote_directory,
    );
    let syncer = ProcessSyncer::new(config.exec_bin.clone(), &config.exec_flags, destination);

    let mut poller = Poller::new(
        config,
        watermark,
        Box::new(snapshots),
        filter,
        Box::new(syncer),
    );
    match poller.run(cli.seed, cli.dry_run) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
