// georepd - tests/e2e_crawl.rs
//
// End-to-end tests for the detect → snapshot → walk → sync → advance
// cycle. These tests exercise the real filesystem and real walker
// threads; only the seams that need a specific filesystem are
// substituted: change times come from a deterministic source (real
// stat ctimes for files, a controllable value for directories), the
// live tree doubles as its own snapshot, and the syncer records what
// it is handed instead of spawning a transfer process.

use georepd::app::poller::Poller;
use georepd::app::snapshot::Snapshotter;
use georepd::app::syncer::Syncer;
use georepd::app::watermark::WatermarkCell;
use georepd::core::filter::Filter;
use georepd::core::rctime::Rctime;
use georepd::platform::attr::RctimeSource;
use georepd::platform::config::Config;
use georepd::util::error::{AttrError, SnapshotError, SyncError};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// =============================================================================
// Test doubles
// =============================================================================

/// One controllable recursive change time for every directory; real
/// stat ctimes for files and symlinks.
struct TreeRctime {
    tree: Arc<Mutex<Rctime>>,
}

impl TreeRctime {
    fn new(rctime: Rctime) -> (Self, Arc<Mutex<Rctime>>) {
        let tree = Arc::new(Mutex::new(rctime));
        (Self { tree: Arc::clone(&tree) }, tree)
    }
}

impl RctimeSource for TreeRctime {
    fn dir_rctime(&self, _path: &Path) -> Result<Option<Rctime>, AttrError> {
        Ok(Some(*self.tree.lock().unwrap()))
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

/// The live tree doubles as its own snapshot.
struct LiveTreeSnapshots {
    root: PathBuf,
}

impl Snapshotter for LiveTreeSnapshots {
    fn create(&self, _rctime: Rctime) -> Result<PathBuf, SnapshotError> {
        Ok(self.root.clone())
    }

    fn destroy(&self, _path: &Path) -> Result<(), SnapshotError> {
        Ok(())
    }
}

/// Records every file list it is handed; optionally reports failure.
struct RecordingSyncer {
    calls: Arc<Mutex<Vec<Vec<PathBuf>>>>,
    fail: Arc<Mutex<bool>>,
}

impl Syncer for RecordingSyncer {
    fn sync(&self, files: &[PathBuf], _total_bytes: u64) -> Result<(), SyncError> {
        self.calls.lock().unwrap().push(files.to_vec());
        if *self.fail.lock().unwrap() {
            Err(SyncError::Failed { code: Some(23) })
        } else {
            Ok(())
        }
    }

    fn command_preview(&self) -> String {
        "test-syncer <file list> geo@mirror:/srv".to_string()
    }
}

// =============================================================================
// Harness
// =============================================================================

struct Harness {
    poller: Poller,
    calls: Arc<Mutex<Vec<Vec<PathBuf>>>>,
    fail: Arc<Mutex<bool>>,
    tree_rctime: Arc<Mutex<Rctime>>,
    watermark_file: PathBuf,
}

/// Wire a poller over `root` with the watermark at `watermark` and the
/// tree's recursive change time at `tree_rctime`.
fn harness(
    root: &Path,
    state_dir: &Path,
    watermark: Rctime,
    tree_rctime: Rctime,
    threads: usize,
    ignore_hidden: bool,
) -> Harness {
    let config = Config {
        base_path: root.to_path_buf(),
        last_rctime_path: None,
        prop_delay_ms: 0,
        sync_period_s: 1,
        threads,
        ignore_hidden,
        ignore_win_lock: false,
        ignore_vim_swap: false,
        exclude_patterns: Vec::new(),
        exec_bin: PathBuf::from("rsync"),
        exec_flags: "-a --relative".to_string(),
        remote_user: "geo".to_string(),
        remote_host: "mirror".to_string(),
        remote_directory: "/srv".to_string(),
        log_level: None,
    };

    let (attrs, tree_handle) = TreeRctime::new(tree_rctime);
    let watermark_file = state_dir.join("last_rctime.json");
    let mut cell = WatermarkCell::load(watermark_file.clone(), Box::new(attrs));
    cell.update(watermark);

    let filter = Filter::new(ignore_hidden, false, false, &[]);
    let calls = Arc::new(Mutex::new(Vec::new()));
    let fail = Arc::new(Mutex::new(false));
    let syncer = RecordingSyncer {
        calls: Arc::clone(&calls),
        fail: Arc::clone(&fail),
    };
    let snapshots = LiveTreeSnapshots {
        root: root.to_path_buf(),
    };

    Harness {
        poller: Poller::new(config, cell, Box::new(snapshots), filter, Box::new(syncer)),
        calls,
        fail,
        tree_rctime: tree_handle,
        watermark_file,
    }
}

fn recorded_set(calls: &Arc<Mutex<Vec<Vec<PathBuf>>>>, index: usize) -> BTreeSet<PathBuf> {
    calls.lock().unwrap()[index].iter().cloned().collect()
}

// =============================================================================
// Scenarios
// =============================================================================

/// No change: the tree's rctime equals the stored watermark.
#[test]
fn e2e_unchanged_tree_produces_no_work() {
    let dir = TempDir::new().expect("tempdir");
    let state = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("old.txt"), "old").expect("write");

    let mut h = harness(
        dir.path(),
        state.path(),
        Rctime::new(100, 0),
        Rctime::new(100, 0),
        1,
        false,
    );

    let outcome = h.poller.run_cycle(false).expect("cycle");
    assert!(!outcome.changed);
    assert!(!outcome.advanced);
    assert!(h.calls.lock().unwrap().is_empty(), "syncer must not run");
    assert_eq!(h.poller.watermark().rctime(), Rctime::new(100, 0));
}

/// A single new file is listed with the /./ marker, its size is
/// accounted, and success advances the watermark to the observed
/// rctime.
#[test]
fn e2e_single_new_file_synced_and_watermark_advanced() {
    let dir = TempDir::new().expect("tempdir");
    let state = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("a.txt"), "hello").expect("write");

    let mut h = harness(
        dir.path(),
        state.path(),
        Rctime::new(100, 0),
        Rctime::new(200, 0),
        1,
        false,
    );

    let outcome = h.poller.run_cycle(false).expect("cycle");
    assert!(outcome.changed);
    assert_eq!(outcome.files, 1);
    assert_eq!(outcome.total_bytes, 5);
    assert!(outcome.advanced);

    let expected: BTreeSet<PathBuf> = [dir.path().join(".").join("a.txt")].into_iter().collect();
    assert_eq!(recorded_set(&h.calls, 0), expected);
    assert_eq!(h.poller.watermark().rctime(), Rctime::new(200, 0));
}

/// A hidden file never reaches the syncer, but the watermark still
/// advances to the root rctime: the change is accounted for, not lost.
#[test]
fn e2e_hidden_file_skipped_watermark_still_advances() {
    let dir = TempDir::new().expect("tempdir");
    let state = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("visible.txt"), "shown").expect("write");
    fs::write(dir.path().join(".secret"), "hidden").expect("write");

    let mut h = harness(
        dir.path(),
        state.path(),
        Rctime::new(100, 0),
        Rctime::new(200, 0),
        1,
        true,
    );

    let outcome = h.poller.run_cycle(false).expect("cycle");
    assert_eq!(outcome.files, 1);

    let listed = recorded_set(&h.calls, 0);
    assert!(listed.contains(&dir.path().join(".").join("visible.txt")));
    assert!(!listed.iter().any(|p| p.ends_with(".secret")));
    assert_eq!(h.poller.watermark().rctime(), Rctime::new(200, 0));
}

/// The breadth-first walker hands the syncer the same path set as the
/// depth-first walker.
#[test]
fn e2e_bfs_and_dfs_list_the_same_files() {
    let dir = TempDir::new().expect("tempdir");
    let state = TempDir::new().expect("tempdir");
    for d in 0..3 {
        let sub = dir.path().join(format!("dir{d}"));
        fs::create_dir(&sub).expect("mkdir");
        for f in 0..5 {
            fs::write(sub.join(format!("file{f}.dat")), format!("{d}/{f}")).expect("write");
        }
    }

    let mut dfs = harness(
        dir.path(),
        state.path(),
        Rctime::new(100, 0),
        Rctime::new(200, 0),
        1,
        false,
    );
    let mut bfs = harness(
        dir.path(),
        state.path(),
        Rctime::new(100, 0),
        Rctime::new(200, 0),
        4,
        false,
    );

    let dfs_outcome = dfs.poller.run_cycle(false).expect("dfs cycle");
    let bfs_outcome = bfs.poller.run_cycle(false).expect("bfs cycle");

    assert_eq!(dfs_outcome.files, 15);
    assert_eq!(bfs_outcome.files, 15);
    assert_eq!(recorded_set(&dfs.calls, 0), recorded_set(&bfs.calls, 0));
    assert_eq!(dfs_outcome.total_bytes, bfs_outcome.total_bytes);
}

/// A failed transfer leaves the watermark untouched and the next cycle
/// re-lists the same file.
#[test]
fn e2e_syncer_failure_replays_next_cycle() {
    let dir = TempDir::new().expect("tempdir");
    let state = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("a.txt"), "hello").expect("write");

    let mut h = harness(
        dir.path(),
        state.path(),
        Rctime::new(100, 0),
        Rctime::new(200, 0),
        1,
        false,
    );

    *h.fail.lock().unwrap() = true;
    let outcome = h.poller.run_cycle(false).expect("cycle");
    assert!(outcome.changed);
    assert!(!outcome.advanced, "failure must not advance the watermark");
    assert_eq!(h.poller.watermark().rctime(), Rctime::new(100, 0));

    // Transfer recovers: the same file is handed over again and the
    // watermark finally advances.
    *h.fail.lock().unwrap() = false;
    let retry = h.poller.run_cycle(false).expect("retry cycle");
    assert!(retry.advanced);
    assert_eq!(recorded_set(&h.calls, 0), recorded_set(&h.calls, 1));
    assert_eq!(h.poller.watermark().rctime(), Rctime::new(200, 0));
}

/// Dry run: discovery happens, the syncer is never invoked, and the
/// watermark does not move.
#[test]
fn e2e_dry_run_discovers_without_side_effects() {
    let dir = TempDir::new().expect("tempdir");
    let state = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("a.txt"), "hello").expect("write");

    let mut h = harness(
        dir.path(),
        state.path(),
        Rctime::new(100, 0),
        Rctime::new(200, 0),
        1,
        false,
    );

    let outcome = h.poller.run_cycle(true).expect("cycle");
    assert!(outcome.changed);
    assert_eq!(outcome.files, 1);
    assert!(!outcome.advanced);
    assert!(h.calls.lock().unwrap().is_empty());
    assert_eq!(h.poller.watermark().rctime(), Rctime::new(100, 0));
}

/// Seed + dry-run walks the whole tree and leaves the persisted
/// watermark byte-identical.
#[test]
fn e2e_seed_dry_run_leaves_no_trace() {
    let dir = TempDir::new().expect("tempdir");
    let state = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("a.txt"), "alpha").expect("write");
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).expect("mkdir");
    fs::write(sub.join("b.txt"), "bravo").expect("write");

    let mut h = harness(
        dir.path(),
        state.path(),
        Rctime::new(500, 0),
        Rctime::new(550, 0),
        1,
        false,
    );
    // Persist the pre-run watermark so purity is observable on disk.
    h.poller.watermark().flush().expect("flush");
    let before = fs::read(&h.watermark_file).expect("read cell");

    h.poller.run(true, true).expect("seed dry run");

    assert_eq!(
        h.poller.watermark().rctime(),
        Rctime::new(500, 0),
        "in-memory watermark must be restored"
    );
    let after = fs::read(&h.watermark_file).expect("read cell");
    assert_eq!(before, after, "persisted watermark must be byte-identical");
    assert!(h.calls.lock().unwrap().is_empty(), "dry run must not sync");
}

/// Seed without dry-run lists every file (the sentinel makes the whole
/// tree "new") and flushes the advanced watermark on exit.
#[test]
fn e2e_seed_run_syncs_everything_and_persists() {
    let dir = TempDir::new().expect("tempdir");
    let state = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("a.txt"), "alpha").expect("write");
    fs::write(dir.path().join("b.txt"), "bravo").expect("write");

    let mut h = harness(
        dir.path(),
        state.path(),
        Rctime::new(500, 0),
        Rctime::new(550, 0),
        2,
        false,
    );

    h.poller.run(true, false).expect("seed run");

    assert_eq!(recorded_set(&h.calls, 0).len(), 2);
    assert_eq!(h.poller.watermark().rctime(), Rctime::new(550, 0));

    // The advanced watermark survives a reload from disk.
    let (attrs, _) = TreeRctime::new(Rctime::new(550, 0));
    let reloaded = WatermarkCell::load(h.watermark_file.clone(), Box::new(attrs));
    assert_eq!(reloaded.rctime(), Rctime::new(550, 0));
}

/// Growing the tree across cycles: every successful cycle moves the
/// watermark forward, never back.
#[test]
fn e2e_watermark_is_monotonic_across_cycles() {
    let dir = TempDir::new().expect("tempdir");
    let state = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("first.txt"), "1").expect("write");

    let mut h = harness(
        dir.path(),
        state.path(),
        Rctime::new(100, 0),
        Rctime::new(200, 0),
        1,
        false,
    );

    let first = h.poller.run_cycle(false).expect("cycle 1");
    assert!(first.advanced);
    let after_first = h.poller.watermark().rctime();
    assert!(after_first >= Rctime::new(100, 0));

    // The tree moves forward again.
    fs::write(dir.path().join("second.txt"), "2").expect("write");
    *h.tree_rctime.lock().unwrap() = Rctime::new(300, 0);

    let second = h.poller.run_cycle(false).expect("cycle 2");
    assert!(second.advanced);
    assert!(h.poller.watermark().rctime() >= after_first);
    assert_eq!(h.poller.watermark().rctime(), Rctime::new(300, 0));
}
