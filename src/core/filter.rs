// georepd - core/filter.rs
//
// Candidate filter: decides which directory entries take part in a
// cycle. Name-based rules run first; the freshness test runs last
// because it costs an attribute read per entry. Ignoring a directory
// prunes its whole subtree; ignoring a file skips that file.

use glob::Pattern;
use std::path::Path;

/// Freshness oracle consulted by the filter and the walker.
///
/// Implemented by the watermark cell; abstract here so the crawl engine
/// can be exercised without a filesystem that carries the attribute.
pub trait Freshness: Sync {
    /// Whether the entry changed after the current watermark.
    fn is_newer(&self, path: &Path) -> bool;
}

/// Name- and freshness-based entry filter.
#[derive(Debug)]
pub struct Filter {
    ignore_hidden: bool,
    ignore_win_lock: bool,
    ignore_vim_swap: bool,
    exclude: Vec<Pattern>,
}

impl Filter {
    /// Build a filter from the configured toggles and exclude globs.
    /// Patterns that fail to compile are logged and skipped.
    pub fn new(
        ignore_hidden: bool,
        ignore_win_lock: bool,
        ignore_vim_swap: bool,
        exclude_patterns: &[String],
    ) -> Self {
        let exclude = exclude_patterns
            .iter()
            .filter_map(|p| match Pattern::new(p) {
                Ok(compiled) => Some(compiled),
                Err(e) => {
                    tracing::warn!(pattern = p, error = %e, "Invalid exclude pattern, skipping");
                    None
                }
            })
            .collect();

        Self {
            ignore_hidden,
            ignore_win_lock,
            ignore_vim_swap,
            exclude,
        }
    }

    /// Whether `path` is excluded from the current cycle.
    ///
    /// The freshness test MUST stay the last predicate evaluated.
    pub fn ignore<F: Freshness>(&self, path: &Path, freshness: &F) -> bool {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if self.ignore_hidden && name.starts_with('.') {
                return true;
            }
            if self.ignore_win_lock && name.starts_with("~$") {
                return true;
            }
            if self.ignore_vim_swap && name.starts_with('.') {
                if let Some("swp" | "swpx") = path.extension().and_then(|e| e.to_str()) {
                    return true;
                }
            }
            if self.exclude.iter().any(|p| p.matches(name)) {
                return true;
            }
        }

        !freshness.is_newer(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Everything is newer than the watermark.
    struct AlwaysFresh;
    impl Freshness for AlwaysFresh {
        fn is_newer(&self, _path: &Path) -> bool {
            true
        }
    }

    /// Nothing is newer than the watermark.
    struct NeverFresh;
    impl Freshness for NeverFresh {
        fn is_newer(&self, _path: &Path) -> bool {
            false
        }
    }

    fn p(name: &str) -> PathBuf {
        PathBuf::from("/base").join(name)
    }

    #[test]
    fn test_hidden_files_ignored_when_toggled() {
        let on = Filter::new(true, false, false, &[]);
        let off = Filter::new(false, false, false, &[]);

        assert!(on.ignore(&p(".secret"), &AlwaysFresh));
        assert!(!on.ignore(&p("visible.txt"), &AlwaysFresh));
        assert!(!off.ignore(&p(".secret"), &AlwaysFresh));
    }

    #[test]
    fn test_windows_lock_files_ignored_when_toggled() {
        let filter = Filter::new(false, true, false, &[]);

        assert!(filter.ignore(&p("~$report.docx"), &AlwaysFresh));
        assert!(!filter.ignore(&p("report.docx"), &AlwaysFresh));
    }

    #[test]
    fn test_vim_swap_files_ignored_when_toggled() {
        let filter = Filter::new(false, false, true, &[]);

        assert!(filter.ignore(&p(".notes.txt.swp"), &AlwaysFresh));
        assert!(filter.ignore(&p(".notes.txt.swpx"), &AlwaysFresh));
        // Requires both the leading dot and the swap extension.
        assert!(!filter.ignore(&p("notes.txt.swp"), &AlwaysFresh));
        assert!(!filter.ignore(&p(".notes.txt"), &AlwaysFresh));
    }

    #[test]
    fn test_exclude_patterns_match_basename() {
        let filter = Filter::new(false, false, false, &["*.tmp".to_string()]);

        assert!(filter.ignore(&p("scratch.tmp"), &AlwaysFresh));
        assert!(!filter.ignore(&p("scratch.txt"), &AlwaysFresh));
    }

    #[test]
    fn test_stale_entries_ignored_regardless_of_name() {
        let filter = Filter::new(false, false, false, &[]);

        assert!(filter.ignore(&p("anything.txt"), &NeverFresh));
        assert!(!filter.ignore(&p("anything.txt"), &AlwaysFresh));
    }

    #[test]
    fn test_name_rules_short_circuit_before_freshness() {
        /// Freshness oracle that records whether it was consulted.
        struct Tripwire(std::sync::atomic::AtomicBool);
        impl Freshness for Tripwire {
            fn is_newer(&self, _path: &Path) -> bool {
                self.0.store(true, std::sync::atomic::Ordering::SeqCst);
                true
            }
        }

        let filter = Filter::new(true, false, false, &[]);
        let tripwire = Tripwire(std::sync::atomic::AtomicBool::new(false));

        assert!(filter.ignore(&p(".hidden"), &tripwire));
        assert!(
            !tripwire.0.load(std::sync::atomic::Ordering::SeqCst),
            "name-ignored entry must not pay for an attribute read"
        );
    }
}
