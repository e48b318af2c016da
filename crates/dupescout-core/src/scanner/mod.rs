//! Directory traversal: walks a tree once, stats matching files, and streams
//! [`FileRecord`]s to the single collector through a bounded queue.

mod walk;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::model::FileRecord;
use crate::progress::ProgressReporter;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Instant;
use tracing::{debug, info};

/// Bounded record queue between scanner workers and the collector, capping
/// memory even on 40k+ file trees.
const RECORD_QUEUE_CAPACITY: usize = 1024;

/// Shared cooperative cancel signal. Workers poll it at every directory
/// boundary and between entries inside large directories; once raised, no
/// new work is enqueued but in-flight stats are allowed to finish.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub root: PathBuf,
    /// When false, only direct children of the root are considered.
    pub recursive: bool,
    /// Lower-cased extensions without dots; filter applies before stat work.
    pub allowed_extensions: HashSet<String>,
    /// Glob patterns excluded from traversal.
    pub ignore_patterns: Vec<String>,
    /// Matched-file interval between progress reports.
    pub progress_interval: usize,
}

impl ScanOptions {
    pub fn from_config(root: impl Into<PathBuf>, recursive: bool, config: &AppConfig) -> Self {
        Self {
            root: root.into(),
            recursive,
            allowed_extensions: config.extension_set(),
            ignore_patterns: config.ignore_patterns.clone(),
            progress_interval: config.progress_interval.max(1),
        }
    }
}

/// Everything a single traversal produced. A cancelled outcome is partial:
/// callers must not persist it as a complete report.
#[derive(Debug)]
pub struct ScanOutcome {
    pub records: Vec<FileRecord>,
    /// Every file the walk saw, matched or not.
    pub files_visited: usize,
    /// Files that passed the extension filter and were recorded.
    pub files_matched: usize,
    /// Files/directories skipped because of per-entry failures.
    pub files_skipped: usize,
    pub cancelled: bool,
}

/// Walk `options.root` once and collect records. Only root-path failures are
/// fatal; per-file failures are logged and skipped.
pub fn scan(
    options: &ScanOptions,
    reporter: &dyn ProgressReporter,
    cancel: &CancelFlag,
) -> Result<ScanOutcome> {
    let root = validate_root(options)?;
    info!("Scanning {} (recursive: {})", root.display(), options.recursive);

    reporter.on_scan_start();
    let start = Instant::now();

    let (tx, rx) = mpsc::sync_channel::<FileRecord>(RECORD_QUEUE_CAPACITY);
    let mut records: Vec<FileRecord> = Vec::new();

    let counters = thread::scope(|scope| {
        let ctx = walk::WalkContext::new(options, reporter, cancel, tx);
        ctx.seed(root.clone());
        let walk_root = root.clone();
        let walker = scope.spawn(move || {
            ctx.visit_dir(&walk_root);
            ctx.into_counters()
        });

        // Single consumer; iteration ends when the last worker sender drops.
        for record in rx.iter() {
            records.push(record);
        }

        walker.join().expect("scanner worker thread panicked")
    });

    let cancelled = cancel.is_cancelled();
    let duration = start.elapsed();
    reporter.on_scan_complete(
        counters.visited,
        counters.matched,
        cancelled,
        duration.as_secs_f64(),
    );
    debug!(
        "Scan completed in {:.2}s: {} visited, {} matched, {} skipped, cancelled: {}",
        duration.as_secs_f64(),
        counters.visited,
        counters.matched,
        counters.skipped,
        cancelled,
    );

    Ok(ScanOutcome {
        records,
        files_visited: counters.visited,
        files_matched: counters.matched,
        files_skipped: counters.skipped,
        cancelled,
    })
}

/// Root must exist, be a directory, and be readable before any traversal
/// starts. Returns the canonical root so every record path is absolute.
fn validate_root(options: &ScanOptions) -> Result<PathBuf> {
    let invalid = |source: io::Error| Error::InvalidRoot {
        path: options.root.clone(),
        source,
    };

    let metadata = fs::metadata(&options.root).map_err(invalid)?;
    if !metadata.is_dir() {
        return Err(invalid(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a directory",
        )));
    }
    fs::read_dir(&options.root).map_err(invalid)?;
    fs::canonicalize(&options.root).map_err(invalid)
}
