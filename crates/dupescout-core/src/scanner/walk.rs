use super::{CancelFlag, ScanOptions};
use crate::model::FileRecord;
use crate::progress::ProgressReporter;
use chrono::{DateTime, Utc};
use dashmap::DashSet;
use glob::Pattern;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::SyncSender;
use tracing::{error, warn};

pub(super) struct Counters {
    pub visited: usize,
    pub matched: usize,
    pub skipped: usize,
}

/// Per-scan traversal state shared by the rayon workers.
pub(super) struct WalkContext<'a> {
    recursive: bool,
    allowed: &'a HashSet<String>,
    ignore: Vec<Pattern>,
    progress_interval: usize,
    cancel: &'a CancelFlag,
    reporter: &'a dyn ProgressReporter,
    /// Canonical paths already entered. Guards symlink cycles: each real
    /// path is followed at most once per traversal.
    visited_real: DashSet<PathBuf>,
    files_visited: AtomicUsize,
    files_matched: AtomicUsize,
    files_skipped: AtomicUsize,
    tx: SyncSender<FileRecord>,
}

impl<'a> WalkContext<'a> {
    pub(super) fn new(
        options: &'a ScanOptions,
        reporter: &'a dyn ProgressReporter,
        cancel: &'a CancelFlag,
        tx: SyncSender<FileRecord>,
    ) -> Self {
        let ignore = options
            .ignore_patterns
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid glob pattern '{}': {}", glob, e);
                    None
                }
            })
            .collect();

        Self {
            recursive: options.recursive,
            allowed: &options.allowed_extensions,
            ignore,
            progress_interval: options.progress_interval.max(1),
            cancel,
            reporter,
            visited_real: DashSet::new(),
            files_visited: AtomicUsize::new(0),
            files_matched: AtomicUsize::new(0),
            files_skipped: AtomicUsize::new(0),
            tx,
        }
    }

    /// Mark a real path as already entered (used for the canonical root).
    pub(super) fn seed(&self, real: PathBuf) {
        self.visited_real.insert(real);
    }

    pub(super) fn into_counters(self) -> Counters {
        Counters {
            visited: self.files_visited.into_inner(),
            matched: self.files_matched.into_inner(),
            skipped: self.files_skipped.into_inner(),
        }
    }

    pub(super) fn visit_dir(&self, dir: &Path) {
        // Cancellation is polled at every directory boundary.
        if self.cancel.is_cancelled() {
            return;
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("skipping unreadable directory {}: {}", dir.display(), err);
                self.files_skipped.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };

        entries.par_bridge().for_each(|entry_result| {
            // Per-entry poll bounds cancellation latency in huge directories.
            if self.cancel.is_cancelled() {
                return;
            }

            let entry = match entry_result {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("skipping entry in {}: {}", dir.display(), err);
                    self.files_skipped.fetch_add(1, Ordering::Relaxed);
                    return;
                }
            };
            self.process_entry(&entry);
        });
    }

    fn process_entry(&self, entry: &fs::DirEntry) {
        let path = entry.path();

        if self.ignore.iter().any(|p| p.matches_path(&path)) {
            return;
        }

        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(err) => {
                warn!("skipping {}: {}", path.display(), err);
                self.files_skipped.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };
        let is_symlink = file_type.is_symlink();

        if file_type.is_dir() || (is_symlink && path.is_dir()) {
            if !self.recursive {
                return;
            }
            match fs::canonicalize(&path) {
                Ok(real) => {
                    if self.visited_real.insert(real) {
                        self.visit_dir(&path);
                    }
                }
                Err(err) => {
                    warn!("skipping directory {}: {}", path.display(), err);
                    self.files_skipped.fetch_add(1, Ordering::Relaxed);
                }
            }
            return;
        }

        self.files_visited.fetch_add(1, Ordering::Relaxed);

        // Extension filter runs before any stat work to bound I/O.
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        if !self.allowed.contains(&extension) {
            return;
        }

        if is_symlink {
            // A file reached through a link is recorded once per real path.
            match fs::canonicalize(&path) {
                Ok(real) => {
                    if !self.visited_real.insert(real) {
                        return;
                    }
                }
                Err(err) => {
                    warn!("skipping {}: {}", path.display(), err);
                    self.files_skipped.fetch_add(1, Ordering::Relaxed);
                    return;
                }
            }
        }

        let metadata = match fs::metadata(&path) {
            Ok(m) => m,
            Err(err) => {
                // Vanished or unreadable; never aborts the scan.
                warn!("skipping {}: {}", path.display(), err);
                self.files_skipped.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };
        if !metadata.is_file() {
            return;
        }

        let modified_at = match metadata.modified() {
            Ok(t) => DateTime::<Utc>::from(t),
            Err(err) => {
                warn!("skipping {} (no modified time): {}", path.display(), err);
                self.files_skipped.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };
        let created_at = metadata.created().ok().map(DateTime::<Utc>::from);

        let record = FileRecord {
            filename: entry.file_name().to_string_lossy().into_owned(),
            extension,
            size: metadata.len(),
            modified_at,
            created_at,
            path,
        };

        // Blocks when the queue is full; the collector drains continuously.
        if self.tx.send(record).is_err() {
            return;
        }

        let matched = self.files_matched.fetch_add(1, Ordering::Relaxed) + 1;
        if matched % self.progress_interval == 0 {
            self.reporter
                .on_scan_progress(self.files_visited.load(Ordering::Relaxed), matched);
        }
    }
}
