//! Phase orchestration: scan → group → persist. Holds the per-scan context
//! explicitly — no process-wide state.

use crate::config::AppConfig;
use crate::error::Result;
use crate::grouper;
use crate::model::{ScanMetadata, ScanReport};
use crate::progress::ProgressReporter;
use crate::report::store::ReportStore;
use crate::scanner::{self, CancelFlag, ScanOptions};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub struct ScanEngine {
    config: AppConfig,
}

#[derive(Debug)]
pub struct EngineOutcome {
    pub report: ScanReport,
    /// Where the report was persisted; `None` for cancelled (partial) scans,
    /// which are never saved.
    pub report_path: Option<PathBuf>,
    pub cancelled: bool,
    pub files_visited: usize,
    pub files_matched: usize,
    pub files_skipped: usize,
    pub scan_duration: Duration,
    pub group_duration: Duration,
    pub write_duration: Duration,
}

impl ScanEngine {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the full detection pipeline:
    /// 1. Parallel directory scan (stream of file records)
    /// 2. Identity-key grouping with the disambiguation heuristic
    /// 3. Atomic report write (skipped when the scan was cancelled)
    ///
    /// `report_path` overrides the config's report directory.
    pub fn scan(
        &self,
        options: &ScanOptions,
        report_path: Option<&Path>,
        reporter: &dyn ProgressReporter,
        cancel: &CancelFlag,
    ) -> Result<EngineOutcome> {
        let scanned_at = Utc::now();

        // Phase 1: scan
        info!("Scanning files...");
        let scan_start = Instant::now();
        let outcome = scanner::scan(options, reporter, cancel)?;
        let scan_duration = scan_start.elapsed();
        debug!(
            "Scan completed in {:.2}s — {} files matched of {} visited",
            scan_duration.as_secs_f64(),
            outcome.files_matched,
            outcome.files_visited,
        );

        // Phase 2: group
        info!("Grouping duplicate candidates...");
        reporter.on_group_start();
        let group_start = Instant::now();
        let groups = grouper::group(&outcome.records);
        let group_duration = group_start.elapsed();
        reporter.on_group_complete(groups.len(), group_duration.as_secs_f64());
        debug!(
            "Grouping completed in {:.2}s — {} groups",
            group_duration.as_secs_f64(),
            groups.len(),
        );

        let metadata = ScanMetadata {
            scanned_at,
            root_path: options.root.clone(),
            recursive: options.recursive,
            files_scanned: outcome.files_visited,
            files_matched: outcome.files_matched,
            group_count: groups.len(),
            scan_duration_secs: scan_duration.as_secs_f64(),
            complete: !outcome.cancelled,
        };
        let report = ScanReport::new(metadata, groups);

        // Phase 3: persist. A cancelled scan's output is partial and must
        // not be stored as a complete report.
        let mut write_duration = Duration::ZERO;
        let report_path = if outcome.cancelled {
            warn!("Scan cancelled — partial results are not persisted");
            None
        } else {
            let path = report_path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.default_report_path(scanned_at));
            info!("Writing report to {}...", path.display());
            reporter.on_report_write_start();
            let write_start = Instant::now();
            ReportStore::save(&report, &path)?;
            write_duration = write_start.elapsed();
            reporter.on_report_write_complete(&path, write_duration.as_secs_f64());
            Some(path)
        };

        Ok(EngineOutcome {
            report,
            report_path,
            cancelled: outcome.cancelled,
            files_visited: outcome.files_visited,
            files_matched: outcome.files_matched,
            files_skipped: outcome.files_skipped,
            scan_duration,
            group_duration,
            write_duration,
        })
    }

    fn default_report_path(&self, scanned_at: chrono::DateTime<Utc>) -> PathBuf {
        let name = format!("scan-{}.json", scanned_at.format("%Y%m%dT%H%M%S"));
        Path::new(&self.config.report_dir).join(name)
    }
}
