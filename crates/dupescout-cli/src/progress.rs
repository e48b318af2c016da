use dupescout_core::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// CLI progress reporter using indicatif.
///
/// - Scan phase: spinner (total file count is unknown upfront)
/// - Group phase: spinner
/// - Report write: spinner
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn spinner(&self, message: &'static str) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }
}

impl Default for CliReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self) {
        self.spinner("Scanning files...");
    }

    fn on_scan_progress(&self, files_visited: usize, files_matched: usize) {
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            pb.set_message(format!(
                "Scanning... {} files visited, {} matched",
                files_visited, files_matched
            ));
        }
    }

    fn on_scan_complete(
        &self,
        files_visited: usize,
        files_matched: usize,
        cancelled: bool,
        duration_secs: f64,
    ) {
        self.finish_bar();
        if cancelled {
            eprintln!(
                "  \x1b[33m⚠\x1b[0m Scan cancelled after {:.2}s: {} files visited, {} matched",
                duration_secs, files_visited, files_matched
            );
        } else {
            eprintln!(
                "  \x1b[32m✓\x1b[0m Scan complete: {} files visited, {} matched in {:.2}s",
                files_visited, files_matched, duration_secs
            );
        }
    }

    fn on_group_start(&self) {
        self.spinner("Grouping duplicate candidates...");
    }

    fn on_group_complete(&self, group_count: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Grouping complete: {} groups in {:.2}s",
            group_count, duration_secs
        );
    }

    fn on_report_write_start(&self) {
        self.spinner("Writing report...");
    }

    fn on_report_write_complete(&self, path: &Path, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Report written to {} in {:.2}s",
            path.display(),
            duration_secs
        );
    }
}
