/// Trait for reporting scan progress to an external sink.
///
/// Purely observational; implementations must never influence results. The
/// CLI implements this with indicatif; tests use [`SilentReporter`].
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self) {}
    fn on_scan_progress(&self, _files_visited: usize, _files_matched: usize) {}
    fn on_scan_complete(
        &self,
        _files_visited: usize,
        _files_matched: usize,
        _cancelled: bool,
        _duration_secs: f64,
    ) {
    }
    fn on_group_start(&self) {}
    fn on_group_complete(&self, _group_count: usize, _duration_secs: f64) {}
    fn on_report_write_start(&self) {}
    fn on_report_write_complete(&self, _path: &std::path::Path, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
