//! Durable scan-report storage. The store exclusively owns the on-disk
//! representation: a versioned JSON document per scan, written atomically so
//! a partially written report is never observable as valid.

use crate::error::{Error, Result};
use crate::model::{GroupDecision, ScanReport, SCHEMA_VERSION};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct ReportStore;

impl ReportStore {
    /// Atomic save: serialize to a sibling `.tmp` file, flush and sync, then
    /// rename over the destination. The staging file is removed on every
    /// failure path, and a prior valid report stays intact.
    pub fn save(report: &ScanReport, path: &Path) -> Result<()> {
        let write_err = |source: io::Error| Error::ReportWrite {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        let tmp = staging_path(path);
        let result = (|| -> io::Result<()> {
            let file = fs::File::create(&tmp)?;
            let mut writer = io::BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, report)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
            fs::rename(&tmp, path)
        })();

        if let Err(source) = result {
            let _ = fs::remove_file(&tmp);
            return Err(write_err(source));
        }

        debug!(
            "Saved report {} ({} groups, {} decisions)",
            path.display(),
            report.groups.len(),
            report.decisions.len(),
        );
        Ok(())
    }

    /// Load a persisted report. An unreadable file, unparseable structure,
    /// or unknown schema version is `CorruptReport` — groups are never
    /// silently dropped.
    pub fn load(path: &Path) -> Result<ScanReport> {
        let corrupt = |reason: String| Error::CorruptReport {
            path: path.to_path_buf(),
            reason,
        };

        let data =
            fs::read_to_string(path).map_err(|e| corrupt(format!("cannot read: {e}")))?;
        let report: ScanReport =
            serde_json::from_str(&data).map_err(|e| corrupt(format!("cannot parse: {e}")))?;

        if report.schema_version != SCHEMA_VERSION {
            return Err(corrupt(format!(
                "unknown schema version {} (this build reads {})",
                report.schema_version, SCHEMA_VERSION
            )));
        }
        Ok(report)
    }

    /// Record a keep/delete decision for one group. Validation happens
    /// before any write, so a rejected decision leaves the stored report
    /// unchanged. Never touches the files themselves.
    pub fn apply_decision(
        path: &Path,
        group_id: &str,
        keep: &Path,
        delete: &[PathBuf],
    ) -> Result<ScanReport> {
        let mut report = Self::load(path)?;

        {
            let group = report.find_group(group_id).ok_or_else(|| {
                Error::InvalidDecision(format!("no group '{group_id}' in {}", path.display()))
            })?;

            let members: HashSet<&Path> =
                group.members.iter().map(|m| m.path.as_path()).collect();
            if !members.contains(keep) {
                return Err(Error::InvalidDecision(format!(
                    "keep path {} is not a member of group '{group_id}'",
                    keep.display()
                )));
            }
            for candidate in delete {
                if !members.contains(candidate.as_path()) {
                    return Err(Error::InvalidDecision(format!(
                        "delete path {} is not a member of group '{group_id}'",
                        candidate.display()
                    )));
                }
                if candidate.as_path() == keep {
                    return Err(Error::InvalidDecision(format!(
                        "keep path {} is also marked for delete",
                        keep.display()
                    )));
                }
            }
        }

        report.decisions.insert(
            group_id.to_string(),
            GroupDecision {
                keep: keep.to_path_buf(),
                delete: delete.to_vec(),
            },
        );
        Self::save(&report, path)?;
        info!("Recorded decision for group '{}' in {}", group_id, path.display());
        Ok(report)
    }

    /// Remove whole report files (never individual groups) scanned before
    /// `older_than`. Reports with unresolved decisions are kept unless
    /// `force`. Returns the removed paths.
    pub fn prune(dir: &Path, older_than: DateTime<Utc>, force: bool) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let report = match Self::load(&path) {
                Ok(report) => report,
                Err(err) => {
                    warn!("prune: skipping {}: {}", path.display(), err);
                    continue;
                }
            };

            if report.metadata.scanned_at >= older_than {
                continue;
            }
            if !force && !report.is_fully_resolved() {
                debug!("prune: keeping {} (unresolved decisions)", path.display());
                continue;
            }

            fs::remove_file(&path)?;
            info!("Pruned report {}", path.display());
            removed.push(path);
        }

        Ok(removed)
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
