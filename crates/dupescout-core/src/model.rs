use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Persisted document schema version. Bump on any incompatible change to
/// [`ScanReport`]; `ReportStore::load` rejects versions it does not know.
pub const SCHEMA_VERSION: u32 = 1;

/// Which filename pattern produced an identity key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternKind {
    Guid,
    ImgPrefix,
    GenericNumbered,
    Unrecognized,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::Guid => "GUID",
            PatternKind::ImgPrefix => "IMG_PREFIX",
            PatternKind::GenericNumbered => "GENERIC_NUMBERED",
            PatternKind::Unrecognized => "UNRECOGNIZED",
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clustering key derived from a filename. Two files with equal keys are
/// duplicate candidates, except `Unrecognized` keys which never cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub base_token: String,
    pub kind: PatternKind,
}

/// One scanned file. Immutable once recorded — grouping and the report only
/// ever reference it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path; unique within a scan.
    pub path: PathBuf,
    /// Original-case filename, kept for display.
    pub filename: String,
    /// Lower-cased extension without the dot; empty when the file has none.
    pub extension: String,
    pub size: u64,
    pub modified_at: DateTime<Utc>,
    /// Creation time is unavailable on some platforms/filesystems.
    pub created_at: Option<DateTime<Utc>>,
}

/// A cluster of ≥2 files sharing an identity key, pending human review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Stable hex id derived from the pattern kind and the sorted member
    /// paths, so re-scanning unchanged files reproduces it.
    pub group_id: String,
    pub base_token: String,
    pub detection_method: PatternKind,
    /// Ordered by `modified_at` ascending, ties by path.
    pub members: Vec<FileRecord>,
    /// Heuristic likelihood in [0.1, 1.0] that the members really are
    /// duplicates rather than coincidentally similar names.
    pub confidence: f64,
}

impl DuplicateGroup {
    pub fn total_size(&self) -> u64 {
        self.members.iter().map(|m| m.size).sum()
    }

    /// Bytes recoverable if everything but the largest member were removed.
    pub fn wasted_bytes(&self) -> u64 {
        let largest = self.members.iter().map(|m| m.size).max().unwrap_or(0);
        self.total_size().saturating_sub(largest)
    }

    /// Review hint: the largest member (ties broken by path for stability).
    pub fn largest_member(&self) -> Option<&FileRecord> {
        self.members.iter().max_by(|a, b| {
            a.size.cmp(&b.size).then_with(|| b.path.cmp(&a.path))
        })
    }

    /// Review hint: the most recently modified member.
    pub fn newest_member(&self) -> Option<&FileRecord> {
        // members are sorted by modified_at ascending
        self.members.last()
    }

    pub fn contains_path(&self, path: &std::path::Path) -> bool {
        self.members.iter().any(|m| m.path == path)
    }
}

/// Keep/delete intent for one group. Recording a decision never touches the
/// filesystem; an external executor consumes these later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDecision {
    pub keep: PathBuf,
    pub delete: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanMetadata {
    pub scanned_at: DateTime<Utc>,
    pub root_path: PathBuf,
    pub recursive: bool,
    /// Every file the traversal saw, matched or not.
    pub files_scanned: usize,
    /// Files that passed the extension filter and were recorded.
    pub files_matched: usize,
    pub group_count: usize,
    pub scan_duration_secs: f64,
    /// False when the scan was cancelled mid-stream. Incomplete reports are
    /// never persisted; the flag exists so loaders can refuse them anyway.
    pub complete: bool,
}

/// Top-level persisted document: one scan's results plus the decisions that
/// accumulate during review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub schema_version: u32,
    pub metadata: ScanMetadata,
    /// Unique by `group_id`.
    pub groups: Vec<DuplicateGroup>,
    /// group_id → decision. Mutated only by the review stage, never by the
    /// scanner; outlives any single process run.
    pub decisions: BTreeMap<String, GroupDecision>,
}

impl ScanReport {
    pub fn new(metadata: ScanMetadata, groups: Vec<DuplicateGroup>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            metadata,
            groups,
            decisions: BTreeMap::new(),
        }
    }

    pub fn find_group(&self, group_id: &str) -> Option<&DuplicateGroup> {
        self.groups.iter().find(|g| g.group_id == group_id)
    }

    /// True once every group has a recorded decision.
    pub fn is_fully_resolved(&self) -> bool {
        self.groups
            .iter()
            .all(|g| self.decisions.contains_key(&g.group_id))
    }

    pub fn wasted_bytes(&self) -> u64 {
        self.groups.iter().map(|g| g.wasted_bytes()).sum()
    }
}
