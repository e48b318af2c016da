//! Clustering: buckets file records by identity key and applies the
//! disambiguation heuristic. Pure and total over valid records — grouping
//! never fails, and its output is deterministic regardless of input order.

use crate::model::{DuplicateGroup, FileRecord, IdentityKey, PatternKind};
use crate::parser;
use dashmap::DashMap;
use rayon::prelude::*;
use std::hash::Hasher;
use tracing::debug;

const EXTENSION_MISMATCH_PENALTY: f64 = 0.3;
const SIZE_GAP_PENALTY: f64 = 0.2;
const SIZE_OUTLIER_PENALTY: f64 = 0.4;
const SIZE_GAP_RATIO: f64 = 0.5;
const SIZE_OUTLIER_RATIO: f64 = 0.1;
const MIN_CONFIDENCE: f64 = 0.1;

/// Cluster records into duplicate-candidate groups.
///
/// Singleton buckets and unrecognized keys never form groups. Each record
/// lands in at most one group because the bucket key is its full identity.
pub fn group(records: &[FileRecord]) -> Vec<DuplicateGroup> {
    let buckets: DashMap<IdentityKey, Vec<FileRecord>> = DashMap::new();

    records.par_iter().for_each(|record| {
        let key = parser::parse(&record.filename);
        if key.kind == PatternKind::Unrecognized {
            return;
        }
        buckets.entry(key).or_default().push(record.clone());
    });

    let mut groups: Vec<DuplicateGroup> = buckets
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .map(|(key, mut members)| {
            members.sort_by(|a, b| {
                a.modified_at
                    .cmp(&b.modified_at)
                    .then_with(|| a.path.cmp(&b.path))
            });
            let confidence = confidence_for(&members);
            let group_id = derive_group_id(key.kind, &members);
            DuplicateGroup {
                group_id,
                base_token: key.base_token,
                detection_method: key.kind,
                members,
                confidence,
            }
        })
        .collect();

    // Highest confidence first, then larger groups, then id for full
    // determinism across runs.
    groups.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| b.members.len().cmp(&a.members.len()))
            .then_with(|| a.group_id.cmp(&b.group_id))
    });

    debug!("Grouped {} records into {} duplicate groups", records.len(), groups.len());
    groups
}

/// Disambiguation heuristic. Starts at 1.0 and only ever subtracts, so a
/// wider size gap or an extension mismatch can never raise the score:
/// - differing extensions across members: cross-format duplicates are common
///   and worth surfacing, so the group is kept at reduced confidence;
/// - smallest member under half the largest: penalized;
/// - under a tenth: likely a thumbnail or crop — flagged low, not split.
fn confidence_for(members: &[FileRecord]) -> f64 {
    let mut confidence = 1.0;

    let first_ext = members.first().map(|m| m.extension.as_str()).unwrap_or("");
    if members.iter().any(|m| m.extension != first_ext) {
        confidence -= EXTENSION_MISMATCH_PENALTY;
    }

    let largest = members.iter().map(|m| m.size).max().unwrap_or(0);
    let smallest = members.iter().map(|m| m.size).min().unwrap_or(0);
    let ratio = if largest == 0 {
        1.0
    } else {
        smallest as f64 / largest as f64
    };
    if ratio < SIZE_GAP_RATIO {
        confidence -= SIZE_GAP_PENALTY;
    }
    if ratio < SIZE_OUTLIER_RATIO {
        confidence -= SIZE_OUTLIER_PENALTY;
    }

    confidence.clamp(MIN_CONFIDENCE, 1.0)
}

/// Stable group id: XxHash64 over the pattern kind and the lexicographically
/// sorted member paths. Content-independent, so re-scanning an unchanged
/// directory reproduces the id and stored decisions stay valid.
fn derive_group_id(kind: PatternKind, members: &[FileRecord]) -> String {
    let mut paths: Vec<String> = members
        .iter()
        .map(|m| m.path.to_string_lossy().into_owned())
        .collect();
    paths.sort_unstable();

    let mut hasher = twox_hash::XxHash64::with_seed(0);
    hasher.write(kind.as_str().as_bytes());
    for path in &paths {
        hasher.write(path.as_bytes());
        hasher.write(&[0]);
    }
    format!("{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;
    use std::path::PathBuf;

    fn record(name: &str, size: u64, modified_secs: i64) -> FileRecord {
        let extension = name
            .rsplit_once('.')
            .map(|(_, e)| e.to_lowercase())
            .unwrap_or_default();
        FileRecord {
            path: PathBuf::from(format!("/photos/{name}")),
            filename: name.to_string(),
            extension,
            size,
            modified_at: Utc.timestamp_opt(1_700_000_000 + modified_secs, 0).unwrap(),
            created_at: None,
        }
    }

    #[test]
    fn equal_sizes_same_extension_full_confidence() {
        let groups = group(&[
            record("IMG_1234.heic", 1000, 0),
            record("IMG_1234-5678.heic", 1000, 10),
        ]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].confidence, 1.0);
        assert_eq!(groups[0].detection_method, PatternKind::ImgPrefix);
    }

    #[test]
    fn extension_mismatch_lowers_confidence_but_keeps_group() {
        let same = group(&[
            record("IMG_1.jpg", 1000, 0),
            record("IMG_1-2.jpg", 1000, 0),
        ]);
        let mixed = group(&[
            record("IMG_1.jpg", 1000, 0),
            record("IMG_1-2.heic", 1000, 0),
        ]);
        assert_eq!(mixed.len(), 1);
        assert!(mixed[0].confidence < same[0].confidence);
    }

    #[test]
    fn confidence_is_monotone_in_size_gap() {
        let equal = group(&[record("a_1.jpg", 1000, 0), record("a_2.jpg", 1000, 0)]);
        let gap = group(&[record("a_1.jpg", 1000, 0), record("a_2.jpg", 400, 0)]);
        let outlier = group(&[record("a_1.jpg", 1000, 0), record("a_2.jpg", 50, 0)]);
        assert!(equal[0].confidence > gap[0].confidence);
        assert!(gap[0].confidence > outlier[0].confidence);
        assert!(outlier[0].confidence >= MIN_CONFIDENCE);
    }

    #[test]
    fn unrecognized_records_never_cluster() {
        let groups = group(&[
            record("12345.jpg", 100, 0),
            record("12345.jpg", 100, 0),
        ]);
        assert!(groups.is_empty());
    }

    #[test]
    fn singletons_are_excluded() {
        let groups = group(&[record("IMG_1.jpg", 100, 0), record("IMG_2.jpg", 100, 0)]);
        assert!(groups.is_empty());
    }

    #[test]
    fn members_are_ordered_by_modified_time() {
        let groups = group(&[
            record("IMG_7.jpg", 100, 50),
            record("IMG_7-1.jpg", 100, 10),
        ]);
        assert_eq!(groups[0].members[0].filename, "IMG_7-1.jpg");
        assert_eq!(groups[0].members[1].filename, "IMG_7.jpg");
    }

    #[test]
    fn group_ids_are_stable_across_reruns_and_input_order() {
        let records = vec![
            record("vacation.jpg", 900, 0),
            record("vacation-2.jpg", 850, 5),
            record("IMG_42.heic", 400, 1),
            record("IMG_42-99.heic", 410, 2),
        ];
        let mut reversed = records.clone();
        reversed.reverse();

        let first = group(&records);
        let second = group(&reversed);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.group_id, b.group_id);
            assert_eq!(a.confidence, b.confidence);
        }
    }

    #[test]
    fn no_path_appears_in_two_groups() {
        let records = vec![
            record("vacation.jpg", 900, 0),
            record("vacation-2.jpg", 850, 5),
            record("vacation_3.jpg", 850, 6),
            record("IMG_42.heic", 400, 1),
            record("IMG_42-99.heic", 410, 2),
        ];
        let groups = group(&records);
        let mut seen = std::collections::HashSet::new();
        for g in &groups {
            assert!(g.members.len() >= 2);
            for m in &g.members {
                assert!(seen.insert(m.path.clone()), "{} in two groups", m.path.display());
            }
        }
    }
}
