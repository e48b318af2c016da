use std::fs;
use std::path::Path;
use tempfile::tempdir;

use dupescout_core::{
    AppConfig, CancelFlag, PatternKind, ReportStore, ScanEngine, ScanOptions, SilentReporter,
};

/// Layout:
///   root/
///     58c9b580-....jpg / 58c9b580-...-222115.jpg   ← GUID pair
///     IMG_1234.heic / IMG_1234-56788.heic          ← IMG pair
///     notes.txt                                    ← filtered out
///     sub/
///       vacation.jpg / vacation-2.jpg              ← generic pair
///       IMG_9999.heic                              ← singleton
fn create_test_tree(root: &Path) {
    let sub = root.join("sub");
    fs::create_dir_all(&sub).unwrap();

    fs::write(
        root.join("58c9b580-5303-4b3b-b75d-f07f505f8d59.jpg"),
        vec![1u8; 800],
    )
    .unwrap();
    fs::write(
        root.join("58c9b580-5303-4b3b-b75d-f07f505f8d59-222115.jpg"),
        vec![1u8; 780],
    )
    .unwrap();
    fs::write(root.join("IMG_1234.heic"), vec![2u8; 600]).unwrap();
    fs::write(root.join("IMG_1234-56788.heic"), vec![2u8; 600]).unwrap();
    fs::write(root.join("notes.txt"), "not media").unwrap();

    fs::write(sub.join("vacation.jpg"), vec![3u8; 400]).unwrap();
    fs::write(sub.join("vacation-2.jpg"), vec![3u8; 390]).unwrap();
    fs::write(sub.join("IMG_9999.heic"), vec![4u8; 100]).unwrap();
}

fn test_config(report_dir: &Path) -> AppConfig {
    AppConfig {
        report_dir: report_dir.to_string_lossy().into_owned(),
        ..AppConfig::default()
    }
}

#[test]
fn full_pipeline_finds_all_three_groups() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("scan_root");
    create_test_tree(&root);
    let report_dir = tempdir().unwrap();

    let config = test_config(report_dir.path());
    let options = ScanOptions::from_config(&root, true, &config);
    let engine = ScanEngine::new(config);
    let outcome = engine
        .scan(&options, None, &SilentReporter, &CancelFlag::new())
        .unwrap();

    assert!(!outcome.cancelled);
    // 7 media files matched; notes.txt visited but filtered
    assert_eq!(outcome.files_matched, 7);
    assert_eq!(outcome.files_visited, 8);
    assert_eq!(outcome.report.groups.len(), 3);

    let kinds: Vec<PatternKind> = outcome
        .report
        .groups
        .iter()
        .map(|g| g.detection_method)
        .collect();
    assert!(kinds.contains(&PatternKind::Guid));
    assert!(kinds.contains(&PatternKind::ImgPrefix));
    assert!(kinds.contains(&PatternKind::GenericNumbered));

    for group in &outcome.report.groups {
        assert!(group.members.len() >= 2);
        assert!(group.confidence >= 0.1 && group.confidence <= 1.0);
    }

    // report landed on disk and reloads identically
    let path = outcome.report_path.as_ref().unwrap();
    let loaded = ReportStore::load(path).unwrap();
    assert_eq!(loaded.groups.len(), 3);
    assert!(loaded.metadata.complete);
}

#[test]
fn rescan_reproduces_group_ids_and_confidences() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("scan_root");
    create_test_tree(&root);
    let report_dir = tempdir().unwrap();

    let config = test_config(report_dir.path());
    let options = ScanOptions::from_config(&root, true, &config);
    let engine = ScanEngine::new(config);

    let first = engine
        .scan(&options, None, &SilentReporter, &CancelFlag::new())
        .unwrap();
    let second = engine
        .scan(&options, None, &SilentReporter, &CancelFlag::new())
        .unwrap();

    assert_eq!(first.report.groups.len(), second.report.groups.len());
    for (a, b) in first.report.groups.iter().zip(second.report.groups.iter()) {
        assert_eq!(a.group_id, b.group_id);
        assert_eq!(a.confidence, b.confidence);
    }
}

#[test]
fn non_recursive_scan_sees_only_direct_children() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("scan_root");
    create_test_tree(&root);
    let report_dir = tempdir().unwrap();

    let config = test_config(report_dir.path());
    let options = ScanOptions::from_config(&root, false, &config);
    let engine = ScanEngine::new(config);
    let outcome = engine
        .scan(&options, None, &SilentReporter, &CancelFlag::new())
        .unwrap();

    // sub/ is not descended: only the GUID and IMG pairs remain
    assert_eq!(outcome.files_matched, 4);
    assert_eq!(outcome.report.groups.len(), 2);
}

#[test]
fn extension_allow_list_is_case_insensitive_and_filters_before_stat() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("scan_root");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("IMG_1.JPG"), vec![0u8; 10]).unwrap();
    fs::write(root.join("IMG_1-2.jpg"), vec![0u8; 10]).unwrap();
    fs::write(root.join("IMG_1-3.heic"), vec![0u8; 10]).unwrap();
    let report_dir = tempdir().unwrap();

    let mut config = test_config(report_dir.path());
    config.allowed_extensions = vec!["jpg".to_string()];
    let options = ScanOptions::from_config(&root, true, &config);
    let engine = ScanEngine::new(config);
    let outcome = engine
        .scan(&options, None, &SilentReporter, &CancelFlag::new())
        .unwrap();

    assert_eq!(outcome.files_matched, 2);
    assert_eq!(outcome.report.groups.len(), 1);
}

#[test]
fn invalid_root_fails_before_scanning() {
    let tmp = tempdir().unwrap();
    let report_dir = tempdir().unwrap();
    let config = test_config(report_dir.path());
    let options =
        ScanOptions::from_config(tmp.path().join("does-not-exist"), true, &config);
    let engine = ScanEngine::new(config);

    let err = engine
        .scan(&options, None, &SilentReporter, &CancelFlag::new())
        .unwrap_err();
    assert!(matches!(err, dupescout_core::Error::InvalidRoot { .. }));
}

#[test]
fn root_that_is_a_file_is_invalid() {
    let tmp = tempdir().unwrap();
    let file = tmp.path().join("a-file.jpg");
    fs::write(&file, "x").unwrap();
    let report_dir = tempdir().unwrap();
    let config = test_config(report_dir.path());
    let options = ScanOptions::from_config(&file, true, &config);
    let engine = ScanEngine::new(config);

    let err = engine
        .scan(&options, None, &SilentReporter, &CancelFlag::new())
        .unwrap_err();
    assert!(matches!(err, dupescout_core::Error::InvalidRoot { .. }));
}

#[test]
fn cancelled_scan_returns_partial_and_persists_nothing() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("scan_root");
    create_test_tree(&root);
    let report_dir = tempdir().unwrap();

    let config = test_config(report_dir.path());
    let options = ScanOptions::from_config(&root, true, &config);
    let engine = ScanEngine::new(config);

    let cancel = CancelFlag::new();
    cancel.cancel();
    let outcome = engine
        .scan(&options, None, &SilentReporter, &cancel)
        .unwrap();

    assert!(outcome.cancelled);
    assert!(outcome.report_path.is_none());
    assert!(!outcome.report.metadata.complete);
    assert_eq!(fs::read_dir(report_dir.path()).unwrap().count(), 0);
}

#[test]
fn ignore_patterns_exclude_subtrees() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("scan_root");
    create_test_tree(&root);
    let report_dir = tempdir().unwrap();

    let mut config = test_config(report_dir.path());
    config.ignore_patterns = vec!["**/sub".to_string()];
    let options = ScanOptions::from_config(&root, true, &config);
    let engine = ScanEngine::new(config);
    let outcome = engine
        .scan(&options, None, &SilentReporter, &CancelFlag::new())
        .unwrap();

    assert_eq!(outcome.files_matched, 4);
}

#[cfg(unix)]
#[test]
fn unreadable_directory_is_skipped_and_logged_not_fatal() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = tempdir().unwrap();
    let root = tmp.path().join("scan_root");
    create_test_tree(&root);
    let locked = root.join("locked");
    fs::create_dir_all(&locked).unwrap();
    fs::write(locked.join("IMG_7777.jpg"), vec![0u8; 50]).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Running as root, mode 000 does not block reads; nothing to test then.
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let report_dir = tempdir().unwrap();
    let config = test_config(report_dir.path());
    let options = ScanOptions::from_config(&root, true, &config);
    let engine = ScanEngine::new(config);
    let result = engine.scan(&options, None, &SilentReporter, &CancelFlag::new());

    // restore so tempdir cleanup succeeds regardless of the assert below
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let outcome = result.unwrap();
    assert_eq!(outcome.files_matched, 7);
    assert!(outcome.files_skipped >= 1);
    assert!(outcome.report_path.is_some());
}

#[cfg(unix)]
#[test]
fn symlink_cycles_terminate() {
    use std::os::unix::fs::symlink;

    let tmp = tempdir().unwrap();
    let root = tmp.path().join("scan_root");
    let sub = root.join("sub");
    fs::create_dir_all(&sub).unwrap();
    fs::write(sub.join("IMG_1.jpg"), vec![0u8; 10]).unwrap();
    fs::write(sub.join("IMG_1-2.jpg"), vec![0u8; 10]).unwrap();
    // sub/loop → root: traversal must follow it at most once per real path
    symlink(&root, sub.join("loop")).unwrap();

    let report_dir = tempdir().unwrap();
    let config = test_config(report_dir.path());
    let options = ScanOptions::from_config(&root, true, &config);
    let engine = ScanEngine::new(config);
    let outcome = engine
        .scan(&options, None, &SilentReporter, &CancelFlag::new())
        .unwrap();

    assert_eq!(outcome.files_matched, 2);
    assert_eq!(outcome.report.groups.len(), 1);
}
