//! Directory creation, drift scanning and confirmed pruning

mod common;

use std::fs;
use std::time::Duration;

use bifrost::{EventKind, PruneConfirmation, ScanOptions};
use common::fixtures::{scratch_root, service, shot_context};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

#[test]
fn test_ensure_is_idempotent() {
    let (_tmp, root) = scratch_root();
    let svc = service();
    let ctx = shot_context(root.as_str(), "shot010");

    let (path, first) = svc.ensure("main_studio", "shot_work_path", &ctx).unwrap();
    assert!(path.to_path_buf().is_dir());
    // shots/s01/ep01/seq001/shot010/v002/anim
    assert_eq!(first.created.len(), 7);

    let (_, second) = svc.ensure("main_studio", "shot_work_path", &ctx).unwrap();
    assert!(second.is_noop());

    let created: Vec<_> = svc
        .events()
        .events()
        .into_iter()
        .filter(|e| matches!(e.kind, EventKind::DirectoriesCreated { .. }))
        .collect();
    assert_eq!(created.len(), 1);
}

#[test]
fn test_concurrent_ensure_on_nested_paths() {
    let (_tmp, root) = scratch_root();
    let svc = service();
    let shots = ["shot010", "shot020", "shot030", "shot010"];

    let (svc, root) = (&svc, &root);
    std::thread::scope(|s| {
        let handles: Vec<_> = shots
            .iter()
            .map(|shot| {
                s.spawn(move || {
                    svc.ensure("main_studio", "shot_work_path", &shot_context(root.as_str(), shot))
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
    });

    for shot in ["shot010", "shot020", "shot030"] {
        assert!(root.join("shots/s01/ep01/seq001").join(shot).join("v002/anim").is_dir());
    }
}

#[test]
fn test_ensure_refuses_file_in_the_way() {
    let (_tmp, root) = scratch_root();
    fs::create_dir_all(root.join("shots/s01")).unwrap();
    fs::write(root.join("shots/s01/ep01"), "not a directory").unwrap();

    let err = service()
        .ensure("main_studio", "shot_work_path", &shot_context(root.as_str(), "shot010"))
        .unwrap_err();
    assert_eq!(err.code(), "BIF-040");
}

#[test]
fn test_ensure_file_template_creates_only_its_directory() {
    let (_tmp, root) = scratch_root();
    let svc = service();
    let ctx = shot_context(root.as_str(), "shot010");

    let (path, outcome) = svc.ensure("main_studio", "playblast_file", &ctx).unwrap();
    assert_eq!(path.to_path_buf(), root.join("playblasts/seq001/shot010.mov"));
    assert_eq!(
        outcome.created,
        vec![root.join("playblasts"), root.join("playblasts/seq001")]
    );
    assert!(!path.to_path_buf().exists());

    // Expected file not written yet
    let known = [ctx];
    let report = svc
        .scan_drift("main_studio", "playblast_file", &known, &ScanOptions::default())
        .unwrap();
    assert_eq!(report.missing, vec![path.to_path_buf()]);
    assert!(report.extra.is_empty());

    fs::write(path.to_path_buf(), b"mov").unwrap();
    let report = svc
        .scan_drift("main_studio", "playblast_file", &known, &ScanOptions::default())
        .unwrap();
    assert!(report.is_clean());
}

#[test]
fn test_drift_reports_without_deleting() {
    let (_tmp, root) = scratch_root();
    let svc = service();
    let known = [
        shot_context(root.as_str(), "shot010"),
        shot_context(root.as_str(), "shot020"),
    ];
    svc.ensure("main_studio", "shot_work_path", &known[0]).unwrap();
    let stray = root.join("shots/s01/ep01/seq001/shot099");
    fs::create_dir_all(&stray).unwrap();

    let report = svc
        .scan_drift("main_studio", "shot_work_path", &known, &ScanOptions::default())
        .unwrap();

    assert_eq!(report.roots, vec![root.join("shots")]);
    assert_eq!(
        report.missing,
        vec![root.join("shots/s01/ep01/seq001/shot020/v002/anim")]
    );
    assert_eq!(report.extra, vec![stray.clone()]);
    assert!(stray.is_dir(), "scan must never delete");
}

#[test]
fn test_prune_requires_matching_confirmation() {
    let (_tmp, root) = scratch_root();
    let svc = service();
    let known = [shot_context(root.as_str(), "shot010")];
    svc.ensure("main_studio", "shot_work_path", &known[0]).unwrap();
    let stray = root.join("shots/s01/ep01/seq001/shot099");
    fs::create_dir_all(&stray).unwrap();

    let report = svc
        .scan_drift("main_studio", "shot_work_path", &known, &ScanOptions::default())
        .unwrap();

    let err = svc
        .prune_extra(&report, PruneConfirmation::new(report.fingerprint() ^ 1))
        .unwrap_err();
    assert_eq!(err.code(), "BIF-042");
    assert!(stray.is_dir());

    let confirmation = PruneConfirmation::from_hex(&report.fingerprint_hex()).unwrap();
    let outcome = svc.prune_extra(&report, confirmation).unwrap();
    assert_eq!(outcome.removed, vec![stray.clone()]);
    assert!(!stray.exists());
    assert!(root.join("shots/s01/ep01/seq001/shot010/v002/anim").is_dir());

    let last = svc.events().events().pop().unwrap();
    assert!(matches!(last.kind, EventKind::ExtraPruned { .. }));
}

#[test]
fn test_clean_tree_has_no_drift() {
    let (_tmp, root) = scratch_root();
    let svc = service();
    let known = [shot_context(root.as_str(), "shot010")];
    svc.ensure("main_studio", "shot_work_path", &known[0]).unwrap();

    let report = svc
        .scan_drift("main_studio", "shot_work_path", &known, &ScanOptions::default())
        .unwrap();
    assert!(report.is_clean());
}

#[test]
fn test_cancelled_scan_stops() {
    let (_tmp, root) = scratch_root();
    let svc = service();
    let known = [shot_context(root.as_str(), "shot010")];
    svc.ensure("main_studio", "shot_work_path", &known[0]).unwrap();

    let token = CancellationToken::new();
    token.cancel();
    let err = svc
        .scan_drift("main_studio", "shot_work_path", &known, &ScanOptions::new(token))
        .unwrap_err();
    assert_eq!(err.code(), "BIF-041");
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn test_bounded_scan_on_blocking_thread() {
    let (_tmp, root) = scratch_root();
    let svc = service();
    let known = vec![shot_context(root.as_str(), "shot010")];
    svc.ensure("main_studio", "shot_work_path", &known[0]).unwrap();
    fs::create_dir_all(root.join("shots/s02")).unwrap();

    let report = svc
        .scan_drift_with_timeout(
            "main_studio",
            "shot_work_path",
            &known,
            Duration::from_secs(30),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(report.extra, vec![root.join("shots/s02")]);

    let scanned = svc
        .events()
        .events()
        .into_iter()
        .any(|e| matches!(e.kind, EventKind::DriftScanned { extra: 1, .. }));
    assert!(scanned);
}
