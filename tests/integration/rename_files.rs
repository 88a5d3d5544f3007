// Promoting saved-alongside outputs over their originals

use crate::common::mocks::file_names;
use std::fs;
use vidshrink::engine::promote_optimal_files;

#[test]
fn test_promote_replaces_originals() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path();
    fs::write(dir.join("a.mp4"), vec![0u8; 1_000]).unwrap();
    fs::write(dir.join("a.optimal.mp4"), vec![0u8; 300]).unwrap();
    fs::write(dir.join("b.mp4"), vec![0u8; 500]).unwrap();

    let report = promote_optimal_files(&[dir.to_path_buf()], false).unwrap();

    assert!(!report.dry_run);
    assert_eq!(report.promotions.len(), 1);
    assert_eq!(report.promotions[0].target_path, dir.join("a.mp4"));
    assert_eq!(report.total_savings_bytes(), 700);
    assert_eq!(file_names(dir), vec!["a.mp4", "b.mp4"]);
    assert_eq!(fs::metadata(dir.join("a.mp4")).unwrap().len(), 300);
}

#[test]
fn test_orphan_optimal_file_is_promoted_without_savings() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("gone.optimal.mp4"), vec![0u8; 300]).unwrap();

    let report = promote_optimal_files(&[temp.path().to_path_buf()], false).unwrap();

    assert_eq!(report.promotions[0].original_size, None);
    assert_eq!(report.total_savings_bytes(), 0);
    assert_eq!(file_names(temp.path()), vec!["gone.mp4"]);
}

#[test]
fn test_nested_directories_are_walked() {
    let temp = tempfile::tempdir().unwrap();
    let nested = temp.path().join("2024").join("june");
    fs::create_dir_all(&nested).unwrap();
    fs::write(nested.join("trip.mp4"), vec![0u8; 2_000]).unwrap();
    fs::write(nested.join("trip.optimal.mp4"), vec![0u8; 800]).unwrap();
    // Scratch files from an interrupted run are left alone
    fs::write(nested.join("other.tmp.mp4"), vec![0u8; 10]).unwrap();

    let report = promote_optimal_files(&[temp.path().to_path_buf()], false).unwrap();

    assert_eq!(report.promotions.len(), 1);
    assert_eq!(report.total_savings_bytes(), 1_200);
    assert_eq!(file_names(&nested), vec!["other.tmp.mp4", "trip.mp4"]);
}

#[test]
fn test_dry_run_reports_without_moving() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("a.mp4"), vec![0u8; 1_000]).unwrap();
    fs::write(temp.path().join("a.optimal.mp4"), vec![0u8; 300]).unwrap();

    let report = promote_optimal_files(&[temp.path().to_path_buf()], true).unwrap();

    assert!(report.dry_run);
    assert_eq!(report.total_savings_bytes(), 700);
    assert_eq!(file_names(temp.path()), vec!["a.mp4", "a.optimal.mp4"]);
}
