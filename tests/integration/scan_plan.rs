// Planning: discovery, skip reasons, projection and idempotence of reruns

use crate::common::mocks::{ScriptedExecutor, TableProbe, run_config};
use std::fs;
use std::path::PathBuf;
use vidshrink::engine::{
    BatchRunner, SkipReason, TranscodeController, TranscodeOutcome, TranscodeSettings,
    gather_candidates,
};

fn reason_for<'a>(
    skipped: &'a [vidshrink::engine::SkippedFile],
    name: &str,
) -> Option<&'a SkipReason> {
    skipped
        .iter()
        .find(|s| s.path.file_name().is_some_and(|n| n == name))
        .map(|s| &s.reason)
}

#[test]
fn test_plan_sorts_files_into_candidates_and_skips() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path();
    fs::create_dir(dir.join("season1")).unwrap();
    for name in [
        "big.mp4",
        "fine.mp4",
        "tiny.mp4",
        "big.tmp.mp4",
        "season1/ep1.mp4",
        "season1/ep2.optimal.mp4",
        "broken.mp4",
        "notes.txt",
        "movie.mkv",
    ] {
        fs::write(dir.join(name), vec![0u8; 2_000]).unwrap();
    }
    let probe = TableProbe::default()
        .with("big.mp4", 1920, 1080, 10_000)
        .with("fine.mp4", 1920, 1080, 8_500)
        .with("tiny.mp4", 640, 480, 10_000)
        .with("ep1.mp4", 720, 1280, 6_000);

    let plan = gather_candidates(&[dir.to_path_buf()], &probe, &TranscodeSettings::default());

    let mut candidates: Vec<PathBuf> = plan.candidates.iter().map(|c| c.path.clone()).collect();
    candidates.sort();
    assert_eq!(
        candidates,
        vec![dir.join("big.mp4"), dir.join("season1").join("ep1.mp4")]
    );
    assert_eq!(plan.skipped.len(), 5);
    assert_eq!(plan.files_considered(), 7);

    assert_eq!(
        reason_for(&plan.skipped, "fine.mp4"),
        Some(&SkipReason::AlreadyAcceptable { kbps: 8_500 })
    );
    assert_eq!(
        reason_for(&plan.skipped, "tiny.mp4"),
        Some(&SkipReason::UnsupportedResolution {
            width: 640,
            height: 480
        })
    );
    assert_eq!(
        reason_for(&plan.skipped, "big.tmp.mp4"),
        Some(&SkipReason::AuxiliaryFile)
    );
    assert_eq!(
        reason_for(&plan.skipped, "ep2.optimal.mp4"),
        Some(&SkipReason::AuxiliaryFile)
    );
    assert!(matches!(
        reason_for(&plan.skipped, "broken.mp4"),
        Some(SkipReason::ProbeFailed { .. })
    ));
}

#[test]
fn test_projection_sums_candidates() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("a.mp4"), vec![0u8; 70_000_000 / 1000]).unwrap();
    let probe = TableProbe::default().with("a.mp4", 1280, 720, 9_000);

    let plan = gather_candidates(
        &[temp.path().to_path_buf()],
        &probe,
        &TranscodeSettings::default(),
    );

    let projection = plan.projection();
    assert_eq!(projection.current_bytes, 70_000);
    // 720p base 4000 Kbps over 60s = 30 MB
    assert_eq!(projection.projected_bytes, 30_000_000);
    assert!(projection.savings_bytes() < 0);
}

#[test]
fn test_second_run_finds_nothing_to_do() {
    let temp = tempfile::tempdir().unwrap();
    let dirs = [temp.path().to_path_buf()];
    fs::write(temp.path().join("a.mp4"), vec![0u8; 5_000]).unwrap();
    fs::write(temp.path().join("b.mp4"), vec![0u8; 5_000]).unwrap();
    let probe = TableProbe::default()
        .with("a.mp4", 1920, 1080, 12_000)
        .with("b.mp4", 3840, 2160, 40_000);
    let config = run_config(false, false);
    let executor = ScriptedExecutor::always(1_000);
    let controller = TranscodeController::new(&config, &executor, None).unwrap();

    let first = gather_candidates(&dirs, &probe, &config.settings);
    assert_eq!(first.candidates.len(), 2);
    let mut sink: Vec<TranscodeOutcome> = Vec::new();
    let report = BatchRunner::new(&controller, &mut sink).run(&first);
    assert_eq!(report.stats.files_errored, 0);
    assert_eq!(executor.calls(), 2);

    let second = gather_candidates(&dirs, &probe, &config.settings);
    assert!(second.candidates.is_empty());
    assert_eq!(second.skipped.len(), 4);
    assert!(matches!(
        reason_for(&second.skipped, "a.mp4"),
        Some(SkipReason::OptimalExists { .. })
    ));
    assert_eq!(
        reason_for(&second.skipped, "a.optimal.mp4"),
        Some(&SkipReason::AuxiliaryFile)
    );

    let report = BatchRunner::new(&controller, &mut sink).run(&second);
    assert_eq!(executor.calls(), 2);
    assert_eq!(report.stats.files_skipped, 4);
}

#[test]
fn test_overwrite_reconsiders_files_with_optimal_version() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("a.mp4"), vec![0u8; 5_000]).unwrap();
    fs::write(temp.path().join("a.optimal.mp4"), vec![0u8; 1_000]).unwrap();
    let probe = TableProbe::default().with("a.mp4", 1920, 1080, 12_000);
    let settings = TranscodeSettings {
        overwrite: true,
        ..TranscodeSettings::default()
    };

    let plan = gather_candidates(&[temp.path().to_path_buf()], &probe, &settings);

    assert_eq!(plan.candidates.len(), 1);
    assert_eq!(plan.skipped.len(), 1);
}

#[test]
fn test_missing_directory_yields_empty_plan() {
    let plan = gather_candidates(
        &[PathBuf::from("/definitely/not/here")],
        &TableProbe::default(),
        &TranscodeSettings::default(),
    );
    assert_eq!(plan.files_considered(), 0);
}
