// Batch processing: ordering, failure isolation, aggregation and outcome logging

use crate::common::mocks::{
    EncodePlan, ScriptedExecutor, ScriptedScorer, file_names, run_config, write_source,
};
use std::fs;
use vidshrink::engine::{
    BatchPlan, BatchRunner, OutcomeKind, OutcomeLog, SkipReason, SkippedFile,
    TranscodeController, TranscodeError, TranscodeOutcome,
};

#[test]
fn test_one_failure_does_not_abort_the_batch() {
    let temp = tempfile::tempdir().unwrap();
    let plan = BatchPlan {
        candidates: vec![
            write_source(temp.path(), "a.mp4", 10_000, 3_000),
            write_source(temp.path(), "b.mp4", 10_000, 5_000),
            write_source(temp.path(), "c.mp4", 10_000, 7_000),
        ],
        skipped: vec![SkippedFile {
            path: temp.path().join("old.tmp.mp4"),
            reason: SkipReason::AuxiliaryFile,
        }],
    };
    let config = run_config(false, false);
    let executor = ScriptedExecutor::new(vec![
        EncodePlan::Write(1_000),
        EncodePlan::Fail(1),
        EncodePlan::Write(2_000),
    ]);
    let controller = TranscodeController::new(&config, &executor, None).unwrap();
    let mut sink: Vec<TranscodeOutcome> = Vec::new();

    let report = BatchRunner::new(&controller, &mut sink).run(&plan);

    // Discovery order is preserved
    let inputs: Vec<String> = executor
        .commands
        .borrow()
        .iter()
        .map(|c| c.value_of("-i").unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        inputs,
        vec![
            temp.path().join("a.mp4").display().to_string(),
            temp.path().join("b.mp4").display().to_string(),
            temp.path().join("c.mp4").display().to_string(),
        ]
    );

    assert_eq!(report.stats.files_considered, 4);
    assert_eq!(report.stats.files_skipped, 1);
    assert_eq!(report.stats.files_errored, 1);
    assert_eq!(report.stats.total_original_size, 15_000);
    // b keeps its original 5000 bytes
    assert_eq!(report.stats.total_final_size, 8_000);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, temp.path().join("b.mp4"));
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(sink.len(), 2);

    assert_eq!(
        file_names(temp.path()),
        vec![
            "a.mp4",
            "a.optimal.mp4",
            "b.mp4",
            "c.mp4",
            "c.optimal.mp4"
        ]
    );
}

#[test]
fn test_untouched_outcomes_are_not_recorded() {
    let temp = tempfile::tempdir().unwrap();
    // 10000 Kbps source rejected at 8000, then acceptable at 10000
    let plan = BatchPlan {
        candidates: vec![write_source(temp.path(), "a.mp4", 10_000, 3_000)],
        skipped: vec![],
    };
    let config = run_config(true, false);
    let executor = ScriptedExecutor::always(1_000);
    let scorer = ScriptedScorer::new(vec![70.0]);
    let controller = TranscodeController::new(&config, &executor, Some(&scorer)).unwrap();
    let mut sink: Vec<TranscodeOutcome> = Vec::new();

    let report = BatchRunner::new(&controller, &mut sink).run(&plan);

    assert!(sink.is_empty());
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].kind, OutcomeKind::Untouched);
    assert_eq!(report.stats.files_errored, 0);
    assert_eq!(report.stats.total_final_size, 3_000);
}

#[test]
fn test_outcome_log_gets_one_line_per_finalized_file() {
    let temp = tempfile::tempdir().unwrap();
    let videos = temp.path().join("videos");
    fs::create_dir(&videos).unwrap();
    let plan = BatchPlan {
        candidates: vec![
            write_source(&videos, "a.mp4", 10_000, 3_000),
            write_source(&videos, "b.mp4", 10_000, 3_000),
        ],
        skipped: vec![],
    };
    let config = run_config(true, false);
    let executor = ScriptedExecutor::always(1_000);
    let scorer = ScriptedScorer::new(vec![96.5, 91.0]);
    let controller = TranscodeController::new(&config, &executor, Some(&scorer)).unwrap();
    let log_path = temp.path().join("logs").join("outcomes.jsonl");
    let mut log = OutcomeLog::new(&log_path);

    let report = BatchRunner::new(&controller, &mut log).run(&plan);
    assert_eq!(report.stats.files_errored, 0);

    let lines: Vec<serde_json::Value> = fs::read_to_string(&log_path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[0]["original_path"],
        videos.join("a.mp4").display().to_string()
    );
    assert_eq!(
        lines[0]["final_path"],
        videos.join("a.optimal.mp4").display().to_string()
    );
    assert_eq!(lines[0]["original_size_bytes"], 3_000);
    assert_eq!(lines[0]["final_size_bytes"], 1_000);
    assert_eq!(lines[0]["bitrate_kbps"], 8000);
    assert_eq!(lines[0]["quality_score"], 96.5);
    assert_eq!(lines[1]["quality_score"], 91.0);
}

#[test]
fn test_finalize_failure_counts_as_errored() {
    let temp = tempfile::tempdir().unwrap();
    let plan = BatchPlan {
        candidates: vec![
            write_source(temp.path(), "a.mp4", 10_000, 3_000),
            write_source(temp.path(), "b.mp4", 10_000, 4_000),
        ],
        skipped: vec![],
    };
    let blocker = temp.path().join("a.optimal.mp4");
    fs::create_dir(&blocker).unwrap();
    fs::write(blocker.join("keep"), b"x").unwrap();
    let config = run_config(false, false);
    let executor = ScriptedExecutor::always(1_000);
    let controller = TranscodeController::new(&config, &executor, None).unwrap();
    let mut sink: Vec<TranscodeOutcome> = Vec::new();

    let report = BatchRunner::new(&controller, &mut sink).run(&plan);

    assert_eq!(report.stats.files_errored, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, temp.path().join("a.mp4"));
    assert!(matches!(
        report.failures[0].error,
        TranscodeError::Finalize { .. }
    ));
    assert_eq!(sink.len(), 1);
    assert_eq!(report.stats.total_original_size, 7_000);
    assert_eq!(report.stats.total_final_size, 4_000);
    assert_eq!(fs::read(temp.path().join("a.mp4")).unwrap(), vec![1u8; 3_000]);
    assert_eq!(
        file_names(temp.path()),
        vec!["a.mp4", "b.mp4", "b.optimal.mp4"]
    );
}

#[test]
fn test_empty_plan_reports_zeroes() {
    let config = run_config(false, false);
    let executor = ScriptedExecutor::always(1);
    let controller = TranscodeController::new(&config, &executor, None).unwrap();
    let mut sink: Vec<TranscodeOutcome> = Vec::new();

    let report = BatchRunner::new(&controller, &mut sink).run(&BatchPlan::default());

    assert_eq!(report.stats, Default::default());
    assert_eq!(executor.calls(), 0);
}
