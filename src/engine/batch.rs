//! Sequential batch processing with per-file failure isolation

use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::engine::controller::TranscodeController;
use crate::engine::core::{BatchPlan, OutcomeSink, TranscodeOutcome};
use crate::engine::error::TranscodeError;
use crate::stats::BatchStats;

/// A candidate whose transcode did not reach `Accepted`
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: TranscodeError,
}

/// Everything a batch produced
#[derive(Debug, Default)]
pub struct BatchReport {
    pub stats: BatchStats,
    pub outcomes: Vec<TranscodeOutcome>,
    pub failures: Vec<FileFailure>,
}

pub struct BatchRunner<'a, 'c> {
    controller: &'a TranscodeController<'c>,
    sink: &'a mut dyn OutcomeSink,
}

impl<'a, 'c> BatchRunner<'a, 'c> {
    pub fn new(controller: &'a TranscodeController<'c>, sink: &'a mut dyn OutcomeSink) -> Self {
        Self { controller, sink }
    }

    /// Process candidates in discovery order, one at a time
    pub fn run(&mut self, plan: &BatchPlan) -> BatchReport {
        let mut report = BatchReport {
            stats: BatchStats::from_plan(plan),
            ..BatchReport::default()
        };
        let total = plan.candidates.len();

        for (i, source) in plan.candidates.iter().enumerate() {
            info!("Processing: {}, {} of {}", source.path.display(), i + 1, total);

            match self.controller.run(source) {
                Ok(outcome) => {
                    report
                        .stats
                        .record_completed(outcome.original_size_bytes, outcome.final_size_bytes);
                    if outcome.is_finalized() {
                        if let Err(e) = self.sink.record(&outcome) {
                            warn!("Could not record outcome for {}: {:#}", source.path.display(), e);
                        }
                    }
                    report.outcomes.push(outcome);
                }
                Err(e) => {
                    if e.is_invariant_violation() {
                        error!("Invariant violated for {}: {}", source.path.display(), e);
                    } else {
                        error!("{}", e);
                    }
                    report.stats.record_errored(source.size_bytes);
                    report.failures.push(FileFailure {
                        path: source.path.clone(),
                        error: e,
                    });
                }
            }
        }

        report
    }
}
