//! Per-file adaptive transcode loop
//!
//! One [`TranscodeController`] drives a source file through
//! `Evaluate -> Encode -> Score -> Decide -> (Escalate -> Evaluate ...) -> Finalize`.
//! Each transition is a call to [`TranscodeController::step`], so the loop can be
//! exercised state by state with mock collaborators.
//!
//! The source file is only touched in `Finalize`. Scratch output from a failed
//! or rejected attempt is removed before the next state is entered.

use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::engine::core::{
    EncodeResult, OutcomeKind, TranscodeOutcome, TranscodeTarget, VideoProperties,
    build_encode_cmd, optimal_path, scratch_path,
};
use crate::engine::error::{CapabilityError, TranscodeError};
use crate::engine::executor::EncodeExecutor;
use crate::engine::policy::{
    base_bitrate_for, bitrate_step_for, estimate_output_size_bytes, is_acceptable, max_attempts,
};
use crate::engine::settings::RunConfig;
use crate::engine::vmaf::QualityScorer;

/// Position of a file in the transcode loop
#[derive(Debug, Clone, PartialEq)]
pub enum TranscodeState {
    /// Check whether the source bitrate already satisfies the current target
    Evaluate,
    /// Encode at the current target into the scratch path
    Encode,
    /// Compare the scratch output against the original
    Score(EncodeResult),
    /// Accept or reject an encode, `score` is `None` when quality is not checked
    Decide {
        result: EncodeResult,
        score: Option<f64>,
    },
    /// Raise the target by the resolution's step
    Escalate,
    /// Promote the accepted scratch output
    Finalize {
        result: EncodeResult,
        score: Option<f64>,
    },
}

/// Result of one transition
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Next(TranscodeState),
    Accepted(TranscodeOutcome),
}

pub struct TranscodeController<'a> {
    config: &'a RunConfig,
    executor: &'a dyn EncodeExecutor,
    scorer: Option<&'a dyn QualityScorer>,
}

impl<'a> TranscodeController<'a> {
    /// Fails when quality checking is requested without a usable scorer
    pub fn new(
        config: &'a RunConfig,
        executor: &'a dyn EncodeExecutor,
        scorer: Option<&'a dyn QualityScorer>,
    ) -> Result<Self, CapabilityError> {
        let scorer = if config.settings.check_quality {
            if !config.capabilities.supports_quality_scoring || scorer.is_none() {
                return Err(CapabilityError::QualityScoringUnavailable);
            }
            scorer
        } else {
            None
        };

        Ok(Self {
            config,
            executor,
            scorer,
        })
    }

    pub fn config(&self) -> &RunConfig {
        self.config
    }

    /// Fresh per-file state at the base bitrate of the source's resolution
    pub fn target_for(&self, source: &VideoProperties) -> Result<TranscodeTarget, TranscodeError> {
        let base = base_bitrate_for(source.width, source.height).ok_or_else(|| {
            TranscodeError::UnsupportedResolution {
                path: source.path.clone(),
                width: source.width,
                height: source.height,
            }
        })?;
        Ok(TranscodeTarget::new(source.clone(), base))
    }

    /// Encode attempts allowed before the loop is considered broken
    pub fn attempt_limit(&self, target: &TranscodeTarget) -> u32 {
        let source = &target.source;
        match (
            base_bitrate_for(source.width, source.height),
            bitrate_step_for(source.width, source.height),
        ) {
            (Some(base), Some(step)) => max_attempts(
                source.bitrate_kbps(),
                base,
                step,
                self.config.settings.overhead_factor,
            ),
            _ => 1,
        }
    }

    /// Drive one file to a terminal state
    pub fn run(&self, source: &VideoProperties) -> Result<TranscodeOutcome, TranscodeError> {
        let mut target = self.target_for(source)?;
        let mut state = TranscodeState::Evaluate;
        loop {
            match self.step(&mut target, state)? {
                Step::Next(next) => state = next,
                Step::Accepted(outcome) => return Ok(outcome),
            }
        }
    }

    /// Perform a single transition
    pub fn step(
        &self,
        target: &mut TranscodeTarget,
        state: TranscodeState,
    ) -> Result<Step, TranscodeError> {
        match state {
            TranscodeState::Evaluate => Ok(self.evaluate(target)),
            TranscodeState::Encode => self.encode(target).map(Step::Next),
            TranscodeState::Score(result) => self.score(target, result).map(Step::Next),
            TranscodeState::Decide { result, score } => {
                Ok(Step::Next(self.decide(target, result, score)))
            }
            TranscodeState::Escalate => self.escalate(target).map(Step::Next),
            TranscodeState::Finalize { result, score } => {
                self.finalize(target, result, score).map(Step::Accepted)
            }
        }
    }

    fn evaluate(&self, target: &TranscodeTarget) -> Step {
        let source = &target.source;
        let current = source.bitrate_kbps();
        if !is_acceptable(current, target.bitrate_kbps, self.config.settings.overhead_factor) {
            return Step::Next(TranscodeState::Encode);
        }

        info!(
            "Bitrate {} Kbps of {} is acceptable with target {} Kbps, leaving it untouched",
            current,
            source.path.display(),
            target.bitrate_kbps
        );
        Step::Accepted(TranscodeOutcome {
            kind: OutcomeKind::Untouched,
            original_path: source.path.clone(),
            original_size_bytes: source.size_bytes,
            final_path: source.path.clone(),
            final_size_bytes: source.size_bytes,
            bitrate_kbps: target.bitrate_kbps,
            quality_score: None,
            attempts: target.attempts,
        })
    }

    fn encode(&self, target: &mut TranscodeTarget) -> Result<TranscodeState, TranscodeError> {
        let limit = self.attempt_limit(target);
        if target.attempts >= limit {
            return Err(TranscodeError::AttemptLimit {
                path: target.source.path.clone(),
                limit,
                bitrate_kbps: target.bitrate_kbps,
            });
        }

        let source = &target.source;
        let scratch = scratch_path(&source.path);
        let cmd = build_encode_cmd(
            source,
            &self.config.capabilities,
            target.bitrate_kbps,
            self.config.settings.spike_factor,
            &scratch,
        );

        target.attempts += 1;
        info!(
            "Encoding {} at {} Kbps (attempt {} of at most {})",
            source.path.display(),
            target.bitrate_kbps,
            target.attempts,
            limit
        );

        let result = match self
            .executor
            .execute(&cmd, &scratch, Some(source.duration_s))
        {
            Ok(result) => result,
            Err(source_err) => {
                remove_scratch(&scratch);
                return Err(TranscodeError::Encode {
                    path: source.path.clone(),
                    bitrate_kbps: target.bitrate_kbps,
                    source: source_err,
                });
            }
        };

        debug!(
            estimated = estimate_output_size_bytes(target.bitrate_kbps, source.duration_s),
            actual = result.output_size_bytes,
            "Encoded size of {}",
            result.output_path.display()
        );

        Ok(TranscodeState::Score(result))
    }

    fn score(
        &self,
        target: &TranscodeTarget,
        result: EncodeResult,
    ) -> Result<TranscodeState, TranscodeError> {
        let Some(scorer) = self.scorer else {
            return Ok(TranscodeState::Decide {
                result,
                score: None,
            });
        };

        match scorer.score(&target.source.path, &result.output_path) {
            Ok(score) => {
                info!("VMAF score at {} Kbps: {:.2}", target.bitrate_kbps, score);
                Ok(TranscodeState::Decide {
                    result,
                    score: Some(score),
                })
            }
            Err(e) => {
                remove_scratch(&result.output_path);
                Err(TranscodeError::Score {
                    path: target.source.path.clone(),
                    bitrate_kbps: target.bitrate_kbps,
                    source: e,
                })
            }
        }
    }

    fn decide(
        &self,
        target: &TranscodeTarget,
        result: EncodeResult,
        score: Option<f64>,
    ) -> TranscodeState {
        let min = self.config.settings.min_quality_score;
        match score {
            Some(s) if s < min => {
                warn!(
                    "With bitrate {}k the VMAF score {:.2} is below acceptable threshold {}, retrying",
                    target.bitrate_kbps, s, min
                );
                remove_scratch(&result.output_path);
                TranscodeState::Escalate
            }
            _ => TranscodeState::Finalize { result, score },
        }
    }

    fn escalate(&self, target: &mut TranscodeTarget) -> Result<TranscodeState, TranscodeError> {
        let source = &target.source;
        let step = bitrate_step_for(source.width, source.height).ok_or_else(|| {
            TranscodeError::NoBitrateStep {
                path: source.path.clone(),
                width: source.width,
                height: source.height,
            }
        })?;
        target.bitrate_kbps += step;
        debug!("Escalated target to {} Kbps", target.bitrate_kbps);
        Ok(TranscodeState::Evaluate)
    }

    fn finalize(
        &self,
        target: &TranscodeTarget,
        result: EncodeResult,
        score: Option<f64>,
    ) -> Result<TranscodeOutcome, TranscodeError> {
        let source = &target.source;
        let (kind, final_path) = if self.config.settings.replace_existing {
            (OutcomeKind::Replaced, source.path.clone())
        } else {
            (OutcomeKind::SavedAlongside, optimal_path(&source.path))
        };

        if let Err(e) = fs::rename(&result.output_path, &final_path) {
            remove_scratch(&result.output_path);
            return Err(TranscodeError::Finalize {
                path: source.path.clone(),
                source: e,
            });
        }

        match kind {
            OutcomeKind::Replaced => info!("Replaced original file with optimal version"),
            _ => info!("Saved optimal file as: {}", final_path.display()),
        }

        Ok(TranscodeOutcome {
            kind,
            original_path: source.path.clone(),
            original_size_bytes: source.size_bytes,
            final_path,
            final_size_bytes: result.output_size_bytes,
            bitrate_kbps: target.bitrate_kbps,
            quality_score: score,
            attempts: target.attempts,
        })
    }
}

fn remove_scratch(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed scratch file {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove scratch file {}: {}", path.display(), e),
    }
}
