//! Run-scoped settings, resolved once before any file is touched

use serde::Serialize;

use crate::engine::hardware::EncoderCapabilitySet;

pub const DEFAULT_OVERHEAD_FACTOR: f64 = 1.10;
pub const DEFAULT_SPIKE_FACTOR: f64 = 1.25;
pub const DEFAULT_MIN_QUALITY_SCORE: f64 = 90.0;

/// Knobs for the per-file transcode loop
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscodeSettings {
    /// Source bitrate above `base * overhead_factor` is worth re-encoding
    pub overhead_factor: f64,
    /// Rate-control ceiling multiplier for encoders that use one
    pub spike_factor: f64,
    /// Minimum VMAF harmonic mean to accept an encode
    pub min_quality_score: f64,
    pub check_quality: bool,
    /// Rename the accepted encode over the original instead of saving alongside
    pub replace_existing: bool,
    /// Re-process files that already have a saved-alongside output
    pub overwrite: bool,
}

impl Default for TranscodeSettings {
    fn default() -> Self {
        Self {
            overhead_factor: DEFAULT_OVERHEAD_FACTOR,
            spike_factor: DEFAULT_SPIKE_FACTOR,
            min_quality_score: DEFAULT_MIN_QUALITY_SCORE,
            check_quality: false,
            replace_existing: false,
            overwrite: false,
        }
    }
}

/// Immutable configuration for one batch run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfig {
    pub settings: TranscodeSettings,
    pub capabilities: EncoderCapabilitySet,
}

impl RunConfig {
    pub fn new(settings: TranscodeSettings, capabilities: EncoderCapabilitySet) -> Self {
        Self {
            settings,
            capabilities,
        }
    }
}
