//! VMAF evaluation of an encoded candidate against its original
//!
//! The comparison is delegated to ffmpeg's libvmaf filter. The pooled
//! harmonic mean over all (subsampled) frames is the score the transcode loop
//! compares against its quality bar.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::engine::core::EncodeCommand;
use crate::engine::error::ScoreError;

/// Evaluate every Nth frame
pub const VMAF_SUBSAMPLE: u32 = 10;

/// Perceptual comparison between an original and a candidate encode
pub trait QualityScorer {
    /// Harmonic-mean VMAF score on a 0-100 scale
    fn score(&self, original: &Path, candidate: &Path) -> Result<f64, ScoreError>;
}

/// VMAF JSON output structure (partial - we only need the pooled harmonic mean)
#[derive(Debug, Deserialize)]
struct VmafOutput {
    pooled_metrics: PooledMetrics,
}

#[derive(Debug, Deserialize)]
struct PooledMetrics {
    vmaf: VmafMetrics,
}

#[derive(Debug, Deserialize)]
struct VmafMetrics {
    harmonic_mean: f64,
}

/// Extract the pooled harmonic mean from libvmaf's JSON log
pub fn parse_vmaf_score(json: &str) -> Result<f64, ScoreError> {
    let output: VmafOutput =
        serde_json::from_str(json).map_err(|e| ScoreError::Unparsable(e.to_string()))?;
    Ok(output.pooled_metrics.vmaf.harmonic_mean)
}

/// Escape a path for use inside an ffmpeg filter expression
fn escape_filter_path(path: &Path) -> String {
    path.display()
        .to_string()
        .replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('\'', "\\'")
        .replace(' ', "\\ ")
        .replace('[', "\\[")
        .replace(']', "\\]")
        .replace(',', "\\,")
}

/// Build the ffmpeg invocation comparing `candidate` (distorted, first input)
/// with `original` (reference, second input)
pub fn build_vmaf_cmd(
    original: &Path,
    candidate: &Path,
    log_path: &Path,
    threads: usize,
) -> EncodeCommand {
    let filter = format!(
        "libvmaf=log_path={}:log_fmt=json:n_threads={}:n_subsample={}",
        escape_filter_path(log_path),
        threads.max(1),
        VMAF_SUBSAMPLE
    );

    let mut cmd = EncodeCommand::new("ffmpeg");
    cmd.args(["-hide_banner", "-loglevel", "error"]);
    cmd.arg("-i").arg(candidate);
    cmd.arg("-i").arg(original);
    cmd.arg("-lavfi").arg(filter);
    cmd.args(["-f", "null", "-"]);
    cmd
}

/// [`QualityScorer`] running ffmpeg's libvmaf filter
#[derive(Debug, Clone)]
pub struct LibvmafScorer {
    pub threads: usize,
    /// Directory for the per-evaluation JSON log
    pub log_dir: PathBuf,
    pub filter_available: bool,
}

impl LibvmafScorer {
    pub fn new(threads: usize, filter_available: bool) -> Self {
        Self {
            threads,
            log_dir: std::env::temp_dir(),
            filter_available,
        }
    }
}

impl QualityScorer for LibvmafScorer {
    fn score(&self, original: &Path, candidate: &Path) -> Result<f64, ScoreError> {
        if !self.filter_available {
            return Err(ScoreError::FilterUnavailable);
        }

        let log_path = self
            .log_dir
            .join(format!("vidshrink_vmaf_{}.json", uuid::Uuid::new_v4()));
        let cmd = build_vmaf_cmd(original, candidate, &log_path, self.threads);
        debug!("[VMAF] Command: {}", cmd.display());

        let output = cmd.to_command().output().map_err(ScoreError::Spawn)?;

        let result = if !output.status.success() {
            Err(ScoreError::Failed {
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        } else {
            match std::fs::read_to_string(&log_path) {
                Ok(content) => parse_vmaf_score(&content),
                Err(_) => Err(ScoreError::MissingLog(log_path.clone())),
            }
        };

        // Best effort
        let _ = std::fs::remove_file(&log_path);

        if let Ok(score) = &result {
            debug!("[VMAF] {} => {:.2}", candidate.display(), score);
        }
        result
    }
}
