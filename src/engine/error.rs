//! Typed failures for every external collaborator and for the transcode loop.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to read the technical properties of a source file.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Failed to run ffprobe: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("ffprobe failed for {}: {stderr}", .path.display())]
    Failed { path: PathBuf, stderr: String },

    #[error("Failed to parse ffprobe JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No video stream found in {}", .0.display())]
    NoVideoStream(PathBuf),

    #[error("Not all required fields found in video stream of {}: {json}", .path.display())]
    MissingFields { path: PathBuf, json: String },

    #[error("Invalid video properties for {}: {reason}", .path.display())]
    InvalidProperties { path: PathBuf, reason: String },

    #[error("Failed to read file metadata for {}: {source}", .path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Run-wide precondition failure. Nothing is encoded when one of these occurs.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("{0} not found. Is it installed and in PATH?")]
    ToolMissing(&'static str),

    #[error("No hardware HEVC encoder found (neither VideoToolbox nor NVENC); use --use-cpu")]
    NoHardwareEncoder,

    #[error("Software HEVC encoder libx265 is not available in ffmpeg")]
    SoftwareEncoderMissing,

    #[error("Quality check requested but the libvmaf filter is not available in ffmpeg")]
    QualityScoringUnavailable,
}

/// Failure of one external encode invocation.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Failed to spawn ffmpeg: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("ffmpeg exited with {}: {stderr}", exit_code_label(.code))]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("ffmpeg reported success but produced no output at {}", .0.display())]
    MissingOutput(PathBuf),

    #[error("I/O error while encoding: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {}", c),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Failure of one perceptual quality comparison.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("VMAF filter is not available in ffmpeg")]
    FilterUnavailable,

    #[error("Failed to spawn VMAF evaluation: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("VMAF evaluation failed: {stderr}")]
    Failed { stderr: String },

    #[error("VMAF evaluation produced no log at {}", .0.display())]
    MissingLog(PathBuf),

    #[error("Failed to parse VMAF output: {0}")]
    Unparsable(String),
}

/// Fatal outcome for a single file inside the transcode loop.
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Unsupported resolution {width}x{height} for {}", .path.display())]
    UnsupportedResolution {
        path: PathBuf,
        width: u32,
        height: u32,
    },

    #[error("Encoding {} at {bitrate_kbps}k failed: {source}", .path.display())]
    Encode {
        path: PathBuf,
        bitrate_kbps: u32,
        #[source]
        source: EncodeError,
    },

    #[error("Quality scoring of {} at {bitrate_kbps}k failed: {source}", .path.display())]
    Score {
        path: PathBuf,
        bitrate_kbps: u32,
        #[source]
        source: ScoreError,
    },

    #[error("No bitrate step defined for {width}x{height} ({}); refusing to escalate", .path.display())]
    NoBitrateStep {
        path: PathBuf,
        width: u32,
        height: u32,
    },

    #[error("Escalation limit of {limit} attempts exceeded for {} at {bitrate_kbps}k", .path.display())]
    AttemptLimit {
        path: PathBuf,
        limit: u32,
        bitrate_kbps: u32,
    },

    #[error("Failed to finalize {}: {source}", .path.display())]
    Finalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TranscodeError {
    /// True for defects in the escalation logic rather than tool or I/O failures.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::NoBitrateStep { .. } | Self::AttemptLimit { .. }
        )
    }
}
