use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use super::paths::{OUTPUT_EXTENSION, is_auxiliary, optimal_path};
use super::types::VideoProperties;
use crate::engine::policy::{base_bitrate_for, estimate_output_size_bytes, is_acceptable};
use crate::engine::probe::MediaProbe;
use crate::engine::settings::TranscodeSettings;

/// Check if a path has the container extension this tool processes
pub fn is_candidate_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(OUTPUT_EXTENSION))
        .unwrap_or(false)
}

/// Scan a directory recursively for candidate files and invoke a callback for each file found
pub fn scan_streaming<F>(root: &Path, mut on_file: F)
where
    F: FnMut(PathBuf),
{
    // Symlinked trees are not followed; a link loop would never finish
    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if entry.file_type().is_file() && is_candidate_file(path) {
            on_file(path.to_path_buf());
        }
    }
}

/// Scan a directory recursively for candidate files, in discovery order
pub fn scan(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    scan_streaming(root, |path| files.push(path));
    files
}

/// Why a discovered file will not be transcoded
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Scratch or saved-alongside output of an earlier run
    AuxiliaryFile,
    ProbeFailed { message: String },
    UnsupportedResolution { width: u32, height: u32 },
    AlreadyAcceptable { kbps: u64 },
    OptimalExists { path: PathBuf },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuxiliaryFile => write!(f, "auxiliary file"),
            Self::ProbeFailed { message } => write!(f, "probe failed: {}", message),
            Self::UnsupportedResolution { width, height } => {
                write!(f, "unsupported resolution {}x{}", width, height)
            }
            Self::AlreadyAcceptable { kbps } => {
                write!(f, "bitrate {} Kbps is acceptable, no action needed", kbps)
            }
            Self::OptimalExists { path } => {
                write!(f, "optimal version already exists ({})", path.display())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Sizes before and after, assuming every candidate lands at its base bitrate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub current_bytes: u64,
    pub projected_bytes: u64,
}

impl Projection {
    pub fn savings_bytes(&self) -> i64 {
        self.current_bytes as i64 - self.projected_bytes as i64
    }
}

/// Files that need processing, plus everything that was passed over
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchPlan {
    pub candidates: Vec<VideoProperties>,
    pub skipped: Vec<SkippedFile>,
}

impl BatchPlan {
    pub fn files_considered(&self) -> usize {
        self.candidates.len() + self.skipped.len()
    }

    pub fn projection(&self) -> Projection {
        self.candidates
            .iter()
            .fold(Projection::default(), |mut acc, file| {
                acc.current_bytes += file.size_bytes;
                acc.projected_bytes += projected_size_bytes(file);
                acc
            })
    }
}

/// Estimated size of a candidate encoded at its base bitrate
pub fn projected_size_bytes(file: &VideoProperties) -> u64 {
    base_bitrate_for(file.width, file.height)
        .map(|base| estimate_output_size_bytes(base, file.duration_s))
        .unwrap_or(file.size_bytes)
}

/// Decide whether one file needs processing
pub fn classify_file(
    path: &Path,
    probe: &dyn MediaProbe,
    settings: &TranscodeSettings,
) -> Result<VideoProperties, SkipReason> {
    if is_auxiliary(path) {
        return Err(SkipReason::AuxiliaryFile);
    }

    let props = probe.probe(path).map_err(|e| SkipReason::ProbeFailed {
        message: e.to_string(),
    })?;

    let Some(base) = base_bitrate_for(props.width, props.height) else {
        return Err(SkipReason::UnsupportedResolution {
            width: props.width,
            height: props.height,
        });
    };

    if is_acceptable(props.bitrate_kbps(), base, settings.overhead_factor) {
        return Err(SkipReason::AlreadyAcceptable {
            kbps: props.bitrate_kbps(),
        });
    }

    if !settings.overwrite {
        let optimal = optimal_path(path);
        if optimal.exists() {
            return Err(SkipReason::OptimalExists { path: optimal });
        }
    }

    Ok(props)
}

/// Walk `dirs` in order and sort every discovered file into candidates or skips
pub fn gather_candidates(
    dirs: &[PathBuf],
    probe: &dyn MediaProbe,
    settings: &TranscodeSettings,
) -> BatchPlan {
    let mut plan = BatchPlan::default();

    for dir in dirs {
        info!("Directory: {}", dir.display());
        scan_streaming(dir, |path| match classify_file(&path, probe, settings) {
            Ok(props) => {
                info!(
                    width = props.width,
                    height = props.height,
                    kbps = props.bitrate_kbps(),
                    pix_fmt = %props.pix_fmt,
                    current_bytes = props.size_bytes,
                    projected_bytes = projected_size_bytes(&props),
                    "Candidate: {}",
                    path.display()
                );
                plan.candidates.push(props);
            }
            Err(reason) => {
                warn!("Skipping {}: {}", path.display(), reason);
                plan.skipped.push(SkippedFile { path, reason });
            }
        });
    }

    plan
}
