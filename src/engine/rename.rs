//! Promote saved-alongside outputs over their originals

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::engine::core::{is_optimal_output, scan_streaming, strip_optimal_marker};

/// One `<stem>.optimal.mp4` and the original it replaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Promotion {
    pub optimal_path: PathBuf,
    pub target_path: PathBuf,
    /// `None` when the original is already gone
    pub original_size: Option<u64>,
    pub optimal_size: u64,
}

impl Promotion {
    pub fn savings_bytes(&self) -> i64 {
        self.original_size
            .map(|orig| orig as i64 - self.optimal_size as i64)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenameReport {
    pub promotions: Vec<Promotion>,
    pub dry_run: bool,
}

impl RenameReport {
    pub fn total_savings_bytes(&self) -> i64 {
        self.promotions.iter().map(Promotion::savings_bytes).sum()
    }
}

/// Find every saved-alongside output under `dirs`, in discovery order
pub fn find_promotions(dirs: &[PathBuf]) -> Result<Vec<Promotion>> {
    let mut found = Vec::new();
    let mut first_error = None;

    for dir in dirs {
        scan_streaming(dir, |path| {
            if !is_optimal_output(&path) {
                return;
            }
            let Some(target_path) = strip_optimal_marker(&path) else {
                return;
            };
            match fs::metadata(&path) {
                Ok(meta) => found.push(Promotion {
                    original_size: fs::metadata(&target_path).ok().map(|m| m.len()),
                    optimal_size: meta.len(),
                    optimal_path: path,
                    target_path,
                }),
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(
                            anyhow::Error::new(e)
                                .context(format!("Failed to read metadata: {}", path.display())),
                        );
                    }
                }
            }
        });
    }

    match first_error {
        Some(e) if found.is_empty() => Err(e),
        Some(e) => {
            warn!("{:#}", e);
            Ok(found)
        }
        None => Ok(found),
    }
}

/// Rename each `X.optimal.mp4` to `X.mp4`; with `dry_run` nothing is moved
pub fn promote_optimal_files(dirs: &[PathBuf], dry_run: bool) -> Result<RenameReport> {
    let promotions = find_promotions(dirs)?;

    for p in &promotions {
        if dry_run {
            info!(
                "Would rename {} -> {}",
                p.optimal_path.display(),
                p.target_path.display()
            );
            continue;
        }
        fs::rename(&p.optimal_path, &p.target_path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                p.optimal_path.display(),
                p.target_path.display()
            )
        })?;
        info!(
            "Renamed {} -> {}",
            p.optimal_path.display(),
            p.target_path.display()
        );
    }

    Ok(RenameReport {
        promotions,
        dry_run,
    })
}
