use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::types::TranscodeOutcome;

/// Destination for finalized outcomes
pub trait OutcomeSink {
    fn record(&mut self, outcome: &TranscodeOutcome) -> Result<()>;
}

impl OutcomeSink for Vec<TranscodeOutcome> {
    fn record(&mut self, outcome: &TranscodeOutcome) -> Result<()> {
        self.push(outcome.clone());
        Ok(())
    }
}

/// One line of the outcome log
#[derive(Debug, Serialize)]
pub struct OutcomeRecord<'a> {
    /// RFC 3339, local time
    pub timestamp: String,
    pub original_path: &'a Path,
    pub original_size_bytes: u64,
    pub final_path: &'a Path,
    pub final_size_bytes: u64,
    pub bitrate_kbps: u32,
    pub quality_score: Option<f64>,
}

impl<'a> OutcomeRecord<'a> {
    pub fn new(outcome: &'a TranscodeOutcome, timestamp: DateTime<Local>) -> Self {
        Self {
            timestamp: timestamp.to_rfc3339(),
            original_path: &outcome.original_path,
            original_size_bytes: outcome.original_size_bytes,
            final_path: &outcome.final_path,
            final_size_bytes: outcome.final_size_bytes,
            bitrate_kbps: outcome.bitrate_kbps,
            quality_score: outcome.quality_score,
        }
    }
}

/// Appends one JSON object per line to a file, creating it if needed
#[derive(Debug, Clone)]
pub struct OutcomeLog {
    path: PathBuf,
}

impl OutcomeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutcomeSink for OutcomeLog {
    fn record(&mut self, outcome: &TranscodeOutcome) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create outcome log directory: {}", parent.display())
                })?;
            }
        }

        let line = serde_json::to_string(&OutcomeRecord::new(outcome, Local::now()))
            .context("Failed to serialize outcome")?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open outcome log: {}", self.path.display()))?;
        writeln!(file, "{}", line)
            .with_context(|| format!("Failed to write outcome log: {}", self.path.display()))?;
        Ok(())
    }
}
