// Batch statistics and human-readable summaries

use serde::Serialize;
use std::fmt;

use crate::engine::{BatchPlan, Projection};

/// Aggregate counters for one batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    /// Every discovered file, skipped or not
    pub files_considered: usize,

    /// Files passed over during planning
    pub files_skipped: usize,

    /// Candidates whose transcode failed
    pub files_errored: usize,

    /// Sum of candidate sizes before the run
    pub total_original_size: u64,

    /// Sum of candidate sizes after the run (errored files keep their original size)
    pub total_final_size: u64,
}

impl BatchStats {
    /// Seed counters from the plan, before any candidate is processed
    pub fn from_plan(plan: &BatchPlan) -> Self {
        Self {
            files_considered: plan.files_considered(),
            files_skipped: plan.skipped.len(),
            ..Self::default()
        }
    }

    /// Record a candidate that reached a terminal state
    pub fn record_completed(&mut self, original_size: u64, final_size: u64) {
        self.total_original_size += original_size;
        self.total_final_size += final_size;
    }

    /// Record a candidate whose transcode failed; its original is left in place
    pub fn record_errored(&mut self, original_size: u64) {
        self.files_errored += 1;
        self.total_original_size += original_size;
        self.total_final_size += original_size;
    }

    pub fn savings_bytes(&self) -> i64 {
        self.total_original_size as i64 - self.total_final_size as i64
    }
}

impl fmt::Display for BatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Files Considered: {}", self.files_considered)?;
        writeln!(f, "Skipped Files: {}", self.files_skipped)?;
        writeln!(f, "Errored Files: {}", self.files_errored)?;
        writeln!(f, "Total Original Size: {}", format_bytes(self.total_original_size))?;
        writeln!(f, "Total Actual Size: {}", format_bytes(self.total_final_size))?;
        write!(f, "Total Actual Savings: {}", format_savings(self.savings_bytes()))
    }
}

/// Multi-line summary of a plan's projection
pub fn format_projection(projection: &Projection, skipped: usize) -> String {
    format!(
        "Total Current Size: {}\nTotal Projected Size: {}\nTotal Projected Savings: {}\nSkipped Files: {}",
        format_bytes(projection.current_bytes),
        format_bytes(projection.projected_bytes),
        format_savings(projection.savings_bytes()),
        skipped
    )
}

/// Format a signed size difference
pub fn format_savings(savings: i64) -> String {
    if savings >= 0 {
        format!("{} saved", format_bytes(savings as u64))
    } else {
        format!("{} larger", format_bytes(savings.unsigned_abs()))
    }
}

/// Format bytes as human-readable size
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format duration in seconds as human-readable time
pub fn format_duration(seconds: f64) -> String {
    let total_secs = seconds as u64;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}
