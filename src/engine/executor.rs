//! Running the external encoder to completion

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::Stdio;
use tracing::{debug, info};

use crate::engine::core::{EncodeCommand, EncodeResult, ProgressParser};
use crate::engine::error::EncodeError;

/// Runs an encode invocation and reports what it produced
pub trait EncodeExecutor {
    /// Block until the encoder exits. `duration_s` only drives progress reporting.
    fn execute(
        &self,
        cmd: &EncodeCommand,
        output_path: &Path,
        duration_s: Option<f64>,
    ) -> Result<EncodeResult, EncodeError>;
}

/// [`EncodeExecutor`] that spawns ffmpeg and follows its `-progress` stream
#[derive(Debug, Clone)]
pub struct FfmpegExecutor {
    /// Progress is logged each time it crosses another multiple of this percentage
    pub progress_log_step_pct: f64,
}

impl Default for FfmpegExecutor {
    fn default() -> Self {
        Self {
            progress_log_step_pct: 10.0,
        }
    }
}

impl EncodeExecutor for FfmpegExecutor {
    fn execute(
        &self,
        cmd: &EncodeCommand,
        output_path: &Path,
        duration_s: Option<f64>,
    ) -> Result<EncodeResult, EncodeError> {
        debug!("Executing command: {}", cmd.display());

        let mut command = cmd.to_command();
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let mut child = command.spawn().map_err(EncodeError::Spawn)?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EncodeError::Io(std::io::Error::other("stderr not captured")))?;
        let stderr_thread = std::thread::spawn(move || {
            let mut stderr_output = String::new();
            let reader = BufReader::new(stderr);
            for line in reader.lines().map_while(Result::ok) {
                stderr_output.push_str(&line);
                stderr_output.push('\n');
            }
            stderr_output
        });

        if let Some(stdout) = child.stdout.take() {
            let reader = BufReader::new(stdout);
            let mut parser = ProgressParser::new();
            let mut next_log_pct = self.progress_log_step_pct;

            for line in reader.lines().map_while(Result::ok) {
                if !parser.parse_line(&line) {
                    continue;
                }
                let pct = parser.progress_pct(duration_s);
                if pct >= next_log_pct && !parser.is_complete {
                    info!(
                        progress = %format!("{:.1}%", pct),
                        fps = ?parser.fps,
                        speed = ?parser.speed,
                        bitrate_kbps = ?parser.bitrate_kbps,
                        written_bytes = ?parser.total_size,
                        "Encoding {}",
                        output_path.display()
                    );
                    while next_log_pct <= pct && self.progress_log_step_pct > 0.0 {
                        next_log_pct += self.progress_log_step_pct;
                    }
                }
            }
        }

        let status = child.wait()?;
        let stderr_output = stderr_thread
            .join()
            .unwrap_or_else(|_| "Failed to capture stderr".to_string());

        for line in stderr_output.lines() {
            debug!("ffmpeg: {}", line);
        }

        if !status.success() {
            return Err(EncodeError::NonZeroExit {
                code: status.code(),
                stderr: stderr_output.trim().to_string(),
            });
        }

        let output_size_bytes = match std::fs::metadata(output_path) {
            Ok(meta) => meta.len(),
            Err(_) => return Err(EncodeError::MissingOutput(output_path.to_path_buf())),
        };

        Ok(EncodeResult {
            output_path: output_path.to_path_buf(),
            output_size_bytes,
        })
    }
}
