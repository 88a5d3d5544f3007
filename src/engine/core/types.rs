use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Technical properties of a source video, produced once per file by the probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoProperties {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub bit_rate_bps: u64,
    pub pix_fmt: String,
    pub codec_name: String,
    pub duration_s: f64,
    pub size_bytes: u64,
    pub color_space: Option<String>,
    pub color_primaries: Option<String>,
    pub color_transfer: Option<String>,
}

impl VideoProperties {
    /// Current video bitrate in Kbps, 1024 bits per kilobit, as the acceptance
    /// check has always measured it. Encode targets (`-b:v Nk`) are not derived from this.
    pub fn bitrate_kbps(&self) -> u64 {
        self.bit_rate_bps / 1024
    }
}

/// Per-attempt state owned by the controller for one file
#[derive(Debug, Clone)]
pub struct TranscodeTarget {
    pub source: VideoProperties,
    pub bitrate_kbps: u32,
    pub attempts: u32,
}

impl TranscodeTarget {
    pub fn new(source: VideoProperties, base_bitrate_kbps: u32) -> Self {
        Self {
            source,
            bitrate_kbps: base_bitrate_kbps,
            attempts: 0,
        }
    }
}

/// Successful encode of one attempt
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeResult {
    pub output_path: PathBuf,
    pub output_size_bytes: u64,
}

/// How a file left the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// Source bitrate already acceptable; nothing was encoded
    Untouched,
    /// Original replaced in place by the accepted encode
    Replaced,
    /// Accepted encode saved next to the original
    SavedAlongside,
}

/// Structured record of one file's terminal `Accepted` state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscodeOutcome {
    pub kind: OutcomeKind,
    pub original_path: PathBuf,
    pub original_size_bytes: u64,
    pub final_path: PathBuf,
    pub final_size_bytes: u64,
    pub bitrate_kbps: u32,
    pub quality_score: Option<f64>,
    pub attempts: u32,
}

impl TranscodeOutcome {
    /// Whether the outcome produced a new file (and belongs in the outcome log)
    pub fn is_finalized(&self) -> bool {
        self.kind != OutcomeKind::Untouched
    }
}

/// Parser for ffmpeg progress output (key=value format)
#[derive(Debug, Default, Clone)]
pub struct ProgressParser {
    pub out_time_us: u64,
    pub fps: Option<f64>,
    pub speed: Option<f64>,
    pub bitrate_kbps: Option<f64>,
    pub total_size: Option<u64>,
    pub is_complete: bool,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a single line of ffmpeg progress output.
    /// Returns true when the line closes a progress block.
    pub fn parse_line(&mut self, line: &str) -> bool {
        let Some((key, value)) = line.split_once('=') else {
            return false;
        };
        let value = value.trim();
        match key.trim() {
            "out_time_us" => {
                if let Ok(us) = value.parse::<u64>() {
                    self.out_time_us = us;
                }
            }
            "fps" => {
                if let Ok(f) = value.parse::<f64>() {
                    self.fps = Some(f);
                }
            }
            "speed" => {
                // "1.23x"
                if let Ok(s) = value.trim_end_matches('x').parse::<f64>() {
                    self.speed = Some(s);
                }
            }
            "bitrate" => {
                // "123.4kbits/s"
                if let Ok(b) = value.trim_end_matches("kbits/s").parse::<f64>() {
                    self.bitrate_kbps = Some(b);
                }
            }
            "total_size" => {
                if let Ok(size) = value.parse::<u64>() {
                    self.total_size = Some(size);
                }
            }
            "progress" => {
                if value == "end" {
                    self.is_complete = true;
                }
                return true;
            }
            _ => {}
        }
        false
    }

    /// Get output time in seconds
    pub fn out_time_s(&self) -> f64 {
        self.out_time_us as f64 / 1_000_000.0
    }

    /// Calculate progress percentage given total duration
    pub fn progress_pct(&self, duration_s: Option<f64>) -> f64 {
        if let Some(dur) = duration_s {
            if dur > 0.0 {
                return (self.out_time_s() / dur * 100.0).min(100.0);
            }
        }
        0.0
    }
}
