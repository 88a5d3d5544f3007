// Input probing using ffprobe

use serde::Deserialize;
use std::path::Path;
use std::process::Command;
use tracing::debug;

use crate::engine::core::VideoProperties;
use crate::engine::error::ProbeError;

/// Reports the technical properties of a file. Pure query, no mutation.
pub trait MediaProbe {
    fn probe(&self, path: &Path) -> Result<VideoProperties, ProbeError>;
}

/// [`MediaProbe`] backed by the `ffprobe` binary
#[derive(Debug, Clone, Default)]
pub struct FfprobeProbe;

impl MediaProbe for FfprobeProbe {
    fn probe(&self, path: &Path) -> Result<VideoProperties, ProbeError> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0", // First video stream only
                "-show_entries",
                "stream=width,height,bit_rate,pix_fmt,codec_name,color_space,color_primaries,color_transfer,duration",
                "-of",
                "json",
            ])
            .arg(path)
            .output()
            .map_err(ProbeError::Spawn)?;

        if !output.status.success() {
            return Err(ProbeError::Failed {
                path: path.to_path_buf(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let json_str = String::from_utf8_lossy(&output.stdout);
        debug!(path = %path.display(), "ffprobe output: {}", json_str.trim());

        let size_bytes = std::fs::metadata(path)
            .map_err(|source| ProbeError::Metadata {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        parse_ffprobe_stream(path, &json_str, size_bytes)
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    width: Option<u32>,
    height: Option<u32>,
    bit_rate: Option<String>,
    pix_fmt: Option<String>,
    codec_name: Option<String>,
    duration: Option<String>,
    color_space: Option<String>,
    color_primaries: Option<String>,
    color_transfer: Option<String>,
}

/// Drop tags ffprobe reports as "unknown" so they are never propagated
fn known_tag(tag: Option<String>) -> Option<String> {
    tag.filter(|t| !t.is_empty() && t != "unknown")
}

/// Parse ffprobe JSON for the first video stream into [`VideoProperties`]
pub fn parse_ffprobe_stream(
    path: &Path,
    json: &str,
    size_bytes: u64,
) -> Result<VideoProperties, ProbeError> {
    let probe: FfprobeOutput = serde_json::from_str(json)?;

    let raw = probe
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| ProbeError::NoVideoStream(path.to_path_buf()))?;
    let raw_text = raw.to_string();
    let stream: FfprobeStream = serde_json::from_value(raw)?;

    let missing = || ProbeError::MissingFields {
        path: path.to_path_buf(),
        json: raw_text.clone(),
    };

    let width = stream.width.ok_or_else(missing)?;
    let height = stream.height.ok_or_else(missing)?;
    let bit_rate_bps = stream
        .bit_rate
        .as_deref()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .ok_or_else(missing)?;
    let pix_fmt = stream.pix_fmt.ok_or_else(missing)?;
    let codec_name = stream.codec_name.ok_or_else(missing)?;
    let duration_s = stream
        .duration
        .as_deref()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .ok_or_else(missing)?;

    if width == 0 || height == 0 {
        return Err(ProbeError::InvalidProperties {
            path: path.to_path_buf(),
            reason: format!("dimensions {}x{}", width, height),
        });
    }
    if duration_s.is_nan() || duration_s <= 0.0 {
        return Err(ProbeError::InvalidProperties {
            path: path.to_path_buf(),
            reason: format!("duration {}", duration_s),
        });
    }

    Ok(VideoProperties {
        path: path.to_path_buf(),
        width,
        height,
        bit_rate_bps,
        pix_fmt,
        codec_name,
        duration_s,
        size_bytes,
        color_space: known_tag(stream.color_space),
        color_primaries: known_tag(stream.color_primaries),
        color_transfer: known_tag(stream.color_transfer),
    })
}
