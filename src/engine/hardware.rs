//! HEVC encoder detection and host capability probing

use serde::Serialize;
use std::process::Command;
use sysinfo::{CpuRefreshKind, RefreshKind, System};
use tracing::{debug, info};

use crate::engine::core::{ffmpeg_version, ffprobe_version};
use crate::engine::error::CapabilityError;

// ============================================================================
// Video Encoder Selection
// ============================================================================

/// Supported HEVC encoders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VideoEncoder {
    VideoToolbox, // Apple VideoToolbox
    Nvenc,        // NVIDIA NVENC
    X265,         // Software libx265
}

impl VideoEncoder {
    /// Get the FFmpeg encoder name
    pub fn ffmpeg_name(&self) -> &'static str {
        match self {
            Self::VideoToolbox => "hevc_videotoolbox",
            Self::Nvenc => "hevc_nvenc",
            Self::X265 => "libx265",
        }
    }

    /// Check if this is a hardware encoder
    pub fn is_hardware(&self) -> bool {
        !matches!(self, Self::X265)
    }

    /// Get user-friendly display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::VideoToolbox => "HEVC VideoToolbox (Apple)",
            Self::Nvenc => "HEVC NVENC (NVIDIA)",
            Self::X265 => "libx265 (Software)",
        }
    }
}

/// Capabilities resolved once per run, read-only afterwards
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncoderCapabilitySet {
    pub encoder: VideoEncoder,
    pub supports_temporal_aq: bool,
    pub supports_quality_scoring: bool,
    /// Logical CPUs, sizes the x265 pool and libvmaf threads
    pub cpu_threads: usize,
}

/// Resolves the capability set for the host
pub trait CapabilityProbe {
    fn detect(&self, prefer_software: bool) -> Result<EncoderCapabilitySet, CapabilityError>;
}

/// What the local ffmpeg build reports
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FfmpegListing {
    pub videotoolbox: bool,
    pub nvenc: bool,
    pub x265: bool,
    pub nvenc_temporal_aq: bool,
    pub libvmaf: bool,
}

impl FfmpegListing {
    /// Build from `-encoders`, `-filters` and `-h encoder=hevc_nvenc` output
    pub fn parse(encoders: &str, filters: &str, nvenc_help: &str) -> Self {
        let nvenc = encoders.contains("hevc_nvenc");
        Self {
            videotoolbox: encoders.contains("hevc_videotoolbox"),
            nvenc,
            x265: encoders.contains("libx265"),
            nvenc_temporal_aq: nvenc && nvenc_help.contains("temporal"),
            libvmaf: filters.contains("libvmaf"),
        }
    }
}

/// Select the encoder and optional features from a listing
///
/// Hardware preference order: VideoToolbox, then NVENC. Software only when
/// requested; there is no silent fallback from hardware to software.
pub fn resolve_capabilities(
    listing: &FfmpegListing,
    prefer_software: bool,
    cpu_threads: usize,
) -> Result<EncoderCapabilitySet, CapabilityError> {
    let encoder = if prefer_software {
        if !listing.x265 {
            return Err(CapabilityError::SoftwareEncoderMissing);
        }
        VideoEncoder::X265
    } else if listing.videotoolbox {
        VideoEncoder::VideoToolbox
    } else if listing.nvenc {
        VideoEncoder::Nvenc
    } else {
        return Err(CapabilityError::NoHardwareEncoder);
    };

    Ok(EncoderCapabilitySet {
        encoder,
        supports_temporal_aq: encoder == VideoEncoder::Nvenc && listing.nvenc_temporal_aq,
        supports_quality_scoring: listing.libvmaf,
        cpu_threads: cpu_threads.max(1),
    })
}

/// [`CapabilityProbe`] that queries the `ffmpeg` binary on PATH
#[derive(Debug, Clone, Default)]
pub struct FfmpegCapabilityProbe;

fn ffmpeg_stdout(args: &[&str]) -> String {
    Command::new("ffmpeg")
        .args(args)
        .output()
        .ok()
        .map(|o| {
            // `-h encoder=` prints to stdout, some builds print banners to stderr
            let mut text = String::from_utf8_lossy(&o.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&o.stderr));
            text
        })
        .unwrap_or_default()
}

/// Logical CPU count of the host
pub fn detect_cpu_threads() -> usize {
    let sys = System::new_with_specifics(
        RefreshKind::new().with_cpu(CpuRefreshKind::new()),
    );
    sys.cpus().len().max(1)
}

impl CapabilityProbe for FfmpegCapabilityProbe {
    fn detect(&self, prefer_software: bool) -> Result<EncoderCapabilitySet, CapabilityError> {
        let ffmpeg = ffmpeg_version().map_err(|_| CapabilityError::ToolMissing("ffmpeg"))?;
        let ffprobe = ffprobe_version().map_err(|_| CapabilityError::ToolMissing("ffprobe"))?;
        debug!("{}", ffmpeg);
        debug!("{}", ffprobe);

        let encoders = ffmpeg_stdout(&["-hide_banner", "-encoders"]);
        let filters = ffmpeg_stdout(&["-hide_banner", "-filters"]);
        let nvenc_help = if encoders.contains("hevc_nvenc") {
            ffmpeg_stdout(&["-hide_banner", "-h", "encoder=hevc_nvenc"])
        } else {
            String::new()
        };

        let listing = FfmpegListing::parse(&encoders, &filters, &nvenc_help);
        debug!(?listing, "ffmpeg capability listing");

        let caps = resolve_capabilities(&listing, prefer_software, detect_cpu_threads())?;
        info!(
            encoder = caps.encoder.ffmpeg_name(),
            temporal_aq = caps.supports_temporal_aq,
            vmaf = caps.supports_quality_scoring,
            threads = caps.cpu_threads,
            "Using {}",
            caps.encoder.display_name()
        );
        Ok(caps)
    }
}
