use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::process::Command;

use super::types::VideoProperties;
use crate::engine::hardware::{EncoderCapabilitySet, VideoEncoder};

/// Source pixel formats re-encoded with the main10 profile instead of being
/// forced through verbatim
pub const MAIN10_SOURCE_PIX_FMTS: &[&str] = &["yuv420p", "yuv420p10le"];

/// Fully resolved external encode invocation: program plus discrete arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeCommand {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl EncodeCommand {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(&mut self, arg: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for a in args {
            self.arg(a);
        }
        self
    }

    /// Value following `flag`, if present
    pub fn value_of(&self, flag: &str) -> Option<&OsStr> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(|a| a.as_os_str())
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// Build a runnable [`Command`]
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    /// Shell-quoted rendering for logs and dry runs
    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|a| {
                let s = a.to_string_lossy();
                match shlex::try_quote(&s) {
                    Ok(quoted) => quoted.into_owned(),
                    Err(_) => format!("{:?}", s),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn apply_pixel_format(cmd: &mut EncodeCommand, source: &VideoProperties) {
    if MAIN10_SOURCE_PIX_FMTS.contains(&source.pix_fmt.as_str()) {
        cmd.args(["-profile:v", "main10"]);
    } else {
        cmd.arg("-pix_fmt").arg(&source.pix_fmt);
    }
}

fn apply_color_metadata(cmd: &mut EncodeCommand, source: &VideoProperties) {
    if let Some(space) = &source.color_space {
        cmd.arg("-colorspace").arg(space);
    }
    if let Some(primaries) = &source.color_primaries {
        cmd.arg("-color_primaries").arg(primaries);
    }
    if let Some(transfer) = &source.color_transfer {
        cmd.arg("-color_trc").arg(transfer);
    }
}

/// Rate-control ceiling for encoders that cap bitrate spikes
pub fn spike_ceiling_kbps(target_kbps: u32, spike_factor: f64) -> u32 {
    (target_kbps as f64 * spike_factor).floor() as u32
}

fn apply_encoder_params(
    cmd: &mut EncodeCommand,
    caps: &EncoderCapabilitySet,
    target_kbps: u32,
    spike_factor: f64,
) {
    match caps.encoder {
        VideoEncoder::Nvenc => {
            cmd.arg("-maxrate:v")
                .arg(format!("{}k", spike_ceiling_kbps(target_kbps, spike_factor)));
            cmd.args(["-preset", "p7"]);
            cmd.args(["-rc", "vbr"]);
            cmd.args(["-spatial_aq", "1"]);
            cmd.args(["-aq-strength", "12"]);
            if caps.supports_temporal_aq {
                cmd.args(["-temporal-aq", "1"]);
            }
        }
        VideoEncoder::VideoToolbox => {
            cmd.args(["-quality", "quality"]);
        }
        VideoEncoder::X265 => {
            cmd.args(["-preset", "medium"]);
            cmd.arg("-x265-params")
                .arg(format!("pools={}", caps.cpu_threads));
        }
    }
}

/// Build the HEVC encode invocation for one attempt
///
/// Audio is copied, only video is re-encoded. Progress is emitted as
/// key=value pairs on stdout for [`super::ProgressParser`].
pub fn build_encode_cmd(
    source: &VideoProperties,
    caps: &EncoderCapabilitySet,
    target_kbps: u32,
    spike_factor: f64,
    output_path: &Path,
) -> EncodeCommand {
    let mut cmd = EncodeCommand::new("ffmpeg");
    cmd.args(["-hide_banner", "-loglevel", "error"]);
    cmd.args(["-progress", "pipe:1", "-nostats"]);

    if caps.encoder == VideoEncoder::Nvenc {
        cmd.args(["-hwaccel", "cuda"]);
        cmd.args(["-hwaccel_output_format", "cuda"]);
    }

    cmd.arg("-i").arg(&source.path);
    cmd.args(["-c:a", "copy"]);
    cmd.arg("-c:v").arg(caps.encoder.ffmpeg_name());
    cmd.arg("-b:v").arg(format!("{}k", target_kbps));
    cmd.args(["-tag:v", "hvc1"]);
    cmd.args(["-map_metadata", "0"]);
    cmd.args(["-movflags", "+use_metadata_tags"]);
    cmd.arg("-y");

    apply_pixel_format(&mut cmd, source);
    apply_color_metadata(&mut cmd, source);
    apply_encoder_params(&mut cmd, caps, target_kbps, spike_factor);

    cmd.arg(output_path);
    cmd
}
