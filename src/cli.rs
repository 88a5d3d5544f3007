use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use vidshrink::config::RunFlags;

#[derive(Parser)]
#[command(name = "vidshrink")]
#[command(about = "Shrink oversized videos to HEVC while holding a VMAF quality bar", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Re-encode videos whose bitrate is above the target for their resolution
    Videos(VideosArgs),

    /// Rename <name>.optimal.mp4 files over their originals
    Rename {
        /// Only show what would be renamed
        #[arg(long)]
        dry_run: bool,

        /// Directories to scan
        #[arg(value_name = "DIRECTORY", required = true)]
        directories: Vec<PathBuf>,
    },

    /// Check if ffmpeg and ffprobe are installed
    CheckFfmpeg,

    /// Probe a video file and print its properties
    Probe {
        /// Path to the video file
        file: PathBuf,
    },

    /// Show config status and location, or create default config if missing
    InitConfig,
}

#[derive(Args)]
pub struct VideosArgs {
    /// Scan and show projected savings without encoding
    #[arg(long)]
    pub dry_run: bool,

    /// Replace original files instead of saving <name>.optimal.mp4 alongside
    #[arg(long)]
    pub replace_existing: bool,

    /// Verify each encode with VMAF and raise the bitrate until it passes
    #[arg(long)]
    pub check_quality: bool,

    /// Use the libx265 software encoder instead of hardware encoding
    #[arg(long)]
    pub use_cpu: bool,

    /// Re-process files that already have an optimal version
    #[arg(long)]
    pub overwrite: bool,

    /// Append outcomes to this file instead of the configured log
    #[arg(long, value_name = "PATH")]
    pub outcome_log: Option<PathBuf>,

    /// Directories to scan
    #[arg(value_name = "DIRECTORY", required = true)]
    pub directories: Vec<PathBuf>,
}

impl VideosArgs {
    pub fn flags(&self) -> RunFlags {
        RunFlags {
            check_quality: self.check_quality,
            replace_existing: self.replace_existing,
            use_cpu: self.use_cpu,
            overwrite: self.overwrite,
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
