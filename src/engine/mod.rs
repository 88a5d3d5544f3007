// Transcode engine - independent of the command line

pub mod batch;
pub mod controller;
pub mod core;
pub mod error;
pub mod executor;
pub mod hardware;
pub mod policy;
pub mod probe;
pub mod rename;
pub mod settings;
pub mod vmaf;

pub use batch::{BatchReport, BatchRunner, FileFailure};
pub use controller::{Step, TranscodeController, TranscodeState};
pub use self::core::*;
pub use error::{CapabilityError, EncodeError, ProbeError, ScoreError, TranscodeError};
pub use executor::{EncodeExecutor, FfmpegExecutor};
pub use hardware::{
    CapabilityProbe, EncoderCapabilitySet, FfmpegCapabilityProbe, FfmpegListing, VideoEncoder,
};
pub use probe::{FfprobeProbe, MediaProbe};
pub use rename::{Promotion, RenameReport, promote_optimal_files};
pub use settings::{RunConfig, TranscodeSettings};
pub use vmaf::{LibvmafScorer, QualityScorer};
