mod ffmpeg_cmd;
mod ffmpeg_info;
mod log;
mod paths;
mod scan;
mod types;

pub use ffmpeg_cmd::{
    EncodeCommand, MAIN10_SOURCE_PIX_FMTS, build_encode_cmd, spike_ceiling_kbps,
};
pub use ffmpeg_info::{ffmpeg_version, ffprobe_version};
pub use log::{OutcomeLog, OutcomeRecord, OutcomeSink};
pub use paths::{
    OPTIMAL_MARKER, OUTPUT_EXTENSION, SCRATCH_MARKER, is_auxiliary, is_optimal_output,
    optimal_path, scratch_path, sibling_with_marker, strip_optimal_marker,
};
pub use scan::{
    BatchPlan, Projection, SkipReason, SkippedFile, classify_file, gather_candidates,
    is_candidate_file, projected_size_bytes, scan, scan_streaming,
};
pub use types::{
    EncodeResult, OutcomeKind, ProgressParser, TranscodeOutcome, TranscodeTarget,
    VideoProperties,
};
