//! Bitrate decisions per resolution class.
//!
//! Everything here is pure: resolution in, Kbps out. Portrait (rotated) videos
//! share the class of their landscape counterpart.

/// A known resolution class with its target bitrate and escalation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionClass {
    pub width: u32,
    pub height: u32,
    pub base_kbps: u32,
    pub step_kbps: u32,
}

/// Supported classes in landscape orientation
pub const RESOLUTION_CLASSES: &[ResolutionClass] = &[
    ResolutionClass {
        width: 1280,
        height: 720,
        base_kbps: 4000,
        step_kbps: 1000,
    },
    ResolutionClass {
        width: 1920,
        height: 1080,
        base_kbps: 8000,
        step_kbps: 2000,
    },
    ResolutionClass {
        width: 3840,
        height: 2160,
        base_kbps: 28000,
        step_kbps: 4000,
    },
];

/// Find the class for a resolution in either orientation
pub fn classify(width: u32, height: u32) -> Option<&'static ResolutionClass> {
    let (long, short) = if width >= height {
        (width, height)
    } else {
        (height, width)
    };
    RESOLUTION_CLASSES
        .iter()
        .find(|c| c.width == long && c.height == short)
}

/// Target bitrate judged sufficient for the resolution, `None` when unsupported
pub fn base_bitrate_for(width: u32, height: u32) -> Option<u32> {
    classify(width, height).map(|c| c.base_kbps)
}

/// Increment applied after a failed quality check, `None` when unsupported
pub fn bitrate_step_for(width: u32, height: u32) -> Option<u32> {
    classify(width, height).map(|c| c.step_kbps)
}

/// True when `current_kbps <= base_kbps * overhead_factor`
pub fn is_acceptable(current_kbps: u64, base_kbps: u32, overhead_factor: f64) -> bool {
    current_kbps as f64 <= base_kbps as f64 * overhead_factor
}

/// `ceil(kbps * seconds / 8)`, i.e. kilobytes
pub fn estimate_output_size_kb(bitrate_kbps: u32, duration_s: f64) -> u64 {
    (bitrate_kbps as f64 * duration_s / 8.0).ceil().max(0.0) as u64
}

/// Estimated output size in bytes (used for reporting only)
pub fn estimate_output_size_bytes(bitrate_kbps: u32, duration_s: f64) -> u64 {
    estimate_output_size_kb(bitrate_kbps, duration_s) * 1000
}

/// Upper bound on encode attempts before the source bitrate itself becomes
/// acceptable at the escalated target.
///
/// Attempt `k` (0-based) encodes at `base + k * step` only while
/// `current > (base + k * step) * overhead`, so at most
/// `ceil((current / overhead - base) / step)` attempts can run. One extra
/// attempt of slack absorbs floating point rounding at the boundary.
pub fn max_attempts(current_kbps: u64, base_kbps: u32, step_kbps: u32, overhead_factor: f64) -> u32 {
    if step_kbps == 0 || overhead_factor <= 0.0 {
        return 1;
    }
    let headroom = current_kbps as f64 / overhead_factor - base_kbps as f64;
    let escalations = (headroom / step_kbps as f64).ceil().max(0.0);
    (escalations as u32).max(1).saturating_add(1)
}
