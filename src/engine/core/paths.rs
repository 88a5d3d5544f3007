use std::path::{Path, PathBuf};

/// Output container extension
pub const OUTPUT_EXTENSION: &str = "mp4";

/// Marker for accepted encodes saved next to their original
pub const OPTIMAL_MARKER: &str = "optimal";

/// Marker for in-flight scratch encodes
pub const SCRATCH_MARKER: &str = "tmp";

/// `<dir>/<stem>.<marker>.mp4`
pub fn sibling_with_marker(path: &Path, marker: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = format!("{}.{}.{}", stem, marker, OUTPUT_EXTENSION);
    match path.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Path the encoder writes to while an attempt is in flight
pub fn scratch_path(original: &Path) -> PathBuf {
    sibling_with_marker(original, SCRATCH_MARKER)
}

/// Path an accepted encode is saved to when not replacing the original
pub fn optimal_path(original: &Path) -> PathBuf {
    sibling_with_marker(original, OPTIMAL_MARKER)
}

fn has_marker(path: &Path, marker: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| {
            n.to_ascii_lowercase()
                .ends_with(&format!(".{}.{}", marker, OUTPUT_EXTENSION))
        })
        .unwrap_or(false)
}

/// Files produced by this tool (scratch or saved-alongside outputs)
pub fn is_auxiliary(path: &Path) -> bool {
    has_marker(path, OPTIMAL_MARKER) || has_marker(path, SCRATCH_MARKER)
}

pub fn is_optimal_output(path: &Path) -> bool {
    has_marker(path, OPTIMAL_MARKER)
}

/// Inverse of [`optimal_path`]: `<dir>/<stem>.optimal.mp4` -> `<dir>/<stem>.mp4`
pub fn strip_optimal_marker(path: &Path) -> Option<PathBuf> {
    if !is_optimal_output(path) {
        return None;
    }
    let name = path.file_name()?.to_str()?;
    let suffix_len = OPTIMAL_MARKER.len() + OUTPUT_EXTENSION.len() + 2;
    let base = &name[..name.len() - suffix_len];
    if base.is_empty() {
        return None;
    }
    let file_name = format!("{}.{}", base, OUTPUT_EXTENSION);
    Some(match path.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    })
}
