use crate::error::{CutError, Result};
use serde::Deserialize;
use std::path::Path;

// ---------------------------------------------------------------------------
// ffprobe JSON output structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Probe a media file's duration in seconds via ffprobe. Used when loading a
/// file whose duration is not already known (deep links, drops).
pub fn duration_seconds(path: impl AsRef<Path>) -> Result<f64> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CutError::FileNotFound(path.to_path_buf()));
    }

    let output = std::process::Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .output()
        .map_err(|e| CutError::FfprobeExec(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CutError::FfprobeFailed(stderr.into_owned()));
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;
    parse_duration(&probe)
        .ok_or_else(|| CutError::FfprobeFailed(format!("no duration for {}", path.display())))
}

fn parse_duration(probe: &FfprobeOutput) -> Option<f64> {
    probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
}
