use crate::error::{CutError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use veelo_core::types::{TrimRange, VideoFile};

/// Fixed encoding policy: not user-configurable.
pub const VIDEO_BITRATE: &str = "900k";
pub const OUTPUT_WIDTH: u32 = 750;

/// Suffix appended to the source stem when deriving a default output name.
const OUTPUT_SUFFIX: &str = " - chopped";

// ---------------------------------------------------------------------------
// Request and plan
// ---------------------------------------------------------------------------

/// A single cut: trim `input` to `[start, start + duration)` and re-encode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutRequest {
    pub input: PathBuf,
    pub start_seconds: f64,
    pub duration_seconds: f64,
    /// Explicit output path; `None` derives one in the downloads directory.
    pub output: Option<PathBuf>,
}

impl CutRequest {
    pub fn from_selection(file: &VideoFile, range: &TrimRange) -> Self {
        Self {
            input: file.path.clone(),
            start_seconds: range.start,
            duration_seconds: range.duration(),
            output: None,
        }
    }
}

/// A compiled cut ready for ffmpeg execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutPlan {
    pub args: Vec<String>,
    pub output_path: PathBuf,
    pub duration_seconds: f64,
}

/// Progress update during a cut. Percent is an engine-reported estimate and
/// is not guaranteed monotonic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CutProgress {
    pub percent: f64,
}

/// Compile a request into ffmpeg arguments, resolving the output path.
pub fn compile(request: &CutRequest) -> Result<CutPlan> {
    let output_path = match &request.output {
        Some(path) => path.clone(),
        None => {
            let downloads = dirs::download_dir().ok_or(CutError::NoDownloadsDir)?;
            derive_output_path(&downloads, &request.input)?
        }
    };

    Ok(CutPlan {
        args: build_ffmpeg_args(request, &output_path),
        output_path,
        duration_seconds: request.duration_seconds,
    })
}

/// `-ss` before `-i` trims on input; bitrate and width are fixed policy, with
/// `scale=750:-2` keeping the height proportional and even.
pub fn build_ffmpeg_args(request: &CutRequest, output_path: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-ss".to_string(),
        format!("{}", request.start_seconds),
        "-i".to_string(),
        request.input.to_string_lossy().to_string(),
        "-t".to_string(),
        format!("{}", request.duration_seconds),
        "-b:v".to_string(),
        VIDEO_BITRATE.to_string(),
        "-vf".to_string(),
        format!("scale={OUTPUT_WIDTH}:-2"),
        output_path.to_string_lossy().to_string(),
    ]
}

/// Default output naming: `"<stem> - chopped<ext>"` in `dir`. One scan of the
/// directory counts names already containing the derived stem; any matches
/// append `" - <count>"`. Not unique under races, which is acceptable here.
pub fn derive_output_path(dir: &Path, input: &Path) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    let ext = input
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut name = format!("{stem}{OUTPUT_SUFFIX}");
    let existing = matching_files_in_dir(dir, &name)?;
    if existing > 0 {
        name.push_str(&format!(" - {existing}"));
    }

    Ok(dir.join(format!("{name}{ext}")))
}

fn matching_files_in_dir(dir: &Path, needle: &str) -> Result<usize> {
    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().contains(needle) {
            count += 1;
        }
    }
    Ok(count)
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Execute a cut plan by spawning ffmpeg. Progress estimates go out on the
/// watch channel; the terminal result carries the output path or the engine
/// error. Exactly one attempt, no cleanup of partial output on failure.
pub async fn execute(
    plan: &CutPlan,
    progress_tx: tokio::sync::watch::Sender<CutProgress>,
) -> Result<PathBuf> {
    use std::process::Stdio;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::process::Command;

    tracing::info!(output = %plan.output_path.display(), "starting cut");

    let mut child = Command::new("ffmpeg")
        .args(&plan.args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CutError::FfmpegNotFound
            } else {
                CutError::Io(e)
            }
        })?;

    let stderr = child.stderr.take().expect("stderr was piped");
    let reader = BufReader::new(stderr);
    let mut lines = reader.lines();

    let mut last_line = String::new();
    while let Ok(Some(line)) = lines.next_line().await {
        if let Some(progress) = parse_progress(&line, plan.duration_seconds) {
            let _ = progress_tx.send(progress);
        } else if !line.trim().is_empty() {
            last_line = line;
        }
    }

    let status = child.wait().await.map_err(CutError::Io)?;
    if !status.success() {
        let detail = if last_line.is_empty() {
            format!("ffmpeg exited with {status}")
        } else {
            format!("ffmpeg exited with {status}: {last_line}")
        };
        return Err(CutError::FfmpegFailed(detail));
    }

    let _ = progress_tx.send(CutProgress { percent: 100.0 });
    tracing::info!(output = %plan.output_path.display(), "cut finished");
    Ok(plan.output_path.clone())
}

/// Parse an ffmpeg stderr progress line into a percent of the cut duration.
///
/// Example line: `frame=  123 fps= 60 ... time=00:00:02.05 speed=1.50x`
pub fn parse_progress(line: &str, total_secs: f64) -> Option<CutProgress> {
    if !line.contains("time=") {
        return None;
    }

    let time_secs = extract_value(line, "time=").and_then(|v| parse_time_str(&v))?;

    let percent = if total_secs > 0.0 {
        (time_secs / total_secs * 100.0).min(100.0)
    } else {
        0.0
    };

    Some(CutProgress { percent })
}

/// Extract a value from an ffmpeg key=value progress line.
fn extract_value(line: &str, key: &str) -> Option<String> {
    let start = line.find(key)? + key.len();
    let rest = line[start..].trim_start();
    let end = rest
        .find(|c: char| c.is_whitespace())
        .unwrap_or(rest.len());
    let val = rest[..end].to_string();
    if val.is_empty() {
        None
    } else {
        Some(val)
    }
}

/// Parse an ffmpeg time string like "00:01:02.05" into seconds.
fn parse_time_str(s: &str) -> Option<f64> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 3 {
        return None;
    }
    let hours: f64 = parts[0].parse().ok()?;
    let mins: f64 = parts[1].parse().ok()?;
    let secs: f64 = parts[2].parse().ok()?;
    Some(hours * 3600.0 + mins * 60.0 + secs)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
