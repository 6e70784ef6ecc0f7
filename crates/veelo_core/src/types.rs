use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Slider step in seconds. Doubles as the minimum start/end gap.
pub const DEFAULT_STEP: f64 = 0.1;

// ---------------------------------------------------------------------------
// VideoFile
// ---------------------------------------------------------------------------

/// The currently loaded source file. Immutable; a new selection, drop, or
/// deep link replaces the whole value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoFile {
    pub path: PathBuf,
    pub name: String,
    pub duration: f64,
}

impl VideoFile {
    /// Build a `VideoFile` from a path and a probed duration, deriving the
    /// display name from the final path component.
    pub fn from_path(path: impl Into<PathBuf>, duration: f64) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            path,
            name,
            duration,
        }
    }
}

// ---------------------------------------------------------------------------
// TrimRange
// ---------------------------------------------------------------------------

/// The [start, end] window of the source selected for output.
///
/// Invariant: `0 <= start` and `start + min_gap <= end <= duration`. Every
/// constructor and mutation clamps rather than errors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TrimRange {
    pub start: f64,
    pub end: f64,
}

impl TrimRange {
    /// The default range for a freshly loaded file: the whole file.
    pub fn full(duration: f64) -> Self {
        Self {
            start: 0.0,
            end: duration.max(0.0),
        }
    }

    /// Clamp arbitrary start/end values into a valid range for `duration`.
    pub fn clamped(start: f64, end: f64, duration: f64, min_gap: f64) -> Self {
        let duration = duration.max(0.0);
        let start = start.max(0.0).min((duration - min_gap).max(0.0));
        let end = end.min(duration).max((start + min_gap).min(duration));
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, position: f64) -> bool {
        position >= self.start && position <= self.end
    }
}

// ---------------------------------------------------------------------------
// ProcessingStatus
// ---------------------------------------------------------------------------

/// Transient, single-flight cut status for the session. Set to `Processing`
/// when a cut starts, updated by progress events, and settles into a terminal
/// `Done`/`Failed` value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ProcessingStatus {
    #[default]
    Idle,
    Processing {
        percent: f64,
    },
    Done {
        output_path: PathBuf,
    },
    Failed {
        message: String,
    },
}

impl ProcessingStatus {
    pub fn is_processing(&self) -> bool {
        matches!(self, ProcessingStatus::Processing { .. })
    }

    /// Percent for display, clamped to [0, 100].
    pub fn percent(&self) -> f64 {
        match self {
            ProcessingStatus::Idle => 0.0,
            ProcessingStatus::Processing { percent } => percent.clamp(0.0, 100.0),
            ProcessingStatus::Done { .. } => 100.0,
            ProcessingStatus::Failed { .. } => 0.0,
        }
    }

    pub fn output_path(&self) -> Option<&Path> {
        match self {
            ProcessingStatus::Done { output_path } => Some(output_path),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_file_name_from_path() {
        let file = VideoFile::from_path("/media/clips/holiday.mp4", 30.0);
        assert_eq!(file.name, "holiday.mp4");
        assert_eq!(file.path, PathBuf::from("/media/clips/holiday.mp4"));
        assert!((file.duration - 30.0).abs() < 1e-9);
    }

    #[test]
    fn video_file_serde_uses_camel_case() {
        let file = VideoFile::from_path("/tmp/a.mp4", 12.5);
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["path"], "/tmp/a.mp4");
        assert_eq!(json["name"], "a.mp4");
        assert_eq!(json["duration"], 12.5);
    }

    #[test]
    fn full_range_covers_whole_file() {
        let range = TrimRange::full(42.0);
        assert_eq!(range.start, 0.0);
        assert_eq!(range.end, 42.0);
        assert!((range.duration() - 42.0).abs() < 1e-9);
    }

    #[test]
    fn clamped_enforces_lower_bound() {
        let range = TrimRange::clamped(-5.0, 10.0, 30.0, DEFAULT_STEP);
        assert_eq!(range.start, 0.0);
        assert_eq!(range.end, 10.0);
    }

    #[test]
    fn clamped_enforces_upper_bound() {
        let range = TrimRange::clamped(5.0, 99.0, 30.0, DEFAULT_STEP);
        assert_eq!(range.start, 5.0);
        assert_eq!(range.end, 30.0);
    }

    #[test]
    fn clamped_enforces_min_gap() {
        let range = TrimRange::clamped(10.0, 10.0, 30.0, DEFAULT_STEP);
        assert!((range.end - range.start - DEFAULT_STEP).abs() < 1e-9);
    }

    #[test]
    fn clamped_inverted_input_still_valid() {
        let range = TrimRange::clamped(20.0, 5.0, 30.0, DEFAULT_STEP);
        assert!(range.start + DEFAULT_STEP <= range.end + 1e-9);
        assert!(range.end <= 30.0);
    }

    #[test]
    fn clamped_handles_tiny_duration() {
        let range = TrimRange::clamped(0.0, 1.0, 0.05, DEFAULT_STEP);
        assert!(range.start >= 0.0);
        assert!(range.end <= 0.05 + 1e-9);
        assert!(range.start <= range.end);
    }

    #[test]
    fn contains_is_inclusive() {
        let range = TrimRange { start: 2.0, end: 8.0 };
        assert!(range.contains(2.0));
        assert!(range.contains(8.0));
        assert!(range.contains(5.0));
        assert!(!range.contains(1.999));
        assert!(!range.contains(8.001));
    }

    #[test]
    fn status_percent_is_clamped() {
        let over = ProcessingStatus::Processing { percent: 150.0 };
        assert_eq!(over.percent(), 100.0);
        let under = ProcessingStatus::Processing { percent: -3.0 };
        assert_eq!(under.percent(), 0.0);
    }

    #[test]
    fn status_terminal_values() {
        let done = ProcessingStatus::Done {
            output_path: PathBuf::from("/tmp/out.mp4"),
        };
        assert_eq!(done.percent(), 100.0);
        assert_eq!(done.output_path(), Some(Path::new("/tmp/out.mp4")));
        assert!(!done.is_processing());

        let failed = ProcessingStatus::Failed {
            message: "boom".to_string(),
        };
        assert!(failed.output_path().is_none());
        assert!(!failed.is_processing());
    }
}
