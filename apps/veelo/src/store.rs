use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use veelo_core::types::{TrimRange, VideoFile};

const STATE_FILE: &str = "app-state.json";

// ---------------------------------------------------------------------------
// Snapshot schema
// ---------------------------------------------------------------------------

/// On-disk record of the last session: the loaded file and its trim range.
/// Field names stay wire-compatible with the legacy snapshot JSON; unknown
/// fields are ignored and missing fields default, so a stale or partial file
/// never fails the loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_file: Option<VideoFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim_settings: Option<TrimSettings>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrimSettings {
    pub start_time: f64,
    pub end_time: f64,
}

impl From<TrimRange> for TrimSettings {
    fn from(range: TrimRange) -> Self {
        Self {
            start_time: range.start,
            end_time: range.end,
        }
    }
}

impl From<TrimSettings> for TrimRange {
    fn from(settings: TrimSettings) -> Self {
        Self {
            start: settings.start_time,
            end: settings.end_time,
        }
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Loads and saves the snapshot at a fixed per-user path. Saves are
/// best-effort; loads treat missing and malformed data identically.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The per-user default location: `<config_dir>/veelo/app-state.json`.
    pub fn at_default_location() -> Option<Self> {
        let mut path = dirs::config_dir()?;
        path.push("veelo");
        path.push(STATE_FILE);
        Some(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` for a missing, unreadable, or malformed snapshot. Never fatal.
    pub fn load(&self) -> Option<StateSnapshot> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "state unreadable");
                return None;
            }
        };
        match serde_json::from_str(&data) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "state malformed, ignoring");
                None
            }
        }
    }

    /// Best-effort write; failures log and continue.
    pub fn save(&self, snapshot: &StateSnapshot) {
        if let Err(e) = self.try_save(snapshot) {
            tracing::error!(path = %self.path.display(), error = %e, "failed to save state");
        }
    }

    fn try_save(&self, snapshot: &StateSnapshot) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn snapshot() -> StateSnapshot {
        StateSnapshot {
            video_file: Some(VideoFile::from_path("/media/holiday.mp4", 30.0)),
            trim_settings: Some(TrimSettings {
                start_time: 5.0,
                end_time: 15.0,
            }),
        }
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("app-state.json"));

        let original = snapshot();
        store.save(&original);
        assert_eq!(store.load(), Some(original));
    }

    #[test]
    fn save_creates_missing_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("veelo/nested/app-state.json"));
        store.save(&snapshot());
        assert!(store.load().is_some());
    }

    #[test]
    fn load_missing_file_is_absent() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("nope.json"));
        assert_eq!(store.load(), None);
    }

    #[test]
    fn load_malformed_file_is_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app-state.json");
        std::fs::write(&path, "{not json at all").unwrap();
        let store = StateStore::new(path);
        assert_eq!(store.load(), None);
    }

    #[test]
    fn load_accepts_legacy_camel_case_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app-state.json");
        std::fs::write(
            &path,
            r#"{
              "videoFile": { "path": "/media/a.mp4", "name": "a.mp4", "duration": 12.5 },
              "trimSettings": { "startTime": 1.0, "endTime": 9.5 }
            }"#,
        )
        .unwrap();

        let loaded = StateStore::new(path).load().unwrap();
        let file = loaded.video_file.unwrap();
        assert_eq!(file.name, "a.mp4");
        assert!((file.duration - 12.5).abs() < 1e-9);
        let trim = loaded.trim_settings.unwrap();
        assert!((trim.start_time - 1.0).abs() < 1e-9);
        assert!((trim.end_time - 9.5).abs() < 1e-9);
    }

    #[test]
    fn load_tolerates_unknown_and_missing_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app-state.json");
        std::fs::write(&path, r#"{ "futureField": 42 }"#).unwrap();

        let loaded = StateStore::new(path).load().unwrap();
        assert!(loaded.video_file.is_none());
        assert!(loaded.trim_settings.is_none());
    }

    #[test]
    fn trim_settings_range_conversion() {
        let settings = TrimSettings {
            start_time: 2.0,
            end_time: 8.0,
        };
        let range: TrimRange = settings.into();
        assert!((range.start - 2.0).abs() < 1e-9);
        assert!((range.end - 8.0).abs() < 1e-9);
        let back: TrimSettings = range.into();
        assert_eq!(back, settings);
    }

    #[test]
    fn save_failure_does_not_panic() {
        // Point the store at a path whose parent is a file.
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();
        let store = StateStore::new(blocker.join("app-state.json"));
        store.save(&snapshot());
        assert_eq!(store.load(), None);
    }
}
