use crate::types::TrimRange;
use thiserror::Error;

/// The environment refused to start playback programmatically. Callers treat
/// this as a non-event, never as a failure.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("playback start refused by the environment")]
pub struct AutoplayDenied;

/// Seam between the synchronizer and whatever actually plays media.
pub trait MediaTransport {
    fn position(&self) -> f64;
    fn seek(&mut self, seconds: f64);
    fn play(&mut self) -> Result<(), AutoplayDenied>;
    fn pause(&mut self);
    fn is_playing(&self) -> bool;
}

/// Keeps a playing transport inside the active trim range: wrap or pause at
/// the range end, re-anchor on range changes, seek-and-autoplay on load.
#[derive(Debug, Clone)]
pub struct PlaybackSync {
    pub loop_enabled: bool,
}

impl Default for PlaybackSync {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackSync {
    /// Loop mode starts enabled.
    pub fn new() -> Self {
        Self { loop_enabled: true }
    }

    /// Called on every playback position update. Past the range end, either
    /// wrap to the start (loop mode) or pause in place.
    pub fn on_time_update<T: MediaTransport>(&self, transport: &mut T, range: &TrimRange) {
        if transport.position() >= range.end {
            if self.loop_enabled {
                transport.seek(range.start);
            } else {
                transport.pause();
            }
        }
    }

    /// Natural end of media. Identical policy to `on_time_update`, covering
    /// files whose reported position never quite reaches the range end.
    pub fn on_ended<T: MediaTransport>(&self, transport: &mut T, range: &TrimRange) {
        if self.loop_enabled {
            transport.seek(range.start);
            let _ = transport.play();
        } else {
            transport.pause();
        }
    }

    /// The trim range moved under a loaded file. A position still inside the
    /// new range is left alone; otherwise snap to the new start. Playback
    /// resumes only if it was already running.
    pub fn on_range_changed<T: MediaTransport>(&self, transport: &mut T, range: &TrimRange) {
        let was_playing = transport.is_playing();
        if !range.contains(transport.position()) {
            transport.seek(range.start);
        }
        if was_playing {
            let _ = transport.play();
        }
    }

    /// A new file was loaded: start at the range start and try to auto-play.
    /// Autoplay refusal is swallowed.
    pub fn on_file_loaded<T: MediaTransport>(&self, transport: &mut T, range: &TrimRange) {
        transport.seek(range.start);
        let _ = transport.play();
    }
}
