use veelo_core::playback::{AutoplayDenied, MediaTransport};

/// In-process playback transport. Holds the position and play state the
/// session logic drives; the rendering surface mirrors this via the media
/// server rather than owning playback state itself.
#[derive(Debug)]
pub struct DirectTransport {
    position: f64,
    playing: bool,
    /// When false, programmatic `play` calls are refused, mirroring surfaces
    /// that gate autoplay on a prior user gesture.
    pub allow_autoplay: bool,
}

impl Default for DirectTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectTransport {
    pub fn new() -> Self {
        Self {
            position: 0.0,
            playing: false,
            allow_autoplay: true,
        }
    }

    /// Advance the clock by `seconds` if playing. The surface calls this on
    /// its own update tick.
    pub fn advance(&mut self, seconds: f64) {
        if self.playing {
            self.position += seconds;
        }
    }
}

impl MediaTransport for DirectTransport {
    fn position(&self) -> f64 {
        self.position
    }

    fn seek(&mut self, seconds: f64) {
        self.position = seconds.max(0.0);
    }

    fn play(&mut self) -> Result<(), AutoplayDenied> {
        if self.allow_autoplay || self.playing {
            self.playing = true;
            Ok(())
        } else {
            Err(AutoplayDenied)
        }
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}
