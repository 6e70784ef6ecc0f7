use crate::channel::{HostToUi, UiToHost};
use crate::store::StateSnapshot;
use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use veelo_core::playback::{MediaTransport, PlaybackSync};
use veelo_core::range::RangeController;
use veelo_core::shortcuts::{Readout, ReadoutTarget, ShortcutAction};
use veelo_core::types::{ProcessingStatus, TrimRange, VideoFile};

/// How long a finished cut stays on screen before the session goes idle.
pub const DONE_RESET_DELAY: Duration = Duration::from_secs(3);

/// Alert shown when a deep-linked file cannot be loaded.
pub const LOAD_FAILURE_ALERT: &str = "Failed to load video file";

/// UI-side state machine: the loaded file, its trim range, playback sync, and
/// the cut lifecycle. Talks to the host only through the typed channel; media
/// probing and the transport are injected so the whole thing runs in tests.
pub struct Session<T, L> {
    transport: T,
    sync: PlaybackSync,
    loader: L,
    to_host: UnboundedSender<UiToHost>,

    video: Option<VideoFile>,
    controller: Option<RangeController>,

    status: ProcessingStatus,
    /// Monotonic progress for display. ffmpeg's reported time can jitter
    /// backwards between stderr lines; the bar must not.
    display_percent: f64,
    done_since: Option<Instant>,

    /// Saved state has been applied (or confirmed absent). Saves are held
    /// back until then so a fresh session cannot clobber the previous one.
    restored: bool,
    failed_links: HashSet<String>,
    alerts: Vec<String>,
    readout: Option<Readout>,
}

impl<T, L> Session<T, L>
where
    T: MediaTransport,
    L: FnMut(&Path) -> Result<f64, String>,
{
    pub fn new(transport: T, loader: L, to_host: UnboundedSender<UiToHost>) -> Self {
        Self {
            transport,
            sync: PlaybackSync::new(),
            loader,
            to_host,
            video: None,
            controller: None,
            status: ProcessingStatus::Idle,
            display_percent: 0.0,
            done_since: None,
            restored: false,
            failed_links: HashSet::new(),
            alerts: Vec::new(),
            readout: None,
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn video(&self) -> Option<&VideoFile> {
        self.video.as_ref()
    }

    pub fn range(&self) -> Option<TrimRange> {
        self.controller.as_ref().map(|c| c.range())
    }

    pub fn controller_mut(&mut self) -> Option<&mut RangeController> {
        self.controller.as_mut()
    }

    pub fn status(&self) -> &ProcessingStatus {
        &self.status
    }

    pub fn display_percent(&self) -> f64 {
        self.display_percent
    }

    pub fn is_restored(&self) -> bool {
        self.restored
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn readout_at(&self, now: Instant) -> Option<Readout> {
        self.readout.filter(|r| r.visible_at(now))
    }

    /// Alerts raised since the last call, oldest first.
    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }

    // -- lifecycle ----------------------------------------------------------

    /// Announce that the session is mounted and ready for restored state and
    /// queued deep links.
    pub fn announce_ready(&self) {
        self.send(UiToHost::Ready);
    }

    pub fn handle_host_event(&mut self, event: HostToUi, now: Instant) {
        match event {
            HostToUi::CutProgress(percent) => self.on_cut_progress(percent),
            HostToUi::CutDone(output_path) => {
                tracing::info!(output = %output_path.display(), "cut finished");
                self.status = ProcessingStatus::Done { output_path };
                self.display_percent = 100.0;
                self.done_since = Some(now);
            }
            HostToUi::CutError(message) => {
                tracing::error!(error = %message, "cut failed");
                self.alerts.push(message.clone());
                self.status = ProcessingStatus::Failed { message };
                self.done_since = None;
            }
            HostToUi::RestoreState(snapshot) => self.restore(snapshot),
            HostToUi::OpenFileFromLink(path) => self.open_from_link(&path),
        }
    }

    /// Time-based housekeeping: retire a stale `Done` status and an expired
    /// readout. Call from the surface's update tick.
    pub fn tick(&mut self, now: Instant) {
        if let Some(done_at) = self.done_since {
            if now.duration_since(done_at) >= DONE_RESET_DELAY {
                self.status = ProcessingStatus::Idle;
                self.display_percent = 0.0;
                self.done_since = None;
            }
        }
        if let Some(readout) = self.readout {
            if !readout.visible_at(now) {
                self.readout = None;
            }
        }
    }

    // -- file loading -------------------------------------------------------

    /// Load a user-picked or dropped file. A fresh file always gets the full
    /// trim range.
    pub fn load_video(&mut self, path: &Path) -> Result<(), String> {
        let duration = (self.loader)(path)?;
        let file = VideoFile::from_path(path, duration);
        tracing::info!(name = %file.name, duration, "video loaded");

        let controller = RangeController::new(duration);
        let range = controller.range();
        self.sync.on_file_loaded(&mut self.transport, &range);

        self.video = Some(file);
        self.controller = Some(controller);
        self.persist();
        Ok(())
    }

    /// Load a deep-linked file. A path that already failed is dropped
    /// silently; a first failure raises one alert.
    pub fn open_from_link(&mut self, path: &Path) {
        let key = format!("veelo://file?path={}", path.display());
        if self.failed_links.contains(&key) {
            tracing::debug!(link = %key, "ignoring deep link that already failed");
            return;
        }
        if let Err(e) = self.load_video(path) {
            tracing::warn!(link = %key, error = %e, "deep-linked file failed to load");
            self.failed_links.insert(key);
            self.alerts.push(LOAD_FAILURE_ALERT.to_string());
        }
    }

    fn restore(&mut self, snapshot: StateSnapshot) {
        if self.restored {
            return;
        }
        self.restored = true;

        // A file that arrived before restore (deep link) wins over the saved
        // session.
        if self.video.is_some() {
            return;
        }
        let Some(file) = snapshot.video_file else {
            return;
        };
        if !file.path.exists() {
            tracing::warn!(path = %file.path.display(), "saved video no longer exists");
            return;
        }

        let controller = match snapshot.trim_settings {
            Some(trim) => RangeController::with_range(file.duration, trim.into()),
            None => RangeController::new(file.duration),
        };
        let range = controller.range();
        self.sync.on_file_loaded(&mut self.transport, &range);

        tracing::info!(name = %file.name, "session restored");
        self.video = Some(file);
        self.controller = Some(controller);
    }

    // -- trim range ---------------------------------------------------------

    /// Slider-driven range replacement.
    pub fn set_range(&mut self, start: f64, end: f64) {
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        controller.set_range(start, end);
        let range = controller.range();
        self.sync.on_range_changed(&mut self.transport, &range);
        self.persist();
    }

    // -- cutting ------------------------------------------------------------

    /// Ask the host to cut the current selection. Refused while a cut is
    /// already running or when nothing is loaded.
    pub fn trigger_cut(&mut self) -> bool {
        if self.status.is_processing() {
            tracing::warn!("cut already in progress, ignoring");
            return false;
        }
        let (Some(video), Some(controller)) = (&self.video, &self.controller) else {
            return false;
        };
        let range = controller.range();

        self.transport.pause();
        self.transport.seek(range.start);

        self.send(UiToHost::CutVideo {
            file_path: video.path.clone(),
            start_time: range.start,
            duration: range.duration(),
        });
        self.status = ProcessingStatus::Processing { percent: 0.0 };
        self.display_percent = 0.0;
        self.done_since = None;
        true
    }

    fn on_cut_progress(&mut self, percent: f64) {
        if !self.status.is_processing() {
            return;
        }
        self.status = ProcessingStatus::Processing { percent };
        self.display_percent = self.display_percent.max(percent.clamp(0.0, 100.0));
    }

    // -- shortcuts ----------------------------------------------------------

    pub fn apply_shortcut(&mut self, action: ShortcutAction, now: Instant) {
        match action {
            ShortcutAction::TogglePlayback => {
                if self.transport.is_playing() {
                    self.transport.pause();
                } else {
                    let _ = self.transport.play();
                }
            }
            ShortcutAction::SeekToRangeStart => {
                if let Some(range) = self.range() {
                    self.transport.seek(range.start);
                }
            }
            ShortcutAction::TriggerCut => {
                self.trigger_cut();
            }
            ShortcutAction::SeekBy(delta) => {
                if let Some(range) = self.range() {
                    let target = (self.transport.position() + delta).clamp(range.start, range.end);
                    self.transport.seek(target);
                    self.readout = Some(Readout::show(ReadoutTarget::Seek, target, now));
                }
            }
            ShortcutAction::MoveStartBy(delta) => {
                if let Some(controller) = self.controller.as_mut() {
                    controller.move_start_by(delta);
                    let range = controller.range();
                    self.readout = Some(Readout::show(ReadoutTarget::Start, range.start, now));
                    self.sync.on_range_changed(&mut self.transport, &range);
                    self.persist();
                }
            }
            ShortcutAction::MoveEndBy(delta) => {
                if let Some(controller) = self.controller.as_mut() {
                    controller.move_end_by(delta);
                    let range = controller.range();
                    self.readout = Some(Readout::show(ReadoutTarget::End, range.end, now));
                    self.sync.on_range_changed(&mut self.transport, &range);
                    self.persist();
                }
            }
        }
    }

    // -- persistence and channel --------------------------------------------

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            video_file: self.video.clone(),
            trim_settings: self.range().map(Into::into),
        }
    }

    fn persist(&self) {
        if !self.restored {
            return;
        }
        self.send(UiToHost::SaveState(self.snapshot()));
    }

    fn send(&self, msg: UiToHost) {
        let _ = self.to_host.send(msg);
    }
}
