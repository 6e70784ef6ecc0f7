use crate::types::{TrimRange, DEFAULT_STEP};

/// Which slider handle an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Start,
    End,
}

/// Keys understood by a focused slider handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliderKey {
    ArrowLeft,
    ArrowRight,
    PageUp,
    PageDown,
    Home,
    End,
}

/// Range-selection state machine for the trim slider: pointer drags, track
/// clicks, and per-handle keyboard moves. Every mutation re-enforces
/// `0 <= start` and `start + min_gap <= end <= duration`, where the minimum
/// gap is one slider step.
#[derive(Debug, Clone)]
pub struct RangeController {
    range: TrimRange,
    duration: f64,
    step: f64,
    active: Option<Handle>,
}

impl RangeController {
    /// Controller for a freshly loaded file: full range, default step.
    pub fn new(duration: f64) -> Self {
        Self::with_range(duration, TrimRange::full(duration))
    }

    /// Controller seeded with a previously saved range. The range is clamped
    /// in case the saved values no longer fit the file.
    pub fn with_range(duration: f64, range: TrimRange) -> Self {
        let duration = duration.max(0.0);
        Self {
            range: TrimRange::clamped(range.start, range.end, duration, DEFAULT_STEP),
            duration,
            step: DEFAULT_STEP,
            active: None,
        }
    }

    pub fn range(&self) -> TrimRange {
        self.range
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// The minimum start/end separation (one slider step).
    pub fn min_gap(&self) -> f64 {
        self.step
    }

    pub fn active_handle(&self) -> Option<Handle> {
        self.active
    }

    /// Replace the range wholesale, clamped to the invariant.
    pub fn set_range(&mut self, start: f64, end: f64) {
        self.range = TrimRange::clamped(start, end, self.duration, self.step);
    }

    /// Map a pointer x offset within the track to a time in `[0, duration]`,
    /// snapped to the nearest step multiple.
    pub fn value_at(&self, x: f64, track_width: f64) -> f64 {
        if track_width <= 0.0 {
            return 0.0;
        }
        let fraction = (x / track_width).clamp(0.0, 1.0);
        self.snap(fraction * self.duration)
    }

    fn snap(&self, value: f64) -> f64 {
        (value / self.step).round() * self.step
    }

    pub fn begin_drag(&mut self, handle: Handle) {
        self.active = Some(handle);
    }

    pub fn end_drag(&mut self) {
        self.active = None;
    }

    /// Move the actively dragged handle to `value`. No-op when nothing is
    /// being dragged.
    pub fn drag_to(&mut self, value: f64) {
        match self.active {
            Some(Handle::Start) => self.move_start_to(value),
            Some(Handle::End) => self.move_end_to(value),
            None => {}
        }
    }

    /// Track click with no drag in flight: jump whichever handle is
    /// numerically closer to the clicked value.
    pub fn click(&mut self, value: f64) {
        if self.active.is_some() {
            return;
        }
        let to_start = (value - self.range.start).abs();
        let to_end = (value - self.range.end).abs();
        if to_start < to_end {
            self.move_start_to(value);
        } else {
            self.move_end_to(value);
        }
    }

    /// Keyboard move for a focused handle: arrows step by one step, page keys
    /// by ten, Home/End snap to the track bounds.
    pub fn key(&mut self, handle: Handle, key: SliderKey) {
        let step = self.step;
        let page = step * 10.0;
        match (handle, key) {
            (Handle::Start, SliderKey::ArrowLeft) => {
                self.move_start_to(self.range.start - step);
            }
            (Handle::Start, SliderKey::ArrowRight) => {
                self.move_start_to(self.range.start + step);
            }
            (Handle::Start, SliderKey::PageDown) => {
                self.move_start_to(self.range.start - page);
            }
            (Handle::Start, SliderKey::PageUp) => {
                self.move_start_to(self.range.start + page);
            }
            (Handle::Start, SliderKey::Home) => self.move_start_to(0.0),
            (Handle::Start, SliderKey::End) => {}
            (Handle::End, SliderKey::ArrowLeft) => {
                self.move_end_to(self.range.end - step);
            }
            (Handle::End, SliderKey::ArrowRight) => {
                self.move_end_to(self.range.end + step);
            }
            (Handle::End, SliderKey::PageDown) => {
                self.move_end_to(self.range.end - page);
            }
            (Handle::End, SliderKey::PageUp) => {
                self.move_end_to(self.range.end + page);
            }
            (Handle::End, SliderKey::End) => self.move_end_to(self.duration),
            (Handle::End, SliderKey::Home) => {}
        }
    }

    /// Nudge the start handle by a signed amount (keyboard shortcuts).
    pub fn move_start_by(&mut self, delta: f64) {
        self.move_start_to(self.range.start + delta);
    }

    /// Nudge the end handle by a signed amount (keyboard shortcuts).
    pub fn move_end_by(&mut self, delta: f64) {
        self.move_end_to(self.range.end + delta);
    }

    fn move_start_to(&mut self, value: f64) {
        let max_start = (self.range.end - self.min_gap()).max(0.0);
        self.range.start = value.clamp(0.0, max_start);
    }

    fn move_end_to(&mut self, value: f64) {
        // min() guards degenerate files shorter than one step.
        let min_end = (self.range.start + self.min_gap()).min(self.duration);
        self.range.end = value.clamp(min_end, self.duration);
    }
}
