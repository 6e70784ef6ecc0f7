use std::time::{Duration, Instant};

/// How long a shortcut-triggered value readout stays on screen.
pub const READOUT_AUTO_HIDE: Duration = Duration::from_millis(800);

/// Seek step for plain Left/Right, in seconds.
pub const SEEK_STEP: f64 = 1.0;

/// Handle nudge for Shift(+Alt) Left/Right, in seconds.
pub const NUDGE_STEP: f64 = 0.5;

/// Keys participating in global shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutKey {
    Space,
    KeyR,
    Enter,
    ArrowLeft,
    ArrowRight,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        alt: false,
    };
}

/// What a matched shortcut asks the session to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShortcutAction {
    TogglePlayback,
    SeekToRangeStart,
    TriggerCut,
    /// Seek playback by a signed amount, clamped to the trim range.
    SeekBy(f64),
    /// Move the start handle by a signed amount.
    MoveStartBy(f64),
    /// Move the end handle by a signed amount.
    MoveEndBy(f64),
}

/// Map a key event to a shortcut action. Returns `None` while a text field
/// has focus (shortcuts are suppressed) or when the combination is unbound.
pub fn map_shortcut(
    key: ShortcutKey,
    mods: Modifiers,
    text_field_focused: bool,
) -> Option<ShortcutAction> {
    if text_field_focused {
        return None;
    }
    match key {
        ShortcutKey::Space => Some(ShortcutAction::TogglePlayback),
        ShortcutKey::KeyR => Some(ShortcutAction::SeekToRangeStart),
        ShortcutKey::Enter => Some(ShortcutAction::TriggerCut),
        ShortcutKey::ArrowLeft if mods.shift && mods.alt => {
            Some(ShortcutAction::MoveEndBy(-NUDGE_STEP))
        }
        ShortcutKey::ArrowLeft if mods.shift => Some(ShortcutAction::MoveStartBy(-NUDGE_STEP)),
        ShortcutKey::ArrowLeft => Some(ShortcutAction::SeekBy(-SEEK_STEP)),
        ShortcutKey::ArrowRight if mods.shift && mods.alt => {
            Some(ShortcutAction::MoveEndBy(NUDGE_STEP))
        }
        ShortcutKey::ArrowRight if mods.shift => Some(ShortcutAction::MoveStartBy(NUDGE_STEP)),
        ShortcutKey::ArrowRight => Some(ShortcutAction::SeekBy(SEEK_STEP)),
    }
}

/// What a transient readout points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadoutTarget {
    Start,
    End,
    Seek,
}

/// A transient value readout shown after a shortcut-driven move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readout {
    pub target: ReadoutTarget,
    pub value: f64,
    shown_at: Instant,
}

impl Readout {
    pub fn show(target: ReadoutTarget, value: f64, now: Instant) -> Self {
        Self {
            target,
            value,
            shown_at: now,
        }
    }

    pub fn visible_at(&self, now: Instant) -> bool {
        now.duration_since(self.shown_at) < READOUT_AUTO_HIDE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_keys_map_to_transport_actions() {
        assert_eq!(
            map_shortcut(ShortcutKey::Space, Modifiers::NONE, false),
            Some(ShortcutAction::TogglePlayback)
        );
        assert_eq!(
            map_shortcut(ShortcutKey::KeyR, Modifiers::NONE, false),
            Some(ShortcutAction::SeekToRangeStart)
        );
        assert_eq!(
            map_shortcut(ShortcutKey::Enter, Modifiers::NONE, false),
            Some(ShortcutAction::TriggerCut)
        );
    }

    #[test]
    fn unmodified_arrows_seek_one_second() {
        assert_eq!(
            map_shortcut(ShortcutKey::ArrowLeft, Modifiers::NONE, false),
            Some(ShortcutAction::SeekBy(-1.0))
        );
        assert_eq!(
            map_shortcut(ShortcutKey::ArrowRight, Modifiers::NONE, false),
            Some(ShortcutAction::SeekBy(1.0))
        );
    }

    #[test]
    fn shift_arrows_move_start_handle() {
        let shift = Modifiers {
            shift: true,
            alt: false,
        };
        assert_eq!(
            map_shortcut(ShortcutKey::ArrowLeft, shift, false),
            Some(ShortcutAction::MoveStartBy(-0.5))
        );
        assert_eq!(
            map_shortcut(ShortcutKey::ArrowRight, shift, false),
            Some(ShortcutAction::MoveStartBy(0.5))
        );
    }

    #[test]
    fn shift_alt_arrows_move_end_handle() {
        let shift_alt = Modifiers {
            shift: true,
            alt: true,
        };
        assert_eq!(
            map_shortcut(ShortcutKey::ArrowLeft, shift_alt, false),
            Some(ShortcutAction::MoveEndBy(-0.5))
        );
        assert_eq!(
            map_shortcut(ShortcutKey::ArrowRight, shift_alt, false),
            Some(ShortcutAction::MoveEndBy(0.5))
        );
    }

    #[test]
    fn text_field_focus_suppresses_everything() {
        for key in [
            ShortcutKey::Space,
            ShortcutKey::KeyR,
            ShortcutKey::Enter,
            ShortcutKey::ArrowLeft,
            ShortcutKey::ArrowRight,
        ] {
            assert_eq!(map_shortcut(key, Modifiers::NONE, true), None);
        }
    }

    #[test]
    fn readout_hides_after_delay() {
        let t0 = Instant::now();
        let readout = Readout::show(ReadoutTarget::Start, 4.5, t0);
        assert!(readout.visible_at(t0));
        assert!(readout.visible_at(t0 + Duration::from_millis(799)));
        assert!(!readout.visible_at(t0 + READOUT_AUTO_HIDE));
        assert!(!readout.visible_at(t0 + Duration::from_secs(5)));
    }
}
