use std::path::PathBuf;

/// Single-slot holder for a deep-linked file path that arrived before the UI
/// signalled ready. A newer arrival overwrites an unconsumed older one; the
/// value is consumed exactly once via `take`.
#[derive(Debug, Default)]
pub struct PendingDeepLink {
    slot: Option<PathBuf>,
}

impl PendingDeepLink {
    pub fn set(&mut self, path: PathBuf) {
        if let Some(old) = self.slot.replace(path) {
            tracing::debug!(dropped = %old.display(), "pending deep link overwritten");
        }
    }

    pub fn take(&mut self) -> Option<PathBuf> {
        self.slot.take()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let mut pending = PendingDeepLink::default();
        assert!(pending.is_empty());
        assert!(pending.take().is_none());
    }

    #[test]
    fn take_consumes_exactly_once() {
        let mut pending = PendingDeepLink::default();
        pending.set(PathBuf::from("/tmp/a.mp4"));
        assert!(!pending.is_empty());
        assert_eq!(pending.take(), Some(PathBuf::from("/tmp/a.mp4")));
        assert!(pending.take().is_none());
    }

    #[test]
    fn newer_arrival_overwrites_older() {
        let mut pending = PendingDeepLink::default();
        pending.set(PathBuf::from("/tmp/old.mp4"));
        pending.set(PathBuf::from("/tmp/new.mp4"));
        assert_eq!(pending.take(), Some(PathBuf::from("/tmp/new.mp4")));
        assert!(pending.is_empty());
    }
}
