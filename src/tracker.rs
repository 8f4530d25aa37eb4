//! Tracks whether any key is currently held down.
//!
//! Down/up events are not reliable: auto-repeat produces several downs for
//! one hold, ups get lost across suspend, and so on. Keys are therefore kept
//! as a set of raw key codes instead of a counter, and the set is thrown away
//! after a long enough silence.

use std::time::{Duration, Instant};

use smallvec::SmallVec;

/// Raw, layout independent key code.
pub(crate) type KeyCode = u16;

/// Silence after which no key is assumed to be held.
pub(crate) const DEFAULT_STALE_THRESHOLD: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyEventKind {
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct KeyEvent {
    pub kind: KeyEventKind,
    pub key: KeyCode,
}

impl KeyEvent {
    pub(crate) fn down(key: KeyCode) -> Self {
        Self {
            kind: KeyEventKind::Down,
            key,
        }
    }

    pub(crate) fn up(key: KeyCode) -> Self {
        Self {
            kind: KeyEventKind::Up,
            key,
        }
    }
}

/// Edge in keyboard activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Activity {
    /// First key went down
    Started,
    /// Last key went up
    Stopped,
}

#[derive(Debug)]
pub(crate) struct KeyTracker {
    /// Keys believed to be held. Never contains duplicates.
    pressed: SmallVec<[KeyCode; 8]>,
    /// Time of the last processed event, `None` before the first one.
    last_event: Option<Instant>,
    stale_threshold: Duration,
}

impl KeyTracker {
    pub(crate) fn new(stale_threshold: Duration) -> Self {
        Self {
            pressed: SmallVec::new(),
            last_event: None,
            stale_threshold,
        }
    }

    /// Number of keys currently believed to be held.
    pub(crate) fn pressed_count(&self) -> usize {
        self.pressed.len()
    }

    #[cfg(test)]
    pub(crate) fn is_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    pub(crate) fn on_event(&mut self, event: KeyEvent) -> Option<Activity> {
        self.on_event_at(event, Instant::now())
    }

    /// Apply `event` as if it happened at `now`.
    pub(crate) fn on_event_at(&mut self, event: KeyEvent, now: Instant) -> Option<Activity> {
        // Counted before any stale reset, so a reset while active still
        // ends in a stop edge instead of leaving the light on.
        let old_count = self.pressed.len();

        // Compared against the previous event, before it is replaced.
        if let Some(last) = self.last_event {
            if now.saturating_duration_since(last) > self.stale_threshold {
                self.pressed.clear();
            }
        }
        self.last_event = Some(now);

        match event.kind {
            KeyEventKind::Down => {
                if !self.pressed.contains(&event.key) {
                    self.pressed.push(event.key);
                }
            }
            KeyEventKind::Up => self.pressed.retain(|k| *k != event.key),
        }

        match (old_count, self.pressed.len()) {
            (0, 1..) => Some(Activity::Started),
            (1.., 0) => Some(Activity::Stopped),
            _ => None,
        }
    }
}

impl Default for KeyTracker {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_THRESHOLD)
    }
}
