use std::hash::Hash;
use std::time::{Duration, Instant};

use indexmap::IndexMap;

/// Result of feeding one click into a [`ClickTracker`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// First click: the item is now waiting for a second click.
    Pending,
    /// Second click inside the window: the pending single click is dropped.
    Double,
}

/// Per-item single/double click disambiguation.
///
/// Each item is either idle or pending-single. A first click arms a timer for
/// the item; a second click on the same item before the window elapses turns
/// it into a double click. Items are independent: clicks on two different
/// items never combine.
///
/// Time is passed in by the caller, the tracker never reads the clock.
#[derive(Clone, Debug)]
pub struct ClickTracker<K> {
    window: Duration,
    pending: IndexMap<K, Instant>,
}

impl<K: Copy + Eq + Hash> ClickTracker<K> {
    /// Creates a tracker with the given disambiguation window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: IndexMap::new(),
        }
    }

    /// Disambiguation window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Registers a click on `key` at `now`.
    ///
    /// Callers should [`expire`](Self::expire) first, so that a timer that ran
    /// out before this click is reported as a single click.
    pub fn click(&mut self, key: K, now: Instant) -> ClickOutcome {
        match self.pending.shift_remove(&key) {
            Some(started) if now.saturating_duration_since(started) < self.window => {
                ClickOutcome::Double
            }
            _ => {
                self.pending.insert(key, now);
                ClickOutcome::Pending
            }
        }
    }

    /// Removes and returns items whose window elapsed, oldest first.
    pub fn expire(&mut self, now: Instant) -> Vec<K> {
        let window = self.window;
        let mut fired = Vec::new();
        self.pending.retain(|key, started| {
            if now.saturating_duration_since(*started) >= window {
                fired.push(*key);
                false
            } else {
                true
            }
        });
        fired
    }

    /// Whether `key` is waiting for a second click.
    pub fn is_pending(&self, key: K) -> bool {
        self.pending.contains_key(&key)
    }

    /// Whether any item is waiting.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Earliest instant at which a pending single click fires.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|s| *s + self.window).min()
    }

    /// Drops every pending timer without firing it.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
