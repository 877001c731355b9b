//! # Notifications
//!
//! Queue of user-facing toasts with short-window de-duplication.
//!
//! A barcode gun can fire the same scan twice in a few milliseconds and a
//! poll loop can report the same failure on consecutive ticks. Identical
//! `(kind, message)` pairs raised inside the window collapse to one.
//!
//! The caller supplies `now`, so this module stays free of clocks.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use ts_rs::TS;

/// Default de-duplication window.
pub const DEFAULT_DEDUP_WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum NotificationKind {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

#[derive(Debug)]
pub struct Notifier {
    window: Duration,
    last_seen: HashMap<(NotificationKind, String), Instant>,
    pending: Vec<Notification>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_DEDUP_WINDOW)
    }

    pub fn with_window(window: Duration) -> Self {
        Notifier {
            window,
            last_seen: HashMap::new(),
            pending: Vec::new(),
        }
    }

    /// Queues a notification. Returns `false` when it was swallowed as a
    /// duplicate of one raised less than `window` ago.
    pub fn push(&mut self, kind: NotificationKind, message: impl Into<String>, now: Instant) -> bool {
        let message = message.into();
        let window = self.window;
        self.last_seen
            .retain(|_, seen| now.saturating_duration_since(*seen) < window);

        let key = (kind, message);
        if self.last_seen.contains_key(&key) {
            return false;
        }

        let (kind, message) = key;
        self.last_seen.insert((kind, message.clone()), now);
        self.pending.push(Notification { kind, message });
        true
    }

    /// Takes every queued notification, oldest first.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[Notification] {
        &self.pending
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Notifier::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_within_window_is_dropped() {
        let mut n = Notifier::new();
        let t0 = Instant::now();

        assert!(n.push(NotificationKind::Error, "Product not found", t0));
        assert!(!n.push(
            NotificationKind::Error,
            "Product not found",
            t0 + Duration::from_millis(200)
        ));
        assert_eq!(n.drain().len(), 1);
    }

    #[test]
    fn test_duplicate_after_window_is_kept() {
        let mut n = Notifier::new();
        let t0 = Instant::now();

        n.push(NotificationKind::Info, "Added Milk to cart", t0);
        assert!(n.push(
            NotificationKind::Info,
            "Added Milk to cart",
            t0 + Duration::from_millis(600)
        ));
        assert_eq!(n.drain().len(), 2);
    }

    #[test]
    fn test_different_kind_is_not_a_duplicate() {
        let mut n = Notifier::new();
        let t0 = Instant::now();

        n.push(NotificationKind::Info, "same", t0);
        assert!(n.push(NotificationKind::Warning, "same", t0));
    }

    #[test]
    fn test_drain_empties_queue() {
        let mut n = Notifier::new();
        n.push(NotificationKind::Success, "ok", Instant::now());
        assert_eq!(n.drain()[0].message, "ok");
        assert!(n.pending().is_empty());
    }
}
