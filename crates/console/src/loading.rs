//! Reference-counted busy indicator.
//!
//! Any panel may wrap its backend calls in [`LoadingTracker::track`] (or hold
//! a [`LoadingGuard`]); the overlay stays visible until the last outstanding
//! operation finishes.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;

/// Counts outstanding operations and publishes overlay visibility.
pub struct LoadingTracker {
    count: AtomicUsize,
    visible: watch::Sender<bool>,
}

impl Default for LoadingTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadingTracker {
    pub fn new() -> Self {
        let (visible, _) = watch::channel(false);
        Self {
            count: AtomicUsize::new(0),
            visible,
        }
    }

    /// Register one more outstanding operation.
    pub fn start_loading(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.publish();
    }

    /// Mark one operation finished. Never drops below zero.
    pub fn end_loading(&self) {
        let _ = self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| c.checked_sub(1));
        self.publish();
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Overlay visible iff at least one operation is outstanding.
    pub fn is_loading(&self) -> bool {
        self.count() > 0
    }

    /// Receive overlay visibility changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.visible.subscribe()
    }

    /// Start an operation that ends when the guard is dropped.
    pub fn guard(&self) -> LoadingGuard<'_> {
        self.start_loading();
        LoadingGuard { tracker: self }
    }

    /// Run `future` with the overlay held for its whole duration, including
    /// when the future is dropped before completion.
    pub async fn track<F: Future>(&self, future: F) -> F::Output {
        let _guard = self.guard();
        future.await
    }

    // The watch lock serializes updates so the published value always
    // reflects the latest count.
    fn publish(&self) {
        self.visible.send_if_modified(|visible| {
            let now = self.count.load(Ordering::SeqCst) > 0;
            if *visible == now {
                false
            } else {
                *visible = now;
                true
            }
        });
    }
}

/// Ends one loading operation on drop.
pub struct LoadingGuard<'a> {
    tracker: &'a LoadingTracker,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.tracker.end_loading();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_only_while_count_positive() {
        let tracker = LoadingTracker::new();
        assert!(!tracker.is_loading());

        tracker.start_loading();
        tracker.start_loading();
        assert!(tracker.is_loading());

        tracker.end_loading();
        assert!(tracker.is_loading(), "one operation still outstanding");

        tracker.end_loading();
        assert!(!tracker.is_loading());
    }

    #[test]
    fn end_at_zero_stays_zero() {
        let tracker = LoadingTracker::new();
        tracker.end_loading();
        tracker.end_loading();
        assert_eq!(tracker.count(), 0);

        tracker.start_loading();
        assert_eq!(tracker.count(), 1);
        assert!(tracker.is_loading());
    }

    #[test]
    fn subscription_follows_visibility() {
        let tracker = LoadingTracker::new();
        let rx = tracker.subscribe();
        assert!(!*rx.borrow());

        tracker.start_loading();
        assert!(*rx.borrow());
        tracker.start_loading();
        tracker.end_loading();
        assert!(*rx.borrow());
        tracker.end_loading();
        assert!(!*rx.borrow());
    }

    #[test]
    fn guard_ends_on_drop() {
        let tracker = LoadingTracker::new();
        {
            let _outer = tracker.guard();
            let _inner = tracker.guard();
            assert_eq!(tracker.count(), 2);
        }
        assert_eq!(tracker.count(), 0);
    }

    #[tokio::test]
    async fn track_holds_overlay_during_future() {
        let tracker = LoadingTracker::new();
        let seen = tracker
            .track(async { tracker.is_loading() })
            .await;
        assert!(seen);
        assert!(!tracker.is_loading());
    }

    #[tokio::test]
    async fn concurrent_tracks_keep_overlay_until_last() {
        let tracker = LoadingTracker::new();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let slow = tracker.track(async {
            let _ = release_rx.await;
        });
        let fast = async {
            tracker.track(async {}).await;
            // The slow operation is still pending here.
            let still_loading = tracker.is_loading();
            let _ = release_tx.send(());
            still_loading
        };

        let ((), still_loading) = tokio::join!(slow, fast);
        assert!(still_loading);
        assert!(!tracker.is_loading());
    }
}
