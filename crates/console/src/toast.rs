//! User-facing notifications.
//!
//! [`ToastBus`] is a fire-and-forget publish/subscribe hub backed by a
//! `tokio::sync::broadcast` channel; publishing never blocks and never fails.
//! [`ToastTray`] is the rendering side: it collects received toasts and drops
//! each one once its display time has passed.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Toast
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Toast {
    pub id: Uuid,
    pub level: ToastLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Toast {
    pub fn new(level: ToastLevel, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// ToastBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 64;

pub struct ToastBus {
    sender: broadcast::Sender<Toast>,
}

impl ToastBus {
    /// When the buffer is full the oldest undelivered toasts are dropped.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a toast to every current subscriber.
    pub fn publish(&self, toast: Toast) {
        tracing::debug!(level = ?toast.level, message = %toast.message, "Toast");
        // Ignore the SendError: it only means nobody is rendering toasts.
        let _ = self.sender.send(toast);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(Toast::new(ToastLevel::Success, message));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.publish(Toast::new(ToastLevel::Info, message));
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.publish(Toast::new(ToastLevel::Warning, message));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(Toast::new(ToastLevel::Error, message));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.sender.subscribe()
    }
}

impl Default for ToastBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// ToastTray
// ---------------------------------------------------------------------------

/// Visible toasts, auto-dismissed after a fixed delay.
pub struct ToastTray {
    dismiss_after: Duration,
    items: Vec<Toast>,
}

impl ToastTray {
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            dismiss_after,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, toast: Toast) {
        self.items.push(toast);
    }

    /// Move everything currently queued on `rx` into the tray.
    pub fn drain(&mut self, rx: &mut broadcast::Receiver<Toast>) {
        loop {
            match rx.try_recv() {
                Ok(toast) => self.push(toast),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Toast receiver lagged");
                }
                Err(_) => break,
            }
        }
    }

    /// Drop toasts older than the dismiss delay as of `now`.
    pub fn expire(&mut self, now: DateTime<Utc>) {
        let ttl = chrono::Duration::from_std(self.dismiss_after).unwrap_or(chrono::Duration::MAX);
        self.items.retain(|t| now.signed_duration_since(t.created_at) < ttl);
    }

    pub fn dismiss(&mut self, id: Uuid) {
        self.items.retain(|t| t.id != id);
    }

    pub fn visible(&self) -> &[Toast] {
        &self.items
    }
}
