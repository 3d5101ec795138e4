//! User-facing notification seam.

use std::sync::Mutex;
use tracing::{info, warn};

/// Shows short, transient notices to the user (toasts, status lines).
///
/// Calls are fire-and-forget and must not block.
pub trait Notifier: Send + Sync {
    fn notify_success(&self, message: &str);

    fn notify_error(&self, message: &str);
}

/// Logs notices through tracing.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_success(&self, message: &str) {
        info!(notice = message, "Success");
    }

    fn notify_error(&self, message: &str) {
        warn!(notice = message, "Error");
    }
}

/// Discards notices.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify_success(&self, _message: &str) {}

    fn notify_error(&self, _message: &str) {}
}

/// A notice captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Error(String),
}

/// Records notices in memory (for testing).
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().expect("lock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.notifications.lock().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.notifications.lock().expect("lock poisoned").clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify_success(&self, message: &str) {
        self.notifications
            .lock()
            .expect("lock poisoned")
            .push(Notification::Success(message.to_string()));
    }

    fn notify_error(&self, message: &str) {
        self.notifications
            .lock()
            .expect("lock poisoned")
            .push(Notification::Error(message.to_string()));
    }
}
