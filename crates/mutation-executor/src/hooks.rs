//! Lifecycle callbacks for a single mutation.

use portal_types::SyncError;
use std::sync::Mutex;

/// Callbacks invoked once per mutation: `on_success` or `on_error`, then
/// `on_settled`. Implementations must not block.
pub trait MutationHooks<R>: Send + Sync {
    fn on_success(&self, _result: &R) {}

    fn on_error(&self, _error: &SyncError) {}

    fn on_settled(&self) {}
}

/// Hooks that do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl<R> MutationHooks<R> for NoHooks {}

/// A hook invocation captured by [`RecordingHooks`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEvent {
    Success,
    Error(SyncError),
    Settled,
}

/// Hooks that record invocations (for testing).
#[derive(Debug, Default)]
pub struct RecordingHooks {
    events: Mutex<Vec<HookEvent>>,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HookEvent> {
        self.events.lock().expect("lock poisoned").clone()
    }

    fn record(&self, event: HookEvent) {
        self.events.lock().expect("lock poisoned").push(event);
    }
}

impl<R> MutationHooks<R> for RecordingHooks {
    fn on_success(&self, _result: &R) {
        self.record(HookEvent::Success);
    }

    fn on_error(&self, error: &SyncError) {
        self.record(HookEvent::Error(error.clone()));
    }

    fn on_settled(&self) {
        self.record(HookEvent::Settled);
    }
}
