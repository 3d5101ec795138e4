//! Conversation sync.
//!
//! [`ConversationSyncController`] is what screens talk to: it exposes
//! conversations, messages, and posts as cache subscriptions and performs
//! sends and engagement actions through the mutation executor, invalidating
//! the affected keys so open views refetch.

mod controller;
pub mod keys;
mod notifier;

#[cfg(test)]
mod tests;

pub use controller::ConversationSyncController;
pub use notifier::{Notification, Notifier, NullNotifier, RecordingNotifier, TracingNotifier};
