//! Entry states as observed by subscribers.

use chrono::{DateTime, Utc};
use portal_types::{QueryKey, SyncError};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Type-erased cached value. Every observer of a key shares the same `Arc`.
pub type AnyData = Arc<dyn Any + Send + Sync>;

/// Lifecycle of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryStatus {
    /// Nothing fetched yet, or the last fetch was cancelled before any data arrived.
    Idle,
    /// A fetch is in flight. Previously fetched data, if any, is retained.
    Loading,
    /// The latest fetch succeeded.
    Success,
    /// The latest fetch failed. Previously fetched data, if any, is retained.
    Error,
}

impl QueryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStatus::Idle => "idle",
            QueryStatus::Loading => "loading",
            QueryStatus::Success => "success",
            QueryStatus::Error => "error",
        }
    }

    /// True for outcomes of a completed fetch.
    pub fn is_settled(&self) -> bool {
        matches!(self, QueryStatus::Success | QueryStatus::Error)
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Untyped entry state pushed through subscriber channels.
#[derive(Clone)]
pub struct EntryState {
    pub key: QueryKey,
    pub status: QueryStatus,
    pub data: Option<AnyData>,
    pub error: Option<SyncError>,
    pub fetched_at: Option<DateTime<Utc>>,
    /// Generation of the most recently issued fetch for this key.
    pub generation: u64,
    pub is_stale: bool,
    /// True while a fetch for this key is in flight.
    pub is_fetching: bool,
}

impl fmt::Debug for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryState")
            .field("key", &self.key)
            .field("status", &self.status)
            .field("has_data", &self.data.is_some())
            .field("error", &self.error)
            .field("fetched_at", &self.fetched_at)
            .field("generation", &self.generation)
            .field("is_stale", &self.is_stale)
            .field("is_fetching", &self.is_fetching)
            .finish()
    }
}

/// Typed view of an entry.
#[derive(Debug)]
pub struct QuerySnapshot<T> {
    pub key: QueryKey,
    pub status: QueryStatus,
    pub data: Option<Arc<T>>,
    pub error: Option<SyncError>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub generation: u64,
    pub is_stale: bool,
    pub is_fetching: bool,
}

impl<T> Clone for QuerySnapshot<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            fetched_at: self.fetched_at,
            generation: self.generation,
            is_stale: self.is_stale,
            is_fetching: self.is_fetching,
        }
    }
}

impl<T: Any + Send + Sync> QuerySnapshot<T> {
    pub(crate) fn from_state(state: &EntryState) -> Self {
        let data = match &state.data {
            Some(data) => match Arc::clone(data).downcast::<T>() {
                Ok(typed) => Some(typed),
                Err(_) => {
                    warn!(
                        key = %state.key,
                        expected = std::any::type_name::<T>(),
                        "Cached value has a different type than requested"
                    );
                    None
                }
            },
            None => None,
        };

        Self {
            key: state.key.clone(),
            status: state.status,
            data,
            error: state.error.clone(),
            fetched_at: state.fetched_at,
            generation: state.generation,
            is_stale: state.is_stale,
            is_fetching: state.is_fetching,
        }
    }

    /// State of a key the cache does not hold.
    pub(crate) fn idle(key: QueryKey) -> Self {
        Self {
            key,
            status: QueryStatus::Idle,
            data: None,
            error: None,
            fetched_at: None,
            generation: 0,
            is_stale: true,
            is_fetching: false,
        }
    }
}

impl<T> QuerySnapshot<T> {
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    /// Borrowed data, if any.
    pub fn data(&self) -> Option<&T> {
        self.data.as_deref()
    }
}
