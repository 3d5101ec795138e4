//! Behavioral tests for the query cache.
//!
//! Organized by rule:
//!
//! - `dedup.rs`        - Concurrent subscribers share one in-flight fetch
//! - `generations.rs`  - Superseded fetches are aborted and never land
//! - `staleness.rs`    - Stale-while-revalidate and freshness windows
//! - `invalidation.rs` - Predicate, exact-key, and prefix invalidation
//! - `lifecycle.rs`    - Unsubscribe, GC timers, cancellation
//! - `failures.rs`     - Error states and retry

mod generations;

use futures_util::future::BoxFuture;
use portal_types::{QueryKey, SyncError, SyncResult};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

use crate::{CacheConfig, QueryCache};

/// Fetch source whose calls stay pending until the test answers them.
pub(crate) struct ManualSource<T> {
    calls: AtomicUsize,
    pending: Mutex<VecDeque<oneshot::Sender<SyncResult<T>>>>,
}

impl<T: Send + 'static> ManualSource<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            pending: Mutex::new(VecDeque::new()),
        })
    }

    pub fn fetcher(
        self: &Arc<Self>,
    ) -> impl Fn(QueryKey) -> BoxFuture<'static, SyncResult<T>> + Send + Sync + 'static {
        let source = Arc::clone(self);
        move |_key: QueryKey| -> BoxFuture<'static, SyncResult<T>> {
            let (sender, receiver) = oneshot::channel();
            source.calls.fetch_add(1, Ordering::SeqCst);
            source.pending.lock().unwrap().push_back(sender);
            Box::pin(async move { receiver.await.unwrap_or(Err(SyncError::Cancelled)) })
        }
    }

    /// Number of times the fetcher was invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Answers the oldest unanswered call. False if its fetch was dropped.
    pub fn resolve_oldest(&self, result: SyncResult<T>) -> bool {
        let sender = self.pending.lock().unwrap().pop_front();
        sender.is_some_and(|sender| sender.send(result).is_ok())
    }

    /// Answers the newest unanswered call. False if its fetch was dropped.
    pub fn resolve_newest(&self, result: SyncResult<T>) -> bool {
        let sender = self.pending.lock().unwrap().pop_back();
        sender.is_some_and(|sender| sender.send(result).is_ok())
    }
}

pub(crate) fn cache() -> QueryCache {
    QueryCache::in_current_runtime(CacheConfig::default())
}

pub(crate) fn cache_with(config: CacheConfig) -> QueryCache {
    QueryCache::in_current_runtime(config)
}

/// A config where values stay fresh long enough not to interfere.
pub(crate) fn fresh_config() -> CacheConfig {
    CacheConfig {
        stale_time: Duration::from_secs(60),
        ..Default::default()
    }
}

pub(crate) fn messages(id: &str) -> QueryKey {
    QueryKey::root("messages").with(id)
}

pub(crate) fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Lets woken fetch tasks run to completion on the current-thread runtime.
pub(crate) async fn settle_tasks() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}
