//! Scoped interest in a cache key.

use portal_types::QueryKey;
use std::fmt;
use tokio::sync::mpsc;

use crate::cache::QueryCache;
use crate::entry::{EntryState, QuerySnapshot};

/// A live view of one cache entry.
///
/// Every state transition of the entry after subscription is delivered in
/// order through [`changed`](Self::changed). Dropping the subscription
/// releases interest; when the last one goes, the entry's GC timer starts.
pub struct Subscription<T> {
    cache: QueryCache,
    key: QueryKey,
    id: u64,
    initial: QuerySnapshot<T>,
    receiver: mpsc::UnboundedReceiver<EntryState>,
}

impl<T> Subscription<T>
where
    T: Send + Sync + 'static,
{
    pub(crate) fn new(
        cache: QueryCache,
        key: QueryKey,
        id: u64,
        initial: QuerySnapshot<T>,
        receiver: mpsc::UnboundedReceiver<EntryState>,
    ) -> Self {
        Self {
            cache,
            key,
            id,
            initial,
            receiver,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// The entry as it was when this subscription was created.
    pub fn initial(&self) -> &QuerySnapshot<T> {
        &self.initial
    }

    /// The entry as it is now.
    pub fn current(&self) -> QuerySnapshot<T> {
        self.cache
            .snapshot(&self.key)
            .unwrap_or_else(|| QuerySnapshot::idle(self.key.clone()))
    }

    /// Waits for the next state transition.
    ///
    /// Returns `None` if the entry is no longer held.
    pub async fn changed(&mut self) -> Option<QuerySnapshot<T>> {
        let state = self.receiver.recv().await?;
        Some(QuerySnapshot::from_state(&state))
    }

    /// Next already-delivered transition, without waiting.
    pub fn try_changed(&mut self) -> Option<QuerySnapshot<T>> {
        let state = self.receiver.try_recv().ok()?;
        Some(QuerySnapshot::from_state(&state))
    }

    /// Waits until the entry's latest fetch has completed.
    ///
    /// Transitions from fetches older than the one current at call time are
    /// skipped.
    pub async fn settled(&mut self) -> QuerySnapshot<T> {
        let current = self.current();
        if current.status.is_settled() && !current.is_fetching {
            return current;
        }

        let target = current.generation;
        while let Some(state) = self.receiver.recv().await {
            if state.status.is_settled() && state.generation >= target {
                return QuerySnapshot::from_state(&state);
            }
        }
        self.current()
    }

    /// Refetches the entry on demand.
    pub fn refetch(&self) -> bool {
        self.cache.refetch(&self.key)
    }

    /// Releases interest. Equivalent to dropping.
    pub fn unsubscribe(self) {}
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.cache.unsubscribe(&self.key, self.id);
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("id", &self.id)
            .finish()
    }
}
