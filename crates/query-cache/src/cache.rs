//! The keyed cache.
//!
//! One `std::sync::Mutex` guards the key→slot map. Every state transition
//! (fetch start, settle, cancel, invalidation) happens under that lock and
//! pushes the resulting state to the key's subscribers before the lock is
//! released, so subscribers observe transitions in the order they happened.
//!
//! Fetches run as tasks on the cache's runtime handle, at most one per key.
//! Issuing a new fetch aborts the one in flight. Each fetch carries the
//! generation it was issued under; a result whose generation is no longer the
//! key's latest is discarded.

use chrono::Utc;
use futures_util::future::BoxFuture;
use portal_types::{QueryKey, SyncResult};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::{CacheConfig, RetryPolicy};
use crate::entry::{AnyData, EntryState, QuerySnapshot, QueryStatus};
use crate::subscription::Subscription;

type ErasedFetcher =
    Arc<dyn Fn(QueryKey) -> BoxFuture<'static, SyncResult<AnyData>> + Send + Sync + 'static>;

/// What happened to a completed fetch's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SettleOutcome {
    /// Stored and pushed to subscribers.
    Applied,
    /// A newer fetch was issued for the key; the result was dropped.
    Discarded,
    /// The entry was collected while the fetch ran.
    Missing,
}

struct InFlight {
    generation: u64,
    task: JoinHandle<()>,
}

struct GcTimer {
    epoch: u64,
    task: JoinHandle<()>,
}

struct Subscriber {
    id: u64,
    sender: mpsc::UnboundedSender<EntryState>,
}

struct Slot {
    status: QueryStatus,
    data: Option<AnyData>,
    error: Option<portal_types::SyncError>,
    fetched_at: Option<chrono::DateTime<Utc>>,
    fetched_instant: Option<Instant>,
    /// Generation of the latest issued fetch. Only grows.
    generation: u64,
    /// Latest generation at the time of the last invalidation. Cleared by a
    /// successful fetch issued after it.
    invalidated_at: Option<u64>,
    in_flight: Option<InFlight>,
    subscribers: Vec<Subscriber>,
    /// Fetcher of the most recent subscriber, used for refetches.
    fetcher: ErasedFetcher,
    gc: Option<GcTimer>,
}

impl Slot {
    fn new(fetcher: ErasedFetcher) -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            fetched_at: None,
            fetched_instant: None,
            generation: 0,
            invalidated_at: None,
            in_flight: None,
            subscribers: Vec::new(),
            fetcher,
            gc: None,
        }
    }

    fn is_stale(&self, stale_time: Duration) -> bool {
        if self.invalidated_at.is_some() {
            return true;
        }
        match self.fetched_instant {
            Some(at) => stale_time.is_zero() || at.elapsed() > stale_time,
            None => true,
        }
    }

    /// Status to fall back to when a fetch is cancelled.
    fn resting_status(&self) -> QueryStatus {
        if self.error.is_some() {
            QueryStatus::Error
        } else if self.data.is_some() {
            QueryStatus::Success
        } else {
            QueryStatus::Idle
        }
    }

    fn state(&self, key: &QueryKey, stale_time: Duration) -> EntryState {
        EntryState {
            key: key.clone(),
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            fetched_at: self.fetched_at,
            generation: self.generation,
            is_stale: self.is_stale(stale_time),
            is_fetching: self.in_flight.is_some(),
        }
    }

    /// Pushes the current state to every subscriber, in subscription order.
    fn notify(&self, key: &QueryKey, stale_time: Duration) {
        if self.subscribers.is_empty() {
            return;
        }
        let state = self.state(key, stale_time);
        for subscriber in &self.subscribers {
            // A closed receiver belongs to a subscription that is being
            // dropped; its unsubscribe removes it.
            let _ = subscriber.sender.send(state.clone());
        }
    }

    fn cancel_gc(&mut self) {
        if let Some(timer) = self.gc.take() {
            timer.task.abort();
        }
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.task.abort();
        }
        self.cancel_gc();
    }
}

struct CacheInner {
    entries: Mutex<HashMap<QueryKey, Slot>>,
    config: CacheConfig,
    runtime: Handle,
    next_subscriber: AtomicU64,
    next_gc_epoch: AtomicU64,
}

impl CacheInner {
    /// Issues a new fetch for `key` under a fresh generation.
    ///
    /// The fetcher is invoked before this returns; the returned future is
    /// driven on the runtime. A previous in-flight fetch is aborted.
    fn start_fetch(self: &Arc<Self>, key: &QueryKey, slot: &mut Slot) {
        slot.generation += 1;
        let generation = slot.generation;
        slot.status = QueryStatus::Loading;

        let fetcher = slot.fetcher.clone();
        let first = fetcher(key.clone());
        let retry = self.config.retry.clone();
        let weak = Arc::downgrade(self);
        let task_key = key.clone();

        let task = self.runtime.spawn(async move {
            let result = fetch_with_retry(&fetcher, &task_key, first, &retry).await;
            if let Some(inner) = weak.upgrade() {
                inner.settle(&task_key, generation, result);
            }
        });

        if let Some(previous) = slot.in_flight.replace(InFlight { generation, task }) {
            // A result racing the abort is discarded by the generation check.
            previous.task.abort();
            debug!(
                key = %key,
                superseded = previous.generation,
                generation,
                "Aborted superseded fetch"
            );
        } else {
            debug!(key = %key, generation, "Fetch started");
        }

        slot.notify(key, self.config.stale_time);
    }

    /// Stores a completed fetch's result if it belongs to the key's latest generation.
    fn settle(
        &self,
        key: &QueryKey,
        generation: u64,
        result: SyncResult<AnyData>,
    ) -> SettleOutcome {
        let mut entries = self.entries.lock().expect("lock poisoned");
        let Some(slot) = entries.get_mut(key) else {
            debug!(key = %key, generation, "Fetch settled after entry was collected");
            return SettleOutcome::Missing;
        };

        if generation != slot.generation {
            debug!(
                key = %key,
                generation,
                current = slot.generation,
                "Discarding result of superseded fetch"
            );
            return SettleOutcome::Discarded;
        }

        if slot
            .in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.generation == generation)
        {
            slot.in_flight = None;
        }

        match result {
            Ok(data) => {
                slot.status = QueryStatus::Success;
                slot.data = Some(data);
                slot.error = None;
                slot.fetched_at = Some(Utc::now());
                slot.fetched_instant = Some(Instant::now());
                if slot.invalidated_at.is_some_and(|at| generation > at) {
                    slot.invalidated_at = None;
                }
                debug!(key = %key, generation, "Fetch succeeded");
            }
            Err(error) => {
                warn!(key = %key, generation, error = %error, "Fetch failed");
                slot.status = QueryStatus::Error;
                slot.error = Some(error);
            }
        }

        slot.notify(key, self.config.stale_time);
        SettleOutcome::Applied
    }

    /// Removes `key` if its GC timer `epoch` is still current and nobody subscribed since.
    fn collect(&self, key: &QueryKey, epoch: u64) {
        let mut entries = self.entries.lock().expect("lock poisoned");
        let expired = entries.get(key).is_some_and(|slot| {
            slot.subscribers.is_empty()
                && slot.gc.as_ref().is_some_and(|timer| timer.epoch == epoch)
        });
        if !expired {
            return;
        }

        if let Some(mut slot) = entries.remove(key) {
            // This runs on the timer task itself; detach rather than abort it.
            slot.gc = None;
            let aborted = slot.in_flight.is_some();
            debug!(key = %key, aborted_fetch = aborted, "Collected unobserved entry");
        }
    }
}

/// Runs `first`, retrying per `policy` while the error is retryable.
async fn fetch_with_retry(
    fetcher: &ErasedFetcher,
    key: &QueryKey,
    first: BoxFuture<'static, SyncResult<AnyData>>,
    policy: &RetryPolicy,
) -> SyncResult<AnyData> {
    let mut result = first.await;
    let mut retries = 0;

    loop {
        match result {
            Err(error) if retries < policy.max_retries && error.is_retryable() => {
                retries += 1;
                let delay = policy.backoff(retries);
                warn!(
                    key = %key,
                    retry = retries,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Fetch failed, retrying"
                );
                tokio::time::sleep(delay).await;
                result = fetcher(key.clone()).await;
            }
            settled => return settled,
        }
    }
}

/// Keyed cache of remote results.
///
/// Cloning is cheap; clones share the same entries. Methods that can start a
/// fetch spawn it on the runtime handle given at construction, so they may be
/// called from any thread. Fetchers must not call back into the cache
/// synchronously.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

impl QueryCache {
    pub fn new(config: CacheConfig, runtime: Handle) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                entries: Mutex::new(HashMap::new()),
                config,
                runtime,
                next_subscriber: AtomicU64::new(1),
                next_gc_epoch: AtomicU64::new(1),
            }),
        }
    }

    /// Creates a cache bound to the runtime of the calling task.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn in_current_runtime(config: CacheConfig) -> Self {
        Self::new(config, Handle::current())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Registers interest in `key`, fetching with `fetcher` as needed.
    ///
    /// - No entry: one fetch starts; the initial snapshot is `Loading`.
    /// - In-flight fetch: the subscription shares it.
    /// - Stale success: the cached value is returned and revalidated in the background.
    /// - Fresh success: the cached value is returned.
    /// - Error or idle: a new fetch starts.
    ///
    /// The latest subscriber's fetcher is used for later refetches of the key.
    pub fn subscribe<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> Subscription<T>
    where
        T: Send + Sync + 'static,
        F: Fn(QueryKey) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SyncResult<T>> + Send + 'static,
    {
        let fetcher: ErasedFetcher =
            Arc::new(move |key: QueryKey| -> BoxFuture<'static, SyncResult<AnyData>> {
                let fetch = fetcher(key);
                Box::pin(async move { fetch.await.map(|data| Arc::new(data) as AnyData) })
            });

        let id = self.inner.next_subscriber.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();
        let stale_time = self.inner.config.stale_time;

        let initial = {
            let mut entries = self.inner.entries.lock().expect("lock poisoned");
            let slot = entries
                .entry(key.clone())
                .or_insert_with(|| Slot::new(fetcher.clone()));
            slot.fetcher = fetcher;
            slot.cancel_gc();

            if slot.status == QueryStatus::Idle && slot.in_flight.is_none() {
                self.inner.start_fetch(&key, slot);
            }

            slot.subscribers.push(Subscriber { id, sender });
            let state = slot.state(&key, stale_time);

            let revalidate = slot.in_flight.is_none()
                && match slot.status {
                    QueryStatus::Error => true,
                    QueryStatus::Success => slot.is_stale(stale_time),
                    QueryStatus::Idle | QueryStatus::Loading => false,
                };
            if revalidate {
                self.inner.start_fetch(&key, slot);
            }

            debug!(
                key = %key,
                subscriber = id,
                subscribers = slot.subscribers.len(),
                status = %state.status,
                "Subscribed"
            );
            state
        };

        Subscription::new(
            self.clone(),
            key,
            id,
            QuerySnapshot::from_state(&initial),
            receiver,
        )
    }

    /// Releases subscriber `id`. The last release arms the GC timer.
    pub(crate) fn unsubscribe(&self, key: &QueryKey, id: u64) {
        let mut entries = self.inner.entries.lock().expect("lock poisoned");
        let Some(slot) = entries.get_mut(key) else {
            return;
        };
        slot.subscribers.retain(|subscriber| subscriber.id != id);
        debug!(key = %key, subscriber = id, remaining = slot.subscribers.len(), "Unsubscribed");
        if !slot.subscribers.is_empty() {
            return;
        }

        let gc_time = self.inner.config.gc_time;
        if gc_time.is_zero() {
            entries.remove(key);
            debug!(key = %key, "Collected unobserved entry");
            return;
        }

        let epoch = self.inner.next_gc_epoch.fetch_add(1, Ordering::Relaxed);
        let weak = Arc::downgrade(&self.inner);
        let timer_key = key.clone();
        let task = self.inner.runtime.spawn(async move {
            tokio::time::sleep(gc_time).await;
            if let Some(inner) = weak.upgrade() {
                inner.collect(&timer_key, epoch);
            }
        });
        slot.cancel_gc();
        slot.gc = Some(GcTimer { epoch, task });
    }

    /// Marks every entry whose key satisfies `predicate` stale.
    ///
    /// Matching entries with subscribers refetch immediately; the rest
    /// refetch on their next subscription. Returns the number of matches.
    pub fn invalidate<P>(&self, predicate: P) -> usize
    where
        P: Fn(&QueryKey) -> bool,
    {
        let mut entries = self.inner.entries.lock().expect("lock poisoned");
        let mut matched = 0;
        let mut refetched = 0;

        for (key, slot) in entries.iter_mut() {
            if !predicate(key) {
                continue;
            }
            matched += 1;
            slot.invalidated_at = Some(slot.generation);
            if slot.subscribers.is_empty() {
                continue;
            }
            self.inner.start_fetch(key, slot);
            refetched += 1;
        }

        debug!(matched, refetched, "Invalidated entries");
        matched
    }

    /// Invalidates exactly `key`.
    pub fn invalidate_key(&self, key: &QueryKey) -> usize {
        self.invalidate(|candidate| candidate == key)
    }

    /// Invalidates `prefix` and every key extending it.
    pub fn invalidate_prefix(&self, prefix: &QueryKey) -> usize {
        self.invalidate(|candidate| candidate.starts_with(prefix))
    }

    /// Starts a new fetch for an existing entry, aborting any in flight.
    ///
    /// Returns `false` if the cache holds no entry for `key`.
    pub fn refetch(&self, key: &QueryKey) -> bool {
        let mut entries = self.inner.entries.lock().expect("lock poisoned");
        match entries.get_mut(key) {
            Some(slot) => {
                self.inner.start_fetch(key, slot);
                true
            }
            None => false,
        }
    }

    /// Aborts the in-flight fetch for `key`.
    ///
    /// The entry returns to its last settled state, or `Idle` if it never
    /// settled. Returns `false` if nothing was in flight.
    pub fn cancel(&self, key: &QueryKey) -> bool {
        let mut entries = self.inner.entries.lock().expect("lock poisoned");
        let Some(slot) = entries.get_mut(key) else {
            return false;
        };
        let Some(in_flight) = slot.in_flight.take() else {
            return false;
        };

        in_flight.task.abort();
        // A result racing the abort must not land.
        slot.generation += 1;
        slot.status = slot.resting_status();
        debug!(key = %key, generation = in_flight.generation, status = %slot.status, "Fetch cancelled");
        slot.notify(key, self.inner.config.stale_time);
        true
    }

    /// Typed view of the entry for `key`, if present.
    pub fn snapshot<T>(&self, key: &QueryKey) -> Option<QuerySnapshot<T>>
    where
        T: Send + Sync + 'static,
    {
        let entries = self.inner.entries.lock().expect("lock poisoned");
        entries
            .get(key)
            .map(|slot| QuerySnapshot::from_state(&slot.state(key, self.inner.config.stale_time)))
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.inner
            .entries
            .lock()
            .expect("lock poisoned")
            .contains_key(key)
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.inner.entries.lock().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys currently held, in no particular order.
    pub fn keys(&self) -> Vec<QueryKey> {
        self.inner
            .entries
            .lock()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    pub fn subscriber_count(&self, key: &QueryKey) -> usize {
        self.inner
            .entries
            .lock()
            .expect("lock poisoned")
            .get(key)
            .map_or(0, |slot| slot.subscribers.len())
    }

    /// True while a fetch for `key` is in flight.
    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.inner
            .entries
            .lock()
            .expect("lock poisoned")
            .get(key)
            .is_some_and(|slot| slot.in_flight.is_some())
    }

    #[cfg(test)]
    pub(crate) fn settle_for_test(
        &self,
        key: &QueryKey,
        generation: u64,
        result: SyncResult<AnyData>,
    ) -> SettleOutcome {
        self.inner.settle(key, generation, result)
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("config", &self.inner.config)
            .field("entries", &self.len())
            .finish()
    }
}
