//! Mutation pipeline: validate, send, invalidate, report.

use portal_types::{MutationRequest, QueryKey, SyncError, SyncResult};
use query_cache::QueryCache;
use remote_resource::RemoteResource;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::handle::MutationHandle;
use crate::hooks::MutationHooks;
use crate::options::MutationOptions;

/// Runs mutations against the remote resource and invalidates the cache
/// entries they affect.
///
/// Any number of mutations may run concurrently. Cloning is cheap; clones
/// share the pending counter.
#[derive(Clone)]
pub struct MutationExecutor {
    resource: RemoteResource,
    cache: QueryCache,
    pending: Arc<AtomicUsize>,
}

/// Delivers a mutation's terminal hooks exactly once and releases its
/// pending markers.
///
/// Dropped without an outcome (the task was aborted), it reports
/// [`SyncError::Cancelled`].
struct Settlement<R> {
    hooks: Arc<dyn MutationHooks<R>>,
    pending: Arc<AtomicUsize>,
    flag: Option<Arc<AtomicBool>>,
    settled: bool,
}

impl<R> Settlement<R> {
    fn enter(
        hooks: Arc<dyn MutationHooks<R>>,
        pending: &Arc<AtomicUsize>,
        flag: Option<Arc<AtomicBool>>,
    ) -> Self {
        pending.fetch_add(1, Ordering::SeqCst);
        Self {
            hooks,
            pending: Arc::clone(pending),
            flag,
            settled: false,
        }
    }

    fn succeed(mut self, result: &R) {
        self.settled = true;
        self.hooks.on_success(result);
        self.hooks.on_settled();
    }

    fn fail(mut self, error: &SyncError) {
        self.settled = true;
        self.hooks.on_error(error);
        self.hooks.on_settled();
    }
}

impl<R> Drop for Settlement<R> {
    fn drop(&mut self) {
        if !self.settled {
            self.hooks.on_error(&SyncError::Cancelled);
            self.hooks.on_settled();
        }
        self.pending.fetch_sub(1, Ordering::SeqCst);
        if let Some(flag) = &self.flag {
            flag.store(false, Ordering::SeqCst);
        }
    }
}

impl MutationExecutor {
    pub fn new(resource: RemoteResource, cache: QueryCache) -> Self {
        Self {
            resource,
            cache,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of mutations currently running.
    pub fn pending_count(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Runs `request` to completion.
    ///
    /// Validation failures never reach the transport. On success every
    /// prefix in `options.invalidates` is invalidated before `on_success`
    /// runs; on failure nothing is invalidated. `on_settled` always runs last,
    /// also when the future is dropped mid-flight.
    pub async fn run<R>(&self, request: MutationRequest, options: MutationOptions<R>) -> SyncResult<R>
    where
        R: DeserializeOwned,
    {
        let settlement = Settlement::enter(options.hooks, &self.pending, None);
        self.execute(Uuid::new_v4(), request, options.invalidates, settlement)
            .await
    }

    /// Runs `request` in the background.
    ///
    /// Aborting the returned handle reports [`SyncError::Cancelled`] through
    /// the hooks. Must be called from within a Tokio runtime.
    pub fn spawn<R>(&self, request: MutationRequest, options: MutationOptions<R>) -> MutationHandle<R>
    where
        R: DeserializeOwned + Send + 'static,
    {
        let id = Uuid::new_v4();
        let kind = request.kind();
        let pending = Arc::new(AtomicBool::new(true));
        let settlement =
            Settlement::enter(options.hooks, &self.pending, Some(Arc::clone(&pending)));
        let invalidates = options.invalidates;
        let executor = self.clone();

        let task = tokio::spawn(async move {
            executor
                .execute(id, request, invalidates, settlement)
                .await
        });

        MutationHandle::new(id, kind, pending, task)
    }

    async fn execute<R>(
        &self,
        id: Uuid,
        request: MutationRequest,
        invalidates: Vec<QueryKey>,
        settlement: Settlement<R>,
    ) -> SyncResult<R>
    where
        R: DeserializeOwned,
    {
        let kind = request.kind();

        if let Err(e) = request.validate() {
            let error = SyncError::from(e);
            warn!(mutation = %id, kind = %kind, error = %error, "Mutation rejected");
            settlement.fail(&error);
            return Err(error);
        }

        debug!(mutation = %id, kind = %kind, "Mutation started");

        match self.resource.mutate::<R>(&request).await {
            Ok(result) => {
                let mut invalidated = 0;
                for prefix in &invalidates {
                    invalidated += self.cache.invalidate_prefix(prefix);
                }
                info!(
                    mutation = %id,
                    kind = %kind,
                    prefixes = invalidates.len(),
                    invalidated,
                    "Mutation succeeded"
                );
                settlement.succeed(&result);
                Ok(result)
            }
            Err(e) => {
                let error = SyncError::from(e);
                warn!(mutation = %id, kind = %kind, error = %error, "Mutation failed");
                settlement.fail(&error);
                Err(error)
            }
        }
    }
}
