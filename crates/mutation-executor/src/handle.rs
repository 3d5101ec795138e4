//! Handle to a spawned mutation.

use portal_types::{MutationKind, SyncError, SyncResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// A mutation running in the background.
#[derive(Debug)]
pub struct MutationHandle<R> {
    id: Uuid,
    kind: MutationKind,
    pending: Arc<AtomicBool>,
    task: JoinHandle<SyncResult<R>>,
}

impl<R> MutationHandle<R> {
    pub(crate) fn new(
        id: Uuid,
        kind: MutationKind,
        pending: Arc<AtomicBool>,
        task: JoinHandle<SyncResult<R>>,
    ) -> Self {
        Self {
            id,
            kind,
            pending,
            task,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    /// True until the mutation has settled.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Aborts the mutation. Its hooks observe [`SyncError::Cancelled`]. A
    /// request already sent may still take effect server-side.
    pub fn abort(&self) {
        self.task.abort();
        self.pending.store(false, Ordering::SeqCst);
    }

    /// Waits for the outcome. An aborted mutation yields [`SyncError::Cancelled`].
    pub async fn join(self) -> SyncResult<R> {
        match self.task.await {
            Ok(result) => result,
            Err(_) => {
                self.pending.store(false, Ordering::SeqCst);
                Err(SyncError::Cancelled)
            }
        }
    }
}
