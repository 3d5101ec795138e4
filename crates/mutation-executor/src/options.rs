//! Per-call mutation options.

use portal_types::QueryKey;
use std::fmt;
use std::sync::Arc;

use crate::hooks::{MutationHooks, NoHooks};

/// What to invalidate on success and whom to tell about the outcome.
pub struct MutationOptions<R> {
    /// Key prefixes invalidated after a successful mutation.
    pub invalidates: Vec<QueryKey>,
    pub hooks: Arc<dyn MutationHooks<R>>,
}

impl<R> MutationOptions<R> {
    pub fn new() -> Self {
        Self {
            invalidates: Vec::new(),
            hooks: Arc::new(NoHooks),
        }
    }

    /// Adds a key prefix to invalidate on success.
    pub fn invalidate(mut self, prefix: QueryKey) -> Self {
        self.invalidates.push(prefix);
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn MutationHooks<R>>) -> Self {
        self.hooks = hooks;
        self
    }
}

impl<R> Default for MutationOptions<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for MutationOptions<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationOptions")
            .field("invalidates", &self.invalidates)
            .finish_non_exhaustive()
    }
}
