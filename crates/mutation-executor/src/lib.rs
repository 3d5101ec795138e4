//! Mutation execution.
//!
//! A [`MutationExecutor`] validates a [`MutationRequest`](portal_types::MutationRequest),
//! sends it through the [`RemoteResource`](remote_resource::RemoteResource),
//! invalidates the cache keys the caller names on success, and reports the
//! outcome through [`MutationHooks`]. Errors are returned to the caller and
//! never presented to users from here.

mod executor;
mod handle;
mod hooks;
mod options;

pub use executor::MutationExecutor;
pub use handle::MutationHandle;
pub use hooks::{HookEvent, MutationHooks, NoHooks, RecordingHooks};
pub use options::MutationOptions;
