//! Keyed cache of remote results.
//!
//! A [`QueryCache`] maps [`QueryKey`](portal_types::QueryKey)s to entries
//! holding the latest fetched value, its status, and its subscribers:
//!
//! - Concurrent subscribers to a key share one in-flight fetch.
//! - Stale values are served immediately and revalidated in the background.
//! - Each fetch carries a generation; results of superseded fetches are dropped.
//! - Invalidation by predicate refetches observed entries right away.
//! - Entries without subscribers are collected after a grace period.

mod cache;
mod config;
mod entry;
mod subscription;

#[cfg(test)]
mod tests;

pub use cache::QueryCache;
pub use config::{CacheConfig, RetryPolicy, DEFAULT_GC_TIME};
pub use entry::{AnyData, EntryState, QuerySnapshot, QueryStatus};
pub use subscription::Subscription;
