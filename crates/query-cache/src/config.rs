//! Cache tuning: staleness, garbage collection, retry.

use std::time::Duration;

/// Default grace period before an unobserved entry is dropped.
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(5 * 60);

/// Configuration for a [`QueryCache`](crate::QueryCache).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Age after which a successful entry is stale. Zero means always stale:
    /// cached values are served immediately and revalidated in the background.
    pub stale_time: Duration,
    /// How long an entry with no subscribers is kept before removal.
    pub gc_time: Duration,
    /// Automatic retry of failed fetches.
    pub retry: RetryPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::ZERO,
            gc_time: DEFAULT_GC_TIME,
            retry: RetryPolicy::none(),
        }
    }
}

/// Retry policy for failed fetches.
///
/// Retry delay follows exponential backoff: `base * 2^(retry - 1)` capped at
/// `max_delay`. With base 1s and max 30s:
///
/// | Retry | Delay |
/// |-------|-------|
/// | 1     | 1s    |
/// | 2     | 2s    |
/// | 3     | 4s    |
/// | 4     | 8s    |
/// | 6+    | 30s (capped) |
///
/// Only errors reporting [`is_retryable`](portal_types::SyncError::is_retryable)
/// are retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Zero disables retry.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Cap for the exponential growth.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// No automatic retries; callers refetch explicitly.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }

    /// Capped exponential backoff.
    pub fn exponential(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }

        let base_ms = self.base_delay.as_millis() as u64;
        let max_ms = self.max_delay.as_millis() as u64;
        let multiplier = 1u64.checked_shl(retry - 1).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(multiplier).min(max_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}
