use async_trait::async_trait;
use chrono::{DateTime, Utc};

use rosterhub_core::AppResult;

/// Counter state returned after one request has been counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptInfo {
    /// Requests seen in the active window, the counted one included.
    pub attempt_count: i64,
    /// Start of the active window.
    pub window_started_at: DateTime<Utc>,
}

/// Storage for fixed request windows, keyed by `"{category}:{subject}"`.
#[async_trait]
pub trait RateLimitRepository: Send + Sync {
    /// Counts one request in a single atomic step.
    ///
    /// A window older than `window_seconds` is replaced by a fresh one that
    /// starts at `now` with a count of 1.
    async fn record_attempt(
        &self,
        key: &str,
        window_seconds: i64,
        now: DateTime<Utc>,
    ) -> AppResult<AttemptInfo>;

    /// Drops windows that started before `before`; returns how many.
    async fn cleanup_expired(&self, before: DateTime<Utc>) -> AppResult<u64>;
}
