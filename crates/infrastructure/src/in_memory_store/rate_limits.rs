use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use rosterhub_application::{AttemptInfo, RateLimitRepository};
use rosterhub_core::AppResult;

use super::{InMemoryStore, count};

#[async_trait]
impl RateLimitRepository for InMemoryStore {
    async fn record_attempt(
        &self,
        key: &str,
        window_seconds: i64,
        now: DateTime<Utc>,
    ) -> AppResult<AttemptInfo> {
        let mut windows = self.request_windows.write().await;
        let window = TimeDelta::seconds(window_seconds);

        let info = windows
            .entry(key.to_owned())
            .and_modify(|info| {
                if info.window_started_at + window <= now {
                    info.attempt_count = 1;
                    info.window_started_at = now;
                } else {
                    info.attempt_count += 1;
                }
            })
            .or_insert_with(|| AttemptInfo {
                attempt_count: 1,
                window_started_at: now,
            });

        Ok(info.clone())
    }

    async fn cleanup_expired(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let mut windows = self.request_windows.write().await;
        let existing = windows.len();
        windows.retain(|_, info| info.window_started_at >= before);
        Ok(count(existing - windows.len()))
    }
}
