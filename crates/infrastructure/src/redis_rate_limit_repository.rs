//! Request windows kept in Redis.
//!
//! A window is a single counter whose TTL is the window length. The window
//! start is recovered from the remaining TTL, so no timestamp is stored and
//! finished windows expire on their own.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use redis::Script;
use redis::aio::ConnectionManager;

use rosterhub_application::{AttemptInfo, RateLimitRepository};
use rosterhub_core::{AppError, AppResult};

/// Increments the counter, arming the TTL on the first hit of a window.
/// Returns the new count and the remaining TTL in milliseconds.
const COUNT_IN_WINDOW: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
  redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
local remaining = redis.call('PTTL', KEYS[1])
if remaining < 0 then
  redis.call('PEXPIRE', KEYS[1], ARGV[1])
  remaining = tonumber(ARGV[1])
end
return {count, remaining}
"#;

/// Per-tenant request counters shared across API instances through Redis.
#[derive(Clone)]
pub struct RedisRateLimitRepository {
    connection: ConnectionManager,
    script: Script,
    key_prefix: String,
}

impl RedisRateLimitRepository {
    /// Connects and namespaces every counter under `key_prefix`.
    pub async fn connect(redis_url: &str, key_prefix: impl Into<String>) -> AppResult<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|error| AppError::Validation(format!("invalid REDIS_URL: {error}")))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|error| AppError::Unavailable(format!("redis connection failed: {error}")))?;

        Ok(Self {
            connection,
            script: Script::new(COUNT_IN_WINDOW),
            key_prefix: key_prefix.into(),
        })
    }
}

#[async_trait]
impl RateLimitRepository for RedisRateLimitRepository {
    async fn record_attempt(
        &self,
        key: &str,
        window_seconds: i64,
        now: DateTime<Utc>,
    ) -> AppResult<AttemptInfo> {
        let window = TimeDelta::try_seconds(window_seconds)
            .filter(|window| *window > TimeDelta::zero())
            .ok_or_else(|| {
                AppError::Validation(format!("invalid rate limit window: {window_seconds}s"))
            })?;

        let mut connection = self.connection.clone();
        let (attempt_count, remaining_millis): (i64, i64) = self
            .script
            .key(format!("{}:{key}", self.key_prefix))
            .arg(window.num_milliseconds())
            .invoke_async(&mut connection)
            .await
            .map_err(|error| AppError::Unavailable(format!("redis counter failed: {error}")))?;

        let remaining = remaining_millis.clamp(0, window.num_milliseconds());
        let elapsed = window - TimeDelta::milliseconds(remaining);

        Ok(AttemptInfo {
            attempt_count,
            window_started_at: now - elapsed,
        })
    }

    /// Counters carry their own TTL; nothing is left to purge.
    async fn cleanup_expired(&self, _before: DateTime<Utc>) -> AppResult<u64> {
        Ok(0)
    }
}
