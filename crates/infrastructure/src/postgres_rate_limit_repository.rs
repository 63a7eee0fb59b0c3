//! Fixed request windows stored in `request_rate_limits`.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use sqlx::{FromRow, PgPool};

use rosterhub_application::{AttemptInfo, RateLimitRepository};
use rosterhub_core::{AppError, AppResult};

/// Request-window counters shared by every API instance on the same database.
#[derive(Clone)]
pub struct PostgresRateLimitRepository {
    pool: PgPool,
}

impl PostgresRateLimitRepository {
    /// Creates a repository on the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct WindowRow {
    attempt_count: i64,
    window_started_at: DateTime<Utc>,
}

fn store_error(action: &str, error: sqlx::Error) -> AppError {
    AppError::Unavailable(format!("failed to {action}: {error}"))
}

#[async_trait]
impl RateLimitRepository for PostgresRateLimitRepository {
    async fn record_attempt(
        &self,
        key: &str,
        window_seconds: i64,
        now: DateTime<Utc>,
    ) -> AppResult<AttemptInfo> {
        // A window that started at or before the cutoff is over.
        let cutoff = now - TimeDelta::seconds(window_seconds);

        let row = sqlx::query_as::<_, WindowRow>(
            r#"
            INSERT INTO request_rate_limits AS stored (key, window_started_at, attempt_count)
            VALUES ($1, $2, 1)
            ON CONFLICT (key) DO UPDATE
            SET
                attempt_count = CASE
                    WHEN stored.window_started_at <= $3 THEN 1
                    ELSE stored.attempt_count + 1
                END,
                window_started_at = CASE
                    WHEN stored.window_started_at <= $3 THEN EXCLUDED.window_started_at
                    ELSE stored.window_started_at
                END
            RETURNING attempt_count, window_started_at
            "#,
        )
        .bind(key)
        .bind(now)
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| store_error("count request", error))?;

        Ok(AttemptInfo {
            attempt_count: row.attempt_count,
            window_started_at: row.window_started_at,
        })
    }

    async fn cleanup_expired(&self, before: DateTime<Utc>) -> AppResult<u64> {
        sqlx::query("DELETE FROM request_rate_limits WHERE window_started_at < $1")
            .bind(before)
            .execute(&self.pool)
            .await
            .map(|result| result.rows_affected())
            .map_err(|error| store_error("purge request windows", error))
    }
}
