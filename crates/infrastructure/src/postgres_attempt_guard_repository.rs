//! PostgreSQL-backed guard counters in the `auth_guards` table.
//!
//! Each `record_*` call is a single `INSERT ... ON CONFLICT DO UPDATE`
//! statement whose `SET` expressions all read the pre-update row, so the new
//! count and any lock or window are derived from one consistent snapshot while
//! the row lock serializes concurrent writers.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use sqlx::PgPool;

use rosterhub_application::AttemptGuardRepository;
use rosterhub_core::{AppError, AppResult};
use rosterhub_domain::{
    GUARD_RETENTION_HOURS, GuardKey, GuardPurpose, GuardRecord, LoginAttemptPolicy,
    ResetThrottlePolicy,
};

/// PostgreSQL implementation of the attempt guard repository port.
#[derive(Clone)]
pub struct PostgresAttemptGuardRepository {
    pool: PgPool,
}

impl PostgresAttemptGuardRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn interval_seconds(delta: TimeDelta) -> f64 {
    delta.num_milliseconds() as f64 / 1000.0
}

#[async_trait]
impl AttemptGuardRepository for PostgresAttemptGuardRepository {
    async fn find_record(
        &self,
        key: &GuardKey,
        purpose: GuardPurpose,
    ) -> AppResult<Option<GuardRecord>> {
        let row = sqlx::query_as::<_, GuardRow>(
            r#"
            SELECT attempts, locked_until, window_end, created_at
            FROM auth_guards
            WHERE key = $1 AND purpose = $2
            "#,
        )
        .bind(key.as_str())
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Unavailable(format!("failed to read guard record: {error}")))?;

        row.map(GuardRecord::try_from).transpose()
    }

    async fn record_login_failure(
        &self,
        key: &GuardKey,
        policy: &LoginAttemptPolicy,
        now: DateTime<Utc>,
    ) -> AppResult<GuardRecord> {
        let max_attempts = i32::try_from(policy.max_attempts).map_err(|error| {
            AppError::Internal(format!("login policy attempt limit out of range: {error}"))
        })?;

        // Active lock: leave the row untouched. Expired lock: restart at 1.
        let row = sqlx::query_as::<_, GuardRow>(
            r#"
            INSERT INTO auth_guards AS guard (key, purpose, attempts, locked_until, window_end, created_at)
            VALUES (
                $1,
                'login',
                1,
                CASE WHEN 1 >= $3 THEN $2::timestamptz + make_interval(secs => $4) END,
                NULL,
                $2
            )
            ON CONFLICT (key, purpose) DO UPDATE
            SET
                attempts = CASE
                    WHEN guard.locked_until > $2 THEN guard.attempts
                    WHEN guard.locked_until IS NOT NULL THEN 1
                    ELSE guard.attempts + 1
                END,
                locked_until = CASE
                    WHEN guard.locked_until > $2 THEN guard.locked_until
                    WHEN guard.locked_until IS NOT NULL THEN EXCLUDED.locked_until
                    WHEN guard.attempts + 1 >= $3 THEN $2::timestamptz + make_interval(secs => $4)
                    ELSE NULL
                END,
                created_at = CASE
                    WHEN guard.locked_until <= $2 THEN EXCLUDED.created_at
                    ELSE guard.created_at
                END
            RETURNING attempts, locked_until, window_end, created_at
            "#,
        )
        .bind(key.as_str())
        .bind(now)
        .bind(max_attempts)
        .bind(interval_seconds(policy.lockout))
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Unavailable(format!("failed to record login failure: {error}"))
        })?;

        GuardRecord::try_from(row)
    }

    async fn record_reset_request(
        &self,
        key: &GuardKey,
        policy: &ResetThrottlePolicy,
        now: DateTime<Utc>,
    ) -> AppResult<GuardRecord> {
        let row = sqlx::query_as::<_, GuardRow>(
            r#"
            INSERT INTO auth_guards AS guard (key, purpose, attempts, locked_until, window_end, created_at)
            VALUES ($1, 'reset', 1, NULL, $2::timestamptz + make_interval(secs => $3), $2)
            ON CONFLICT (key, purpose) DO UPDATE
            SET
                attempts = CASE
                    WHEN guard.window_end > $2 THEN guard.attempts + 1
                    ELSE 1
                END,
                window_end = CASE
                    WHEN guard.window_end > $2 THEN guard.window_end
                    ELSE EXCLUDED.window_end
                END,
                created_at = CASE
                    WHEN guard.window_end > $2 THEN guard.created_at
                    ELSE EXCLUDED.created_at
                END
            RETURNING attempts, locked_until, window_end, created_at
            "#,
        )
        .bind(key.as_str())
        .bind(now)
        .bind(interval_seconds(policy.window))
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Unavailable(format!("failed to record reset request: {error}"))
        })?;

        GuardRecord::try_from(row)
    }

    async fn clear(&self, key: &GuardKey, purpose: GuardPurpose) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM auth_guards
            WHERE key = $1 AND purpose = $2
            "#,
        )
        .bind(key.as_str())
        .bind(purpose.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Unavailable(format!("failed to clear guard record: {error}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_if_expired(
        &self,
        key: &GuardKey,
        purpose: GuardPurpose,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM auth_guards
            WHERE key = $1
              AND purpose = $2
              AND COALESCE(locked_until, window_end) <= $3
            "#,
        )
        .bind(key.as_str())
        .bind(purpose.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Unavailable(format!("failed to expire guard record: {error}"))
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM auth_guards
            WHERE COALESCE(locked_until, window_end) <= $1
               OR (locked_until IS NULL AND window_end IS NULL AND created_at <= $2)
            "#,
        )
        .bind(now)
        .bind(now - TimeDelta::hours(GUARD_RETENTION_HOURS))
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Unavailable(format!("failed to purge expired guard records: {error}"))
        })?;

        Ok(result.rows_affected())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct GuardRow {
    attempts: i32,
    locked_until: Option<DateTime<Utc>>,
    window_end: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<GuardRow> for GuardRecord {
    type Error = AppError;

    fn try_from(row: GuardRow) -> Result<Self, Self::Error> {
        Ok(Self {
            attempts: u32::try_from(row.attempts).map_err(|error| {
                AppError::Internal(format!("stored guard attempts are negative: {error}"))
            })?,
            locked_until: row.locked_until,
            window_end: row.window_end,
            created_at: row.created_at,
        })
    }
}
