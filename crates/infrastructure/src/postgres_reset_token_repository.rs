//! PostgreSQL-backed password-reset tokens.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use rosterhub_application::{ResetTokenRecord, ResetTokenRepository};
use rosterhub_core::{AppError, AppResult, TenantId};
use rosterhub_domain::UserId;

/// PostgreSQL implementation of the reset token repository port.
#[derive(Clone)]
pub struct PostgresResetTokenRepository {
    pool: PgPool,
}

impl PostgresResetTokenRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResetTokenRepository for PostgresResetTokenRepository {
    async fn insert(&self, token: &ResetTokenRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens
                (token_hash, tenant_id, user_id, expires_at, used_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(token.token_hash.as_str())
        .bind(token.tenant_id.as_str())
        .bind(token.user_id.as_uuid())
        .bind(token.expires_at)
        .bind(token.used_at)
        .bind(token.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to store reset token: {error}")))?;

        Ok(())
    }

    async fn invalidate_for_user(
        &self,
        tenant_id: &TenantId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE password_reset_tokens
            SET used_at = $3
            WHERE tenant_id = $1 AND user_id = $2 AND used_at IS NULL
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(user_id.as_uuid())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to invalidate reset tokens: {error}"))
        })?;

        Ok(())
    }

    async fn consume(
        &self,
        tenant_id: &TenantId,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<ResetTokenRecord>> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            UPDATE password_reset_tokens
            SET used_at = $3
            WHERE token_hash = $2
              AND tenant_id = $1
              AND used_at IS NULL
              AND expires_at > $3
            RETURNING token_hash, tenant_id, user_id, expires_at, used_at, created_at
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to consume reset token: {error}")))?;

        row.map(ResetTokenRecord::try_from).transpose()
    }

    async fn delete_expired(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM password_reset_tokens
            WHERE expires_at < $1
            "#,
        )
        .bind(before)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to purge expired reset tokens: {error}"))
        })?;

        Ok(result.rows_affected())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TokenRow {
    token_hash: String,
    tenant_id: String,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
    used_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TokenRow> for ResetTokenRecord {
    type Error = AppError;

    fn try_from(row: TokenRow) -> Result<Self, Self::Error> {
        Ok(Self {
            tenant_id: TenantId::parse(row.tenant_id)?,
            user_id: UserId::from_uuid(row.user_id),
            token_hash: row.token_hash,
            expires_at: row.expires_at,
            used_at: row.used_at,
            created_at: row.created_at,
        })
    }
}
