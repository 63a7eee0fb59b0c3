//! PostgreSQL-backed tenant users.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use rosterhub_application::{UserRecord, UserRepository};
use rosterhub_core::{AppError, AppResult, TenantId};
use rosterhub_domain::UserId;

/// PostgreSQL implementation of the user repository port.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(
        &self,
        tenant_id: &TenantId,
        email: &str,
    ) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, tenant_id, email, display_name, password_hash
            FROM tenant_users
            WHERE tenant_id = $1 AND email = lower($2)
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user by email: {error}")))?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn find_by_id(
        &self,
        tenant_id: &TenantId,
        user_id: UserId,
    ) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, tenant_id, email, display_name, password_hash
            FROM tenant_users
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user: {error}")))?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn create(&self, user: &UserRecord) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO tenant_users (id, tenant_id, email, display_name, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (tenant_id, email) DO NOTHING
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(user.tenant_id.as_str())
        .bind(user.email.as_str())
        .bind(user.display_name.as_str())
        .bind(user.password_hash.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create user: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "a user with this email already exists".to_owned(),
            ));
        }

        Ok(())
    }

    async fn update_password(
        &self,
        tenant_id: &TenantId,
        user_id: UserId,
        password_hash: &str,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE tenant_users
            SET password_hash = $3, updated_at = now()
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(user_id.as_uuid())
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update password: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("user not found".to_owned()));
        }

        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    tenant_id: String,
    email: String,
    display_name: String,
    password_hash: String,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::from_uuid(row.id),
            tenant_id: TenantId::parse(row.tenant_id)?,
            email: row.email,
            display_name: row.display_name,
            password_hash: row.password_hash,
        })
    }
}
