//! PostgreSQL-backed tenant registry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use rosterhub_application::{TenantRecord, TenantRegistry};
use rosterhub_core::{AppError, AppResult, TenantId};
use rosterhub_domain::AllowedOrigins;

/// PostgreSQL implementation of the tenant registry port.
#[derive(Clone)]
pub struct PostgresTenantRegistry {
    pool: PgPool,
}

impl PostgresTenantRegistry {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantRegistry for PostgresTenantRegistry {
    async fn find_by_api_key_hash(&self, api_key_hash: &str) -> AppResult<Option<TenantRecord>> {
        let row = sqlx::query_as::<_, TenantRow>(
            r#"
            SELECT id, name, api_key_hash, allowed_origins::text AS allowed_origins,
                   requests_per_minute, is_active, created_at
            FROM tenants
            WHERE api_key_hash = $1
            "#,
        )
        .bind(api_key_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find tenant by key: {error}")))?;

        row.map(TenantRecord::try_from).transpose()
    }

    async fn find_by_id(&self, tenant_id: &TenantId) -> AppResult<Option<TenantRecord>> {
        let row = sqlx::query_as::<_, TenantRow>(
            r#"
            SELECT id, name, api_key_hash, allowed_origins::text AS allowed_origins,
                   requests_per_minute, is_active, created_at
            FROM tenants
            WHERE id = $1
            "#,
        )
        .bind(tenant_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find tenant: {error}")))?;

        row.map(TenantRecord::try_from).transpose()
    }

    async fn list(&self) -> AppResult<Vec<TenantRecord>> {
        let rows = sqlx::query_as::<_, TenantRow>(
            r#"
            SELECT id, name, api_key_hash, allowed_origins::text AS allowed_origins,
                   requests_per_minute, is_active, created_at
            FROM tenants
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list tenants: {error}")))?;

        rows.into_iter().map(TenantRecord::try_from).collect()
    }

    async fn create(&self, tenant: &TenantRecord) -> AppResult<()> {
        let requests_per_minute = i32::try_from(tenant.requests_per_minute).map_err(|error| {
            AppError::Validation(format!("requests per minute out of range: {error}"))
        })?;

        let result = sqlx::query(
            r#"
            INSERT INTO tenants (
                id, name, api_key_hash, allowed_origins, requests_per_minute, is_active, created_at
            )
            VALUES ($1, $2, $3, $4::jsonb, $5, $6, $7)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(tenant.id.as_str())
        .bind(tenant.name.as_str())
        .bind(tenant.api_key_hash.as_str())
        .bind(tenant.allowed_origins.to_json().to_string())
        .bind(requests_per_minute)
        .bind(tenant.is_active)
        .bind(tenant.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create tenant: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "tenant '{}' already exists",
                tenant.id
            )));
        }

        Ok(())
    }

    async fn update_api_key_hash(
        &self,
        tenant_id: &TenantId,
        api_key_hash: &str,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE tenants
            SET api_key_hash = $2
            WHERE id = $1
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(api_key_hash)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to rotate tenant api key: {error}"))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("tenant '{tenant_id}' not found")));
        }

        Ok(())
    }

    async fn set_active(&self, tenant_id: &TenantId, is_active: bool) -> AppResult<TenantRecord> {
        let row = sqlx::query_as::<_, TenantRow>(
            r#"
            UPDATE tenants
            SET is_active = $2
            WHERE id = $1
            RETURNING id, name, api_key_hash, allowed_origins::text AS allowed_origins,
                      requests_per_minute, is_active, created_at
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update tenant status: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("tenant '{tenant_id}' not found")))?;

        TenantRecord::try_from(row)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TenantRow {
    id: String,
    name: String,
    api_key_hash: String,
    allowed_origins: String,
    requests_per_minute: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<TenantRow> for TenantRecord {
    type Error = AppError;

    fn try_from(row: TenantRow) -> Result<Self, Self::Error> {
        let origins: serde_json::Value = serde_json::from_str(&row.allowed_origins)
            .map_err(|error| {
                AppError::Internal(format!(
                    "tenant '{}' has malformed allowed origins: {error}",
                    row.id
                ))
            })?;

        Ok(Self {
            id: TenantId::parse(row.id)?,
            name: row.name,
            api_key_hash: row.api_key_hash,
            allowed_origins: AllowedOrigins::from_json(&origins)?,
            requests_per_minute: u32::try_from(row.requests_per_minute).map_err(|error| {
                AppError::Internal(format!("stored requests per minute is invalid: {error}"))
            })?,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}
