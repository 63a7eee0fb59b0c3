use async_trait::async_trait;
use chrono::{DateTime, Utc};

use rosterhub_core::{AppResult, TenantId};
use rosterhub_domain::{AllowedOrigins, TenantContext};

/// Tenant registry row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantRecord {
    /// Tenant slug.
    pub id: TenantId,
    /// Display name.
    pub name: String,
    /// SHA-256 hex digest of the current API key.
    pub api_key_hash: String,
    /// Cross-origin allow-list.
    pub allowed_origins: AllowedOrigins,
    /// Per-minute request budget.
    pub requests_per_minute: u32,
    /// Deactivated tenants keep their row but are refused at resolution.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl TenantRecord {
    /// Builds the per-request context for this tenant.
    pub fn context(&self) -> AppResult<TenantContext> {
        TenantContext::new(
            self.id.clone(),
            self.name.clone(),
            self.allowed_origins.clone(),
            self.requests_per_minute,
        )
    }
}

/// Port for the persisted tenant registry.
#[async_trait]
pub trait TenantRegistry: Send + Sync {
    /// Finds the tenant whose stored key hash matches.
    async fn find_by_api_key_hash(&self, api_key_hash: &str) -> AppResult<Option<TenantRecord>>;

    /// Finds a tenant by id.
    async fn find_by_id(&self, tenant_id: &TenantId) -> AppResult<Option<TenantRecord>>;

    /// Lists all tenants ordered by id.
    async fn list(&self) -> AppResult<Vec<TenantRecord>>;

    /// Inserts a new tenant. Fails with `Conflict` when the id is taken.
    async fn create(&self, tenant: &TenantRecord) -> AppResult<()>;

    /// Replaces the stored key hash. Fails with `NotFound` for unknown tenants.
    async fn update_api_key_hash(&self, tenant_id: &TenantId, api_key_hash: &str)
    -> AppResult<()>;

    /// Activates or deactivates a tenant and returns the updated row.
    async fn set_active(&self, tenant_id: &TenantId, is_active: bool) -> AppResult<TenantRecord>;
}
