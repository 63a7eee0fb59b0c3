use rosterhub_application::{IssuedTenantKey, TenantRecord, UserRecord};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for tenant registration.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-tenant-request.ts"
)]
pub struct CreateTenantRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    pub requests_per_minute: u32,
}

/// API representation of a tenant. Never carries the key hash.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/tenant-response.ts"
)]
pub struct TenantResponse {
    pub id: String,
    pub name: String,
    pub allowed_origins: Vec<String>,
    pub requests_per_minute: u32,
    pub is_active: bool,
    pub created_at: String,
}

impl From<TenantRecord> for TenantResponse {
    fn from(tenant: TenantRecord) -> Self {
        Self {
            id: tenant.id.to_string(),
            allowed_origins: tenant.allowed_origins.iter().map(str::to_owned).collect(),
            name: tenant.name,
            requests_per_minute: tenant.requests_per_minute,
            is_active: tenant.is_active,
            created_at: tenant.created_at.to_rfc3339(),
        }
    }
}

/// Tenant plus its raw API key, returned once on create and rotate.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/issued-tenant-key-response.ts"
)]
pub struct IssuedTenantKeyResponse {
    pub tenant: TenantResponse,
    pub api_key: String,
}

impl From<IssuedTenantKey> for IssuedTenantKeyResponse {
    fn from(issued: IssuedTenantKey) -> Self {
        Self {
            tenant: issued.tenant.into(),
            api_key: issued.api_key,
        }
    }
}

/// Incoming payload for provisioning a tenant user.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-tenant-user-request.ts"
)]
pub struct CreateTenantUserRequest {
    pub email: String,
    pub display_name: String,
    pub password: String,
}

/// API representation of a provisioned user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/tenant-user-response.ts"
)]
pub struct TenantUserResponse {
    pub id: String,
    pub tenant_id: String,
    pub email: String,
    pub display_name: String,
}

impl From<UserRecord> for TenantUserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id.to_string(),
            tenant_id: user.tenant_id.to_string(),
            email: user.email,
            display_name: user.display_name,
        }
    }
}
