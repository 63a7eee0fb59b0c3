//! Tenant registry administration.
//!
//! Raw API keys leave this service exactly once, in the create or rotate
//! response. Only their hash is persisted, so rotating a key invalidates the
//! previous one on the next request.

use std::sync::Arc;

use rosterhub_core::{AppError, AppResult, NonEmptyString, TenantId};
use rosterhub_domain::AllowedOrigins;

use crate::{Clock, TenantRecord, TenantRegistry, generate_api_key};

/// Input for registering a tenant.
#[derive(Debug, Clone)]
pub struct CreateTenantInput {
    /// Tenant slug.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Cross-origin allow-list.
    pub allowed_origins: Vec<String>,
    /// Per-minute request budget.
    pub requests_per_minute: u32,
}

/// Tenant together with a freshly issued raw API key.
#[derive(Debug, Clone)]
pub struct IssuedTenantKey {
    /// Updated registry row.
    pub tenant: TenantRecord,
    /// Raw key. Not recoverable later.
    pub api_key: String,
}

/// Application service for tenant administration.
#[derive(Clone)]
pub struct TenantAdminService {
    registry: Arc<dyn TenantRegistry>,
    clock: Arc<dyn Clock>,
}

impl TenantAdminService {
    /// Creates a new tenant admin service.
    #[must_use]
    pub fn new(registry: Arc<dyn TenantRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self { registry, clock }
    }

    /// Registers a tenant and issues its first API key.
    pub async fn create_tenant(&self, input: CreateTenantInput) -> AppResult<IssuedTenantKey> {
        let id = TenantId::parse(input.id)?;
        let name = NonEmptyString::new(input.name.trim())?;
        let allowed_origins = AllowedOrigins::new(&input.allowed_origins)?;

        let (api_key, api_key_hash) = generate_api_key()?;
        let tenant = TenantRecord {
            id,
            name: name.into(),
            api_key_hash,
            allowed_origins,
            requests_per_minute: input.requests_per_minute,
            is_active: true,
            created_at: self.clock.now(),
        };
        tenant.context()?;

        self.registry.create(&tenant).await?;
        tracing::info!(tenant_id = %tenant.id, "tenant created");

        Ok(IssuedTenantKey { tenant, api_key })
    }

    /// Replaces a tenant's API key. The old key stops working immediately.
    pub async fn rotate_api_key(&self, tenant_id: &TenantId) -> AppResult<IssuedTenantKey> {
        let (api_key, api_key_hash) = generate_api_key()?;
        self.registry
            .update_api_key_hash(tenant_id, &api_key_hash)
            .await?;

        let tenant = self.get_tenant(tenant_id).await?;
        tracing::info!(tenant_id = %tenant_id, "tenant api key rotated");

        Ok(IssuedTenantKey { tenant, api_key })
    }

    /// Disables a tenant. Its key is refused with `TenantDisabled`.
    pub async fn deactivate_tenant(&self, tenant_id: &TenantId) -> AppResult<TenantRecord> {
        let tenant = self.registry.set_active(tenant_id, false).await?;
        tracing::info!(tenant_id = %tenant_id, "tenant deactivated");
        Ok(tenant)
    }

    /// Re-enables a tenant with its current key.
    pub async fn activate_tenant(&self, tenant_id: &TenantId) -> AppResult<TenantRecord> {
        let tenant = self.registry.set_active(tenant_id, true).await?;
        tracing::info!(tenant_id = %tenant_id, "tenant activated");
        Ok(tenant)
    }

    /// Returns one tenant.
    pub async fn get_tenant(&self, tenant_id: &TenantId) -> AppResult<TenantRecord> {
        self.registry
            .find_by_id(tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("tenant '{tenant_id}' not found")))
    }

    /// Lists every tenant.
    pub async fn list_tenants(&self) -> AppResult<Vec<TenantRecord>> {
        self.registry.list().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rosterhub_core::{AccessDenial, AppError};

    use crate::test_support::{FakeTenantRegistry, clock_at_start};
    use crate::{
        CreateTenantInput, RequestCredentials, StoreTimeout, TenantAdminService, TenantResolver,
    };
    use rosterhub_domain::{LocalDevPolicy, RuntimeMode};

    fn input(id: &str) -> CreateTenantInput {
        CreateTenantInput {
            id: id.to_owned(),
            name: "FC Köln".to_owned(),
            allowed_origins: vec!["https://admin.fckoeln.de".to_owned()],
            requests_per_minute: 120,
        }
    }

    fn setup() -> (TenantAdminService, TenantResolver) {
        let registry = Arc::new(FakeTenantRegistry::default());
        let admin = TenantAdminService::new(registry.clone(), clock_at_start());
        let resolver = TenantResolver::new(
            registry,
            RuntimeMode::Production,
            crate::test_support::tenant_context("dev", &[]),
            LocalDevPolicy::default(),
            StoreTimeout::default(),
        );
        (admin, resolver)
    }

    async fn resolve(resolver: &TenantResolver, api_key: &str) -> Result<String, AppError> {
        resolver
            .resolve(RequestCredentials {
                api_key: Some(api_key),
                origin: None,
            })
            .await
            .map(|context| context.id().to_string())
    }

    #[tokio::test]
    async fn created_key_resolves_and_is_stored_hashed() {
        let (admin, resolver) = setup();
        let issued = admin
            .create_tenant(input("fckoln"))
            .await
            .unwrap_or_else(|error| panic!("create failed: {error}"));

        assert_ne!(issued.tenant.api_key_hash, issued.api_key);
        assert_eq!(
            resolve(&resolver, &issued.api_key).await.ok(),
            Some("fckoln".to_owned())
        );
    }

    #[tokio::test]
    async fn duplicate_tenant_id_conflicts() {
        let (admin, _) = setup();
        assert!(admin.create_tenant(input("fckoln")).await.is_ok());
        assert!(matches!(
            admin.create_tenant(input("fckoln")).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn rotation_invalidates_previous_key() {
        let (admin, resolver) = setup();
        let first = admin
            .create_tenant(input("fckoln"))
            .await
            .unwrap_or_else(|error| panic!("create failed: {error}"));
        let rotated = admin
            .rotate_api_key(&first.tenant.id)
            .await
            .unwrap_or_else(|error| panic!("rotate failed: {error}"));

        assert!(matches!(
            resolve(&resolver, &first.api_key).await,
            Err(AppError::Denied(AccessDenial::InvalidCredential))
        ));
        assert!(resolve(&resolver, &rotated.api_key).await.is_ok());
    }

    #[tokio::test]
    async fn deactivation_disables_and_activation_restores() {
        let (admin, resolver) = setup();
        let issued = admin
            .create_tenant(input("fckoln"))
            .await
            .unwrap_or_else(|error| panic!("create failed: {error}"));

        let deactivated = admin.deactivate_tenant(&issued.tenant.id).await;
        assert!(deactivated.is_ok_and(|tenant| !tenant.is_active));
        assert!(matches!(
            resolve(&resolver, &issued.api_key).await,
            Err(AppError::Denied(AccessDenial::TenantDisabled))
        ));

        assert!(admin.activate_tenant(&issued.tenant.id).await.is_ok());
        assert!(resolve(&resolver, &issued.api_key).await.is_ok());
        assert_eq!(admin.list_tenants().await.map(|tenants| tenants.len()).ok(), Some(1));
    }

    #[tokio::test]
    async fn invalid_input_is_rejected() {
        let (admin, _) = setup();
        let mut zero_rate = input("fckoln");
        zero_rate.requests_per_minute = 0;
        assert!(matches!(
            admin.create_tenant(zero_rate).await,
            Err(AppError::Validation(_))
        ));

        let mut bad_origin = input("fckoln");
        bad_origin.allowed_origins = vec!["https://admin.fckoeln.de/path".to_owned()];
        assert!(admin.create_tenant(bad_origin).await.is_err());

        assert!(admin.create_tenant(input("FC Köln")).await.is_err());
    }
}
