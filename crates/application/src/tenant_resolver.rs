//! API key to tenant binding.

use std::sync::Arc;

use rosterhub_core::{AccessDenial, AppResult};
use rosterhub_domain::{LocalDevPolicy, RuntimeMode, TenantContext};

use crate::{StoreTimeout, TenantRegistry, hash_secret};

/// Tenant-identifying parts of an inbound request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestCredentials<'a> {
    /// Raw API key header value.
    pub api_key: Option<&'a str>,
    /// Request origin, taken from `Origin` or derived from `Referer`.
    pub origin: Option<&'a str>,
}

/// Resolves the tenant behind a request.
#[derive(Clone)]
pub struct TenantResolver {
    registry: Arc<dyn TenantRegistry>,
    mode: RuntimeMode,
    dev_fallback: TenantContext,
    local_policy: LocalDevPolicy,
    timeout: StoreTimeout,
}

impl TenantResolver {
    /// Creates a resolver.
    ///
    /// `dev_fallback` is only ever returned in [`RuntimeMode::Development`].
    #[must_use]
    pub fn new(
        registry: Arc<dyn TenantRegistry>,
        mode: RuntimeMode,
        dev_fallback: TenantContext,
        local_policy: LocalDevPolicy,
        timeout: StoreTimeout,
    ) -> Self {
        Self {
            registry,
            mode,
            dev_fallback,
            local_policy,
            timeout,
        }
    }

    /// Returns the runtime mode this resolver enforces.
    #[must_use]
    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }

    /// Produces the tenant context for a request or the denial reason.
    ///
    /// Store failures while looking up a presented key are returned as
    /// infrastructure errors; the request is never let through on them.
    pub async fn resolve(&self, credentials: RequestCredentials<'_>) -> AppResult<TenantContext> {
        let api_key = credentials
            .api_key
            .map(str::trim)
            .filter(|api_key| !api_key.is_empty());

        let Some(api_key) = api_key else {
            return self.resolve_without_key(credentials.origin);
        };

        let api_key_hash = hash_secret(api_key);
        let tenant = self
            .timeout
            .run(
                "tenant lookup",
                self.registry.find_by_api_key_hash(&api_key_hash),
            )
            .await?;

        let Some(tenant) = tenant else {
            return Err(AccessDenial::InvalidCredential.into());
        };

        if !tenant.is_active {
            tracing::info!(tenant_id = %tenant.id, "request for disabled tenant refused");
            return Err(AccessDenial::TenantDisabled.into());
        }

        tenant.context()
    }

    fn resolve_without_key(&self, origin: Option<&str>) -> AppResult<TenantContext> {
        if self.mode.is_production() {
            return Err(AccessDenial::MissingCredential.into());
        }

        let origin = origin.map(str::trim).filter(|origin| !origin.is_empty());
        match origin {
            None => Ok(self.dev_fallback.clone()),
            Some(origin) if self.local_policy.is_local_origin(origin) => {
                tracing::debug!(origin, "using local development tenant");
                Ok(self
                    .dev_fallback
                    .allowing_origin(origin)
                    .unwrap_or_else(|_| self.dev_fallback.clone()))
            }
            Some(_) => Err(AccessDenial::MissingCredential.into()),
        }
    }
}
