use std::sync::Arc;

use rosterhub_application::{
    Clock, PasswordHasher, RateLimitService, TenantAdminService, TenantResolver, hash_secret,
};
use rosterhub_core::AppResult;

use crate::api_config::ApiConfig;
use crate::state::AppState;

mod accounts;
mod repositories;

pub use repositories::StoreSet;

/// Wires services over an already chosen set of stores.
pub fn assemble_app_state(
    stores: StoreSet,
    clock: Arc<dyn Clock>,
    password_hasher: Arc<dyn PasswordHasher>,
    config: &ApiConfig,
) -> AppResult<AppState> {
    let tenant_resolver = TenantResolver::new(
        stores.tenant_registry.clone(),
        config.runtime_mode,
        config.dev_tenant.clone(),
        config.local_dev_policy.clone(),
        config.store_timeout,
    );

    let rate_limit_service = RateLimitService::new(
        stores.rate_limit_repository.clone(),
        clock.clone(),
        config.store_timeout,
    );

    let accounts = accounts::build_account_services(&stores, clock.clone(), password_hasher, config)?;

    Ok(AppState {
        tenant_resolver,
        rate_limit_service,
        user_service: accounts.user_service,
        password_reset_service: accounts.password_reset_service,
        tenant_admin_service: TenantAdminService::new(stores.tenant_registry, clock),
        api_key_header: config.api_key_header.clone(),
        admin_token_hash: config.admin_token.as_deref().map(hash_secret),
        runtime_mode: config.runtime_mode,
    })
}
