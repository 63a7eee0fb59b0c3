use axum::http::HeaderName;
use rosterhub_application::{
    PasswordResetService, RateLimitService, TenantAdminService, TenantResolver, UserService,
};
use rosterhub_domain::RuntimeMode;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub tenant_resolver: TenantResolver,
    pub rate_limit_service: RateLimitService,
    pub user_service: UserService,
    pub password_reset_service: PasswordResetService,
    pub tenant_admin_service: TenantAdminService,
    pub api_key_header: HeaderName,
    /// SHA-256 of `ADMIN_TOKEN`; admin routes answer 404 when unset.
    pub admin_token_hash: Option<String>,
    pub runtime_mode: RuntimeMode,
}
