use rosterhub_core::{AccessDenial, AppResult};
use rosterhub_domain::TenantContext;

/// Accepts or rejects a cross-origin call for the resolved tenant.
///
/// Requests without an `Origin` header (server-to-server, curl, same-origin
/// navigations) are accepted. Anything else must be on the allow-list after
/// normalization.
pub fn check_origin(tenant: &TenantContext, origin: Option<&str>) -> AppResult<()> {
    let Some(origin) = origin.map(str::trim).filter(|origin| !origin.is_empty()) else {
        return Ok(());
    };

    if tenant.allowed_origins().contains(origin) {
        return Ok(());
    }

    tracing::info!(
        tenant_id = %tenant.id(),
        origin,
        "rejected request from origin outside allow-list"
    );

    Err(AccessDenial::OriginRejected {
        origin: origin.to_owned(),
    }
    .into())
}
