use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{auth, handlers, middleware};

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(build_tenant_routes(app_state.clone()))
        .merge(build_admin_routes(app_state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Routes that run behind the tenant pipeline.
fn build_tenant_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/request-reset", post(auth::request_reset_handler))
        .route("/auth/forgot-password", post(auth::request_reset_handler))
        .route("/auth/reset-password", post(auth::reset_password_handler))
        .route("/auth/me", get(auth::me_handler))
        .route_layer(from_fn_with_state(app_state, middleware::tenant_pipeline))
}

fn build_admin_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/admin/tenants",
            get(handlers::tenants::list_tenants_handler)
                .post(handlers::tenants::create_tenant_handler),
        )
        .route(
            "/admin/tenants/{tenant_id}",
            get(handlers::tenants::get_tenant_handler),
        )
        .route(
            "/admin/tenants/{tenant_id}/rotate-key",
            post(handlers::tenants::rotate_tenant_key_handler),
        )
        .route(
            "/admin/tenants/{tenant_id}/deactivate",
            post(handlers::tenants::deactivate_tenant_handler),
        )
        .route(
            "/admin/tenants/{tenant_id}/activate",
            post(handlers::tenants::activate_tenant_handler),
        )
        .route(
            "/admin/tenants/{tenant_id}/users",
            post(handlers::tenants::create_tenant_user_handler),
        )
        .route_layer(from_fn_with_state(app_state, middleware::require_admin))
}
