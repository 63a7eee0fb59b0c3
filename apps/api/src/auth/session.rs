use axum::Json;
use axum::extract::{Extension, State};
use axum::http::{HeaderMap, header};
use rosterhub_core::AppError;
use rosterhub_domain::TenantContext;

use crate::dto::SessionUserResponse;
use crate::error::ApiResult;
use crate::state::AppState;

/// GET /auth/me - Returns the owner of the bearer session token.
pub async fn me_handler(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    headers: HeaderMap,
) -> ApiResult<Json<SessionUserResponse>> {
    let token = bearer_token(&headers)
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let identity = state.user_service.current_identity(&tenant, token)?;

    Ok(Json(SessionUserResponse {
        success: true,
        user: identity.into(),
    }))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
