use axum::Json;
use axum::extract::{Extension, State};
use rosterhub_domain::TenantContext;

use crate::dto::{LoginRequest, LoginResponse, MessageResponse, PasswordResetRequest, ResetPasswordRequest};
use crate::error::ApiResult;
use crate::state::AppState;

use super::RESET_REQUESTED_MESSAGE;

/// POST /auth/login - Authenticate with email+password.
pub async fn login_handler(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let session = state
        .user_service
        .login(&tenant, &payload.email, &payload.password)
        .await?;

    Ok(Json(session.into()))
}

/// POST /auth/request-reset and its alias POST /auth/forgot-password.
pub async fn request_reset_handler(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    Json(payload): Json<PasswordResetRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .password_reset_service
        .request_password_reset(&tenant, &payload.email)
        .await?;

    Ok(Json(MessageResponse::ok(RESET_REQUESTED_MESSAGE)))
}

/// POST /auth/reset-password - Redeem a reset token.
pub async fn reset_password_handler(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    Json(payload): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .password_reset_service
        .reset_password(&tenant, &payload.token, &payload.new_password)
        .await?;

    Ok(Json(MessageResponse::ok("password has been reset")))
}
