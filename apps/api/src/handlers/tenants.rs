//! `/admin/tenants` endpoints. Guarded by `require_admin`, outside the
//! tenant pipeline.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use rosterhub_application::{CreateTenantInput, NewUser};
use rosterhub_core::TenantId;

use crate::dto::{
    CreateTenantRequest, CreateTenantUserRequest, IssuedTenantKeyResponse, TenantResponse,
    TenantUserResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_tenant_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateTenantRequest>,
) -> ApiResult<(StatusCode, Json<IssuedTenantKeyResponse>)> {
    let issued = state
        .tenant_admin_service
        .create_tenant(CreateTenantInput {
            id: payload.id,
            name: payload.name,
            allowed_origins: payload.allowed_origins,
            requests_per_minute: payload.requests_per_minute,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(issued.into())))
}

pub async fn list_tenants_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<TenantResponse>>> {
    let tenants = state.tenant_admin_service.list_tenants().await?;
    Ok(Json(tenants.into_iter().map(TenantResponse::from).collect()))
}

pub async fn get_tenant_handler(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> ApiResult<Json<TenantResponse>> {
    let tenant_id = TenantId::parse(tenant_id)?;
    let tenant = state.tenant_admin_service.get_tenant(&tenant_id).await?;
    Ok(Json(tenant.into()))
}

pub async fn rotate_tenant_key_handler(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> ApiResult<Json<IssuedTenantKeyResponse>> {
    let tenant_id = TenantId::parse(tenant_id)?;
    let issued = state.tenant_admin_service.rotate_api_key(&tenant_id).await?;
    Ok(Json(issued.into()))
}

pub async fn deactivate_tenant_handler(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> ApiResult<Json<TenantResponse>> {
    let tenant_id = TenantId::parse(tenant_id)?;
    let tenant = state
        .tenant_admin_service
        .deactivate_tenant(&tenant_id)
        .await?;
    Ok(Json(tenant.into()))
}

pub async fn activate_tenant_handler(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> ApiResult<Json<TenantResponse>> {
    let tenant_id = TenantId::parse(tenant_id)?;
    let tenant = state.tenant_admin_service.activate_tenant(&tenant_id).await?;
    Ok(Json(tenant.into()))
}

/// POST /admin/tenants/{id}/users - Provision an account in an existing tenant.
pub async fn create_tenant_user_handler(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Json(payload): Json<CreateTenantUserRequest>,
) -> ApiResult<(StatusCode, Json<TenantUserResponse>)> {
    let tenant_id = TenantId::parse(tenant_id)?;
    // 404 for unknown tenants rather than orphaned users.
    state.tenant_admin_service.get_tenant(&tenant_id).await?;

    let user = state
        .user_service
        .create_user(
            &tenant_id,
            NewUser {
                email: payload.email,
                display_name: payload.display_name,
                password: payload.password,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}
