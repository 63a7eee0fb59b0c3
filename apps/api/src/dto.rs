mod auth;
mod common;
mod tenants;

pub use auth::{
    LoginRequest, LoginResponse, PasswordResetRequest, ResetPasswordRequest, SessionUserResponse,
};
pub use common::{HealthResponse, MessageResponse, UserIdentityResponse};
pub use tenants::{
    CreateTenantRequest, CreateTenantUserRequest, IssuedTenantKeyResponse, TenantResponse,
    TenantUserResponse,
};
