use rosterhub_application::AuthenticatedSession;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::common::UserIdentityResponse;

/// Incoming payload for email/password login.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/login-request.ts"
)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Session issued after a successful login.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/login-response.ts"
)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    /// RFC 3339 expiry of `token`.
    pub expires_at: String,
    pub user: UserIdentityResponse,
}

impl From<AuthenticatedSession> for LoginResponse {
    fn from(session: AuthenticatedSession) -> Self {
        Self {
            success: true,
            token: session.token.token,
            expires_at: session.token.expires_at.to_rfc3339(),
            user: session.identity.into(),
        }
    }
}

/// Current session owner.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/session-user-response.ts"
)]
pub struct SessionUserResponse {
    pub success: bool,
    pub user: UserIdentityResponse,
}

/// Incoming payload for a password-reset link request.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/password-reset-request.ts"
)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Incoming payload for redeeming a reset token.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/reset-password-request.ts"
)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}
