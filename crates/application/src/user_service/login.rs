use rosterhub_core::{AccessDenial, AppError};
use rosterhub_domain::{EmailAddress, LoginAttemptStatus, TenantContext};

use super::*;

const INVALID_LOGIN_MESSAGE: &str = "invalid email or password";

impl UserService {
    /// Authenticates a user with email and password inside a tenant.
    ///
    /// Order matters: the lockout check runs before the user store is read,
    /// so a locked identity is refused with `LoginLocked` even when the
    /// password would have been correct.
    pub async fn login(
        &self,
        tenant: &TenantContext,
        email: &str,
        password: &str,
    ) -> AppResult<AuthenticatedSession> {
        let email = EmailAddress::new(email)?;
        if password.is_empty() {
            return Err(AppError::Validation("password is required".to_owned()));
        }

        let tenant_id = tenant.id();
        let status = self
            .login_guard
            .check_login_attempts(tenant_id, email.as_str())
            .await?;

        if !status.allowed {
            return Err(AccessDenial::LoginLocked {
                locked_for_seconds: status.locked_for_seconds.max(1),
            }
            .into());
        }

        let user = self
            .user_repository
            .find_by_email(tenant_id, email.as_str())
            .await?;

        let Some(user) = user else {
            // Hash anyway so unknown and known emails cost the same.
            let _ = self.password_hasher.hash_password(password);
            return self.reject_login(tenant_id, &email, status).await;
        };

        if !self
            .password_hasher
            .verify_password(password, &user.password_hash)?
        {
            return self.reject_login(tenant_id, &email, status).await;
        }

        if let Err(error) = self
            .login_guard
            .clear_login_attempts(tenant_id, email.as_str())
            .await
        {
            tracing::warn!(tenant_id = %tenant_id, error = %error, "failed to clear login attempts");
        }

        let identity = user.identity();
        let token = self.session_tokens.issue(&identity, self.clock.now())?;
        tracing::info!(tenant_id = %tenant_id, subject = identity.subject(), "user logged in");

        Ok(AuthenticatedSession { identity, token })
    }

    /// Verifies a session token and checks it belongs to the resolved tenant.
    pub fn current_identity(&self, tenant: &TenantContext, token: &str) -> AppResult<UserIdentity> {
        let identity = self.session_tokens.verify(token, self.clock.now())?;
        if !identity.belongs_to(tenant.id()) {
            return Err(AppError::Unauthorized(
                "session does not belong to this application".to_owned(),
            ));
        }

        Ok(identity)
    }

    async fn reject_login<T>(
        &self,
        tenant_id: &TenantId,
        email: &EmailAddress,
        before: LoginAttemptStatus,
    ) -> AppResult<T> {
        if let Err(error) = self
            .login_guard
            .record_failed_login(tenant_id, email.as_str())
            .await
        {
            // Only a failure that would have set the lock is worth refusing for.
            if before.remaining_attempts <= 1 {
                tracing::error!(
                    tenant_id = %tenant_id,
                    error = %error,
                    "could not record lock-establishing login failure"
                );
                return Err(error);
            }

            tracing::warn!(tenant_id = %tenant_id, error = %error, "failed to record login failure");
        }

        Err(AppError::Unauthorized(INVALID_LOGIN_MESSAGE.to_owned()))
    }
}
