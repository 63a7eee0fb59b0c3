//! Password reset via emailed single-use tokens.
//!
//! The request endpoint answers identically whether or not the email belongs
//! to an account. Only the throttle and token issuance differ internally.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use rosterhub_core::{AccessDenial, AppResult, TenantId};
use rosterhub_domain::{EmailAddress, TenantContext, UserId, validate_password};

use crate::{
    Clock, PasswordHasher, PasswordResetThrottle, UserRepository, generate_secret_token,
    hash_secret,
};

/// Reset tokens expire one hour after issuance.
const RESET_TOKEN_TTL_MINUTES: i64 = 60;

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Stored password-reset token. Only the hash of the raw token is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetTokenRecord {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Account the token resets.
    pub user_id: UserId,
    /// SHA-256 hex digest of the emailed token.
    pub token_hash: String,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
    /// When the token was redeemed or superseded.
    pub used_at: Option<DateTime<Utc>>,
    /// Issuance instant.
    pub created_at: DateTime<Utc>,
}

/// Repository port for reset tokens.
#[async_trait]
pub trait ResetTokenRepository: Send + Sync {
    /// Stores a freshly issued token.
    async fn insert(&self, token: &ResetTokenRecord) -> AppResult<()>;

    /// Marks every unused token of a user as used.
    async fn invalidate_for_user(
        &self,
        tenant_id: &TenantId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Atomically marks a token as used if it is unused and unexpired at
    /// `now`, returning it. Returns `None` for any other token.
    async fn consume(
        &self,
        tenant_id: &TenantId,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<ResetTokenRecord>>;

    /// Deletes tokens that expired before the cutoff. Returns the count.
    async fn delete_expired(&self, before: DateTime<Utc>) -> AppResult<u64>;
}

/// Port for outbound account email.
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Sends a password-reset link.
    async fn send_password_reset(
        &self,
        tenant: &TenantContext,
        to: &str,
        reset_url: &str,
    ) -> AppResult<()>;
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Application service for requesting and redeeming password resets.
#[derive(Clone)]
pub struct PasswordResetService {
    user_repository: Arc<dyn UserRepository>,
    token_repository: Arc<dyn ResetTokenRepository>,
    email_service: Arc<dyn EmailService>,
    password_hasher: Arc<dyn PasswordHasher>,
    throttle: PasswordResetThrottle,
    clock: Arc<dyn Clock>,
    frontend_url: String,
}

impl PasswordResetService {
    /// Creates a new password reset service.
    #[must_use]
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        token_repository: Arc<dyn ResetTokenRepository>,
        email_service: Arc<dyn EmailService>,
        password_hasher: Arc<dyn PasswordHasher>,
        throttle: PasswordResetThrottle,
        clock: Arc<dyn Clock>,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            user_repository,
            token_repository,
            email_service,
            password_hasher,
            throttle,
            clock,
            frontend_url: frontend_url.into().trim_end_matches('/').to_owned(),
        }
    }

    /// Handles a reset request for an email.
    ///
    /// Returns `ResetThrottled` once the identity has used its hourly budget.
    /// Otherwise always returns `Ok(())`; unknown emails are counted against
    /// the throttle like known ones but get no token.
    pub async fn request_password_reset(
        &self,
        tenant: &TenantContext,
        email: &str,
    ) -> AppResult<()> {
        let email = EmailAddress::new(email)?;
        let tenant_id = tenant.id();

        let status = self
            .throttle
            .check_reset_rate_limit(tenant_id, email.as_str())
            .await?;
        if !status.allowed {
            return Err(AccessDenial::ResetThrottled {
                retry_after_minutes: status.retry_after_minutes,
            }
            .into());
        }

        if let Err(error) = self
            .throttle
            .record_reset_attempt(tenant_id, email.as_str())
            .await
        {
            if status.remaining <= 1 {
                tracing::error!(
                    tenant_id = %tenant_id,
                    error = %error,
                    "could not record throttle-closing reset request"
                );
                return Err(error);
            }

            tracing::warn!(tenant_id = %tenant_id, error = %error, "failed to record reset request");
        }

        let Some(user) = self
            .user_repository
            .find_by_email(tenant_id, email.as_str())
            .await?
        else {
            tracing::debug!(tenant_id = %tenant_id, "reset requested for unknown email");
            return Ok(());
        };

        // Failures past this point are logged only, so known emails get the
        // same reply as unknown ones.
        let raw_token = match self.issue_token(tenant_id, user.id).await {
            Ok(raw_token) => raw_token,
            Err(error) => {
                tracing::error!(
                    tenant_id = %tenant_id,
                    error = %error,
                    "failed to issue reset token"
                );
                return Ok(());
            }
        };

        let reset_url = format!("{}/reset-password?token={raw_token}", self.frontend_url);
        if let Err(error) = self
            .email_service
            .send_password_reset(tenant, &user.email, &reset_url)
            .await
        {
            tracing::error!(tenant_id = %tenant_id, error = %error, "failed to send reset email");
        }

        Ok(())
    }

    /// Replaces any outstanding tokens of the user with a fresh one.
    async fn issue_token(&self, tenant_id: &TenantId, user_id: UserId) -> AppResult<String> {
        let now = self.clock.now();
        self.token_repository
            .invalidate_for_user(tenant_id, user_id, now)
            .await?;

        let (raw_token, token_hash) = generate_secret_token()?;
        self.token_repository
            .insert(&ResetTokenRecord {
                tenant_id: tenant_id.clone(),
                user_id,
                token_hash,
                expires_at: now + TimeDelta::minutes(RESET_TOKEN_TTL_MINUTES),
                used_at: None,
                created_at: now,
            })
            .await?;

        Ok(raw_token)
    }

    /// Redeems a reset token and stores the new password.
    ///
    /// Unknown, used, expired and foreign-tenant tokens all produce the same
    /// `InvalidOrExpiredResetToken` error. The login guard is left untouched.
    pub async fn reset_password(
        &self,
        tenant: &TenantContext,
        raw_token: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let raw_token = raw_token.trim();
        if raw_token.is_empty() {
            return Err(AccessDenial::InvalidOrExpiredResetToken.into());
        }

        validate_password(new_password)?;

        let tenant_id = tenant.id();
        let token = self
            .token_repository
            .consume(tenant_id, &hash_secret(raw_token), self.clock.now())
            .await?
            .ok_or(AccessDenial::InvalidOrExpiredResetToken)?;

        let user = self
            .user_repository
            .find_by_id(tenant_id, token.user_id)
            .await?
            .ok_or(AccessDenial::InvalidOrExpiredResetToken)?;

        let password_hash = self.password_hasher.hash_password(new_password)?;
        self.user_repository
            .update_password(tenant_id, user.id, &password_hash)
            .await?;

        tracing::info!(tenant_id = %tenant_id, user_id = %user.id, "password reset completed");
        Ok(())
    }
}
