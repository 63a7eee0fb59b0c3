use thiserror::Error;

/// Reasons the request pipeline or an abuse-control guard refuses a request.
///
/// Every variant maps to a stable machine code that clients can branch on.
/// Messages never reveal whether an identity exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDenial {
    /// No API key and the request is not eligible for the local-dev fallback.
    #[error("an API key is required")]
    MissingCredential,

    /// An API key was supplied but does not match any tenant.
    #[error("invalid API key")]
    InvalidCredential,

    /// The API key matches a tenant that has been deactivated.
    #[error("this application has been disabled")]
    TenantDisabled,

    /// The request origin is not on the tenant allow-list.
    #[error("origin '{origin}' is not allowed for this application")]
    OriginRejected {
        /// Origin header value that was rejected.
        origin: String,
    },

    /// The tenant exceeded its requests-per-minute budget.
    #[error("too many requests, retry in {retry_after_seconds} seconds")]
    RateExceeded {
        /// Seconds until the current window closes.
        retry_after_seconds: u64,
    },

    /// Too many failed logins for this identity; locked out.
    #[error("too many failed login attempts, try again in {locked_for_seconds} seconds")]
    LoginLocked {
        /// Seconds until the lock expires.
        locked_for_seconds: u64,
    },

    /// Too many password-reset requests for this identity.
    #[error("too many password reset requests, try again in {retry_after_minutes} minutes")]
    ResetThrottled {
        /// Minutes until the reset window closes.
        retry_after_minutes: u64,
    },

    /// Reset token is unknown, used, or expired.
    #[error("invalid or expired reset token")]
    InvalidOrExpiredResetToken,
}

impl AccessDenial {
    /// Stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::InvalidCredential => "invalid_credential",
            Self::TenantDisabled => "tenant_disabled",
            Self::OriginRejected { .. } => "origin_rejected",
            Self::RateExceeded { .. } => "rate_exceeded",
            Self::LoginLocked { .. } => "login_locked",
            Self::ResetThrottled { .. } => "reset_throttled",
            Self::InvalidOrExpiredResetToken => "invalid_or_expired_reset_token",
        }
    }

    /// Seconds a client should wait before retrying, for throttling denials.
    #[must_use]
    pub fn retry_after_seconds(&self) -> Option<u64> {
        match self {
            Self::RateExceeded {
                retry_after_seconds,
            } => Some(*retry_after_seconds),
            Self::LoginLocked { locked_for_seconds } => Some(*locked_for_seconds),
            Self::ResetThrottled {
                retry_after_minutes,
            } => Some(retry_after_minutes.saturating_mul(60)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AccessDenial;

    #[test]
    fn throttling_denials_report_retry_hint() {
        assert_eq!(
            AccessDenial::ResetThrottled {
                retry_after_minutes: 12
            }
            .retry_after_seconds(),
            Some(720)
        );
        assert_eq!(
            AccessDenial::LoginLocked {
                locked_for_seconds: 90
            }
            .retry_after_seconds(),
            Some(90)
        );
        assert_eq!(AccessDenial::TenantDisabled.retry_after_seconds(), None);
    }

    #[test]
    fn login_lock_message_does_not_mention_identity() {
        let message = AccessDenial::LoginLocked {
            locked_for_seconds: 30,
        }
        .to_string();
        assert!(!message.contains('@'));
        assert!(message.contains("30 seconds"));
    }
}
