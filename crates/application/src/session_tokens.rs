use chrono::{DateTime, Utc};

use rosterhub_core::{AppResult, UserIdentity};

/// Signed session token handed out after a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    /// Encoded bearer token.
    pub token: String,
    /// Instant after which the token is rejected.
    pub expires_at: DateTime<Utc>,
}

/// Port for issuing and verifying session tokens.
///
/// Both operations take the caller's `now` so expiry follows the same clock
/// as the guards.
pub trait SessionTokenIssuer: Send + Sync {
    /// Issues a token for an authenticated identity.
    fn issue(&self, identity: &UserIdentity, now: DateTime<Utc>) -> AppResult<SessionToken>;

    /// Verifies a token and returns the identity it carries.
    fn verify(&self, token: &str, now: DateTime<Utc>) -> AppResult<UserIdentity>;
}
