//! Tenant user accounts.
//!
//! The login email doubles as the guard identity, so it is canonicalized with
//! [`normalize_identity`] and two spellings of one address share a counter.

use rosterhub_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::normalize_identity;

/// Shortest accepted password.
pub const PASSWORD_MIN_LENGTH: usize = 10;

/// Longest accepted password. Bounds the work a single Argon2 call can cost.
pub const PASSWORD_MAX_LENGTH: usize = 128;

const EMAIL_MAX_LENGTH: usize = 254;

/// Account id, unique across tenants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Generates a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps a persisted id.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the raw UUID for binding into queries.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(formatter)
    }
}

/// Canonical login email: trimmed, lower-cased, `local@domain.tld`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Canonicalizes and checks the address shape.
    ///
    /// Deliverability is not checked here; a typo simply never receives mail.
    pub fn new(value: impl AsRef<str>) -> AppResult<Self> {
        let canonical = normalize_identity(value.as_ref());

        if canonical.len() > EMAIL_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "email must not exceed {EMAIL_MAX_LENGTH} characters"
            )));
        }

        let Some((local, domain)) = canonical.split_once('@') else {
            return Err(AppError::Validation(format!(
                "'{canonical}' is not an email address"
            )));
        };

        let domain_ok = domain.contains('.') && domain.split('.').all(|label| !label.is_empty());

        if local.is_empty() || !domain_ok || domain.contains('@') || canonical.contains(' ') {
            return Err(AppError::Validation(format!(
                "'{canonical}' is not an email address"
            )));
        }

        Ok(Self(canonical))
    }

    /// Returns the canonical address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Part before the `@`.
    #[must_use]
    pub fn local_part(&self) -> &str {
        self.0.split_once('@').map_or(self.0.as_str(), |(local, _)| local)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Checks a new password before it is hashed.
///
/// Length is counted in characters, not bytes, so umlauts count once.
pub fn validate_password(password: &str) -> AppResult<()> {
    let length = password.chars().count();

    if length < PASSWORD_MIN_LENGTH {
        return Err(AppError::Validation(format!(
            "password must be at least {PASSWORD_MIN_LENGTH} characters"
        )));
    }

    if length > PASSWORD_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "password must not exceed {PASSWORD_MAX_LENGTH} characters"
        )));
    }

    let lowered = password.to_lowercase();
    if BREACHED_PASSWORDS.contains(&lowered.as_str()) {
        return Err(AppError::Validation(
            "password appears in public breach lists".to_owned(),
        ));
    }

    Ok(())
}

/// Checks a password chosen by a known account.
///
/// On top of [`validate_password`], rejects the mailbox name as password.
pub fn validate_password_for(email: &EmailAddress, password: &str) -> AppResult<()> {
    validate_password(password)?;

    if password.to_lowercase() == email.local_part() {
        return Err(AppError::Validation(
            "password must not match the email address".to_owned(),
        ));
    }

    Ok(())
}

// Only entries of at least PASSWORD_MIN_LENGTH characters can ever match.
static BREACHED_PASSWORDS: &[&str] = &[
    "1234567890",
    "0987654321",
    "1q2w3e4r5t",
    "1qaz2wsx3edc",
    "password12",
    "password123",
    "password1234",
    "passwort123",
    "qwertyuiop",
    "qwertz1234",
    "qwertzuiop",
    "iloveyou123",
    "football123",
    "fussball123",
    "superman123",
    "abcdefghij",
    "aaaaaaaaaa",
    "1111111111",
    "letmein123",
    "welcome123",
    "changeme123",
    "administrator",
];
