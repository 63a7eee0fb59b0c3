//! User accounts and password login.
//!
//! Accounts are scoped to one tenant: the same email may exist in several
//! tenants with unrelated passwords. Login failures never reveal whether the
//! email is known.

use std::sync::Arc;

use async_trait::async_trait;

use rosterhub_core::{AppResult, TenantId, UserIdentity};
use rosterhub_domain::UserId;

use crate::{Clock, LoginAttemptGuard, SessionToken, SessionTokenIssuer};

mod account;
mod login;

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// User record returned by repository queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Unique user identifier.
    pub id: UserId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Canonical email address.
    pub email: String,
    /// Name shown in the roster UI.
    pub display_name: String,
    /// Argon2id password hash.
    pub password_hash: String,
}

impl UserRecord {
    /// Returns the identity carried in session tokens.
    #[must_use]
    pub fn identity(&self) -> UserIdentity {
        UserIdentity::new(
            self.id.to_string(),
            self.display_name.clone(),
            Some(self.email.clone()),
            self.tenant_id.clone(),
        )
    }
}

/// Repository port for tenant-scoped user persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by canonical email within a tenant.
    async fn find_by_email(&self, tenant_id: &TenantId, email: &str)
    -> AppResult<Option<UserRecord>>;

    /// Finds a user by id within a tenant.
    async fn find_by_id(&self, tenant_id: &TenantId, user_id: UserId)
    -> AppResult<Option<UserRecord>>;

    /// Creates a user. Fails with `Conflict` if the email is taken in the tenant.
    async fn create(&self, user: &UserRecord) -> AppResult<()>;

    /// Replaces the password hash of a user.
    async fn update_password(
        &self,
        tenant_id: &TenantId,
        user_id: UserId,
        password_hash: &str,
    ) -> AppResult<()>;
}

/// Port for password hashing operations. Keeps application code free of
/// direct cryptographic library coupling.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool>;
}

// ---------------------------------------------------------------------------
// Request and response types
// ---------------------------------------------------------------------------

/// Input for creating a tenant user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login email.
    pub email: String,
    /// Display name.
    pub display_name: String,
    /// Plaintext password, checked against the password rules.
    pub password: String,
}

/// Successful login.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    /// Who logged in.
    pub identity: UserIdentity,
    /// Bearer token for later requests.
    pub token: SessionToken,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Application service for user login and account creation.
#[derive(Clone)]
pub struct UserService {
    user_repository: Arc<dyn UserRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
    login_guard: LoginAttemptGuard,
    session_tokens: Arc<dyn SessionTokenIssuer>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    /// Creates a new user service.
    #[must_use]
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
        login_guard: LoginAttemptGuard,
        session_tokens: Arc<dyn SessionTokenIssuer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repository,
            password_hasher,
            login_guard,
            session_tokens,
            clock,
        }
    }
}
