use serde::{Deserialize, Serialize};

use crate::TenantId;

/// Signed-in account as carried inside a session token.
///
/// A session is only ever valid for the tenant that issued it; use
/// [`UserIdentity::belongs_to`] before trusting it on a tenant-scoped route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    subject: String,
    display_name: String,
    email: Option<String>,
    tenant_id: TenantId,
}

impl UserIdentity {
    /// Creates an identity for a user of `tenant_id`.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        display_name: impl Into<String>,
        email: Option<String>,
        tenant_id: TenantId,
    ) -> Self {
        Self {
            subject: subject.into(),
            display_name: display_name.into(),
            email,
            tenant_id,
        }
    }

    /// User id as a string; the JWT `sub` claim.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Name shown in the app header.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Login email, absent for accounts created without one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Tenant that issued the session.
    #[must_use]
    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    /// Returns whether the session was issued for `tenant_id`.
    #[must_use]
    pub fn belongs_to(&self, tenant_id: &TenantId) -> bool {
        &self.tenant_id == tenant_id
    }
}
