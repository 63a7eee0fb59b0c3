use rosterhub_core::NonEmptyString;
use rosterhub_domain::{EmailAddress, validate_password_for};

use super::*;

impl UserService {
    /// Creates a user inside a tenant.
    pub async fn create_user(&self, tenant_id: &TenantId, input: NewUser) -> AppResult<UserRecord> {
        let email = EmailAddress::new(input.email)?;
        let display_name = NonEmptyString::new(input.display_name.trim())?;
        validate_password_for(&email, &input.password)?;

        let user = UserRecord {
            id: UserId::new(),
            tenant_id: tenant_id.clone(),
            email: email.into(),
            display_name: display_name.into(),
            password_hash: self.password_hasher.hash_password(&input.password)?,
        };

        self.user_repository.create(&user).await?;
        tracing::info!(tenant_id = %tenant_id, user_id = %user.id, "user created");

        Ok(user)
    }
}
