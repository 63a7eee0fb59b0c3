use async_trait::async_trait;

use rosterhub_application::{UserRecord, UserRepository};
use rosterhub_core::{AppError, AppResult, TenantId};
use rosterhub_domain::UserId;

use super::InMemoryStore;

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_email(
        &self,
        tenant_id: &TenantId,
        email: &str,
    ) -> AppResult<Option<UserRecord>> {
        Ok(self
            .users
            .read()
            .await
            .get(&(tenant_id.clone(), email.to_lowercase()))
            .cloned())
    }

    async fn find_by_id(
        &self,
        tenant_id: &TenantId,
        user_id: UserId,
    ) -> AppResult<Option<UserRecord>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| &user.tenant_id == tenant_id && user.id == user_id)
            .cloned())
    }

    async fn create(&self, user: &UserRecord) -> AppResult<()> {
        let mut users = self.users.write().await;
        let key = (user.tenant_id.clone(), user.email.to_lowercase());

        if users.contains_key(&key) {
            return Err(AppError::Conflict(
                "a user with this email already exists".to_owned(),
            ));
        }

        users.insert(key, user.clone());
        Ok(())
    }

    async fn update_password(
        &self,
        tenant_id: &TenantId,
        user_id: UserId,
        password_hash: &str,
    ) -> AppResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .values_mut()
            .find(|user| &user.tenant_id == tenant_id && user.id == user_id)
            .ok_or_else(|| AppError::NotFound("user not found".to_owned()))?;

        password_hash.clone_into(&mut user.password_hash);
        Ok(())
    }
}
