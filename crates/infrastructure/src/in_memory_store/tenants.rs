use async_trait::async_trait;

use rosterhub_application::{TenantRecord, TenantRegistry};
use rosterhub_core::{AppError, AppResult, TenantId};

use super::InMemoryStore;

#[async_trait]
impl TenantRegistry for InMemoryStore {
    async fn find_by_api_key_hash(&self, api_key_hash: &str) -> AppResult<Option<TenantRecord>> {
        Ok(self
            .tenants
            .read()
            .await
            .values()
            .find(|tenant| tenant.api_key_hash == api_key_hash)
            .cloned())
    }

    async fn find_by_id(&self, tenant_id: &TenantId) -> AppResult<Option<TenantRecord>> {
        Ok(self.tenants.read().await.get(tenant_id).cloned())
    }

    async fn list(&self) -> AppResult<Vec<TenantRecord>> {
        let mut tenants: Vec<TenantRecord> = self.tenants.read().await.values().cloned().collect();
        tenants.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(tenants)
    }

    async fn create(&self, tenant: &TenantRecord) -> AppResult<()> {
        let mut tenants = self.tenants.write().await;
        if tenants.contains_key(&tenant.id) {
            return Err(AppError::Conflict(format!(
                "tenant '{}' already exists",
                tenant.id
            )));
        }

        tenants.insert(tenant.id.clone(), tenant.clone());
        Ok(())
    }

    async fn update_api_key_hash(
        &self,
        tenant_id: &TenantId,
        api_key_hash: &str,
    ) -> AppResult<()> {
        let mut tenants = self.tenants.write().await;
        let tenant = tenants
            .get_mut(tenant_id)
            .ok_or_else(|| AppError::NotFound(format!("tenant '{tenant_id}' not found")))?;

        api_key_hash.clone_into(&mut tenant.api_key_hash);
        Ok(())
    }

    async fn set_active(&self, tenant_id: &TenantId, is_active: bool) -> AppResult<TenantRecord> {
        let mut tenants = self.tenants.write().await;
        let tenant = tenants
            .get_mut(tenant_id)
            .ok_or_else(|| AppError::NotFound(format!("tenant '{tenant_id}' not found")))?;

        tenant.is_active = is_active;
        Ok(tenant.clone())
    }
}
