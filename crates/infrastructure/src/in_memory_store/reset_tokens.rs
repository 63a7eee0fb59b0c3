use async_trait::async_trait;
use chrono::{DateTime, Utc};

use rosterhub_application::{ResetTokenRecord, ResetTokenRepository};
use rosterhub_core::{AppError, AppResult, TenantId};
use rosterhub_domain::UserId;

use super::{InMemoryStore, count};

#[async_trait]
impl ResetTokenRepository for InMemoryStore {
    async fn insert(&self, token: &ResetTokenRecord) -> AppResult<()> {
        let mut tokens = self.reset_tokens.write().await;
        if tokens.contains_key(&token.token_hash) {
            return Err(AppError::Conflict("reset token already exists".to_owned()));
        }

        tokens.insert(token.token_hash.clone(), token.clone());
        Ok(())
    }

    async fn invalidate_for_user(
        &self,
        tenant_id: &TenantId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        self.reset_tokens
            .write()
            .await
            .values_mut()
            .filter(|token| {
                &token.tenant_id == tenant_id && token.user_id == user_id && token.used_at.is_none()
            })
            .for_each(|token| token.used_at = Some(now));

        Ok(())
    }

    async fn consume(
        &self,
        tenant_id: &TenantId,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<ResetTokenRecord>> {
        let mut tokens = self.reset_tokens.write().await;
        let Some(token) = tokens.get_mut(token_hash).filter(|token| {
            &token.tenant_id == tenant_id && token.used_at.is_none() && token.expires_at > now
        }) else {
            return Ok(None);
        };

        token.used_at = Some(now);
        Ok(Some(token.clone()))
    }

    async fn delete_expired(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let mut tokens = self.reset_tokens.write().await;
        let existing = tokens.len();
        tokens.retain(|_, token| token.expires_at >= before);
        Ok(count(existing - tokens.len()))
    }
}
