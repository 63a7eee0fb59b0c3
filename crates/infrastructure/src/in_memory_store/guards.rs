use async_trait::async_trait;
use chrono::{DateTime, Utc};

use rosterhub_application::AttemptGuardRepository;
use rosterhub_core::AppResult;
use rosterhub_domain::{
    GuardKey, GuardPurpose, GuardRecord, LoginAttemptPolicy, ResetThrottlePolicy,
};

use super::{InMemoryStore, count, guard_expired};

#[async_trait]
impl AttemptGuardRepository for InMemoryStore {
    async fn find_record(
        &self,
        key: &GuardKey,
        purpose: GuardPurpose,
    ) -> AppResult<Option<GuardRecord>> {
        Ok(self.guard_record(key, purpose).await)
    }

    async fn record_login_failure(
        &self,
        key: &GuardKey,
        policy: &LoginAttemptPolicy,
        now: DateTime<Utc>,
    ) -> AppResult<GuardRecord> {
        let mut guards = self.guards.write().await;
        let slot = (key.clone(), GuardPurpose::Login);
        let next = policy.apply_failure(guards.get(&slot), now);
        guards.insert(slot, next.clone());
        Ok(next)
    }

    async fn record_reset_request(
        &self,
        key: &GuardKey,
        policy: &ResetThrottlePolicy,
        now: DateTime<Utc>,
    ) -> AppResult<GuardRecord> {
        let mut guards = self.guards.write().await;
        let slot = (key.clone(), GuardPurpose::Reset);
        let next = policy.apply_request(guards.get(&slot), now);
        guards.insert(slot, next.clone());
        Ok(next)
    }

    async fn clear(&self, key: &GuardKey, purpose: GuardPurpose) -> AppResult<bool> {
        Ok(self
            .guards
            .write()
            .await
            .remove(&(key.clone(), purpose))
            .is_some())
    }

    async fn delete_if_expired(
        &self,
        key: &GuardKey,
        purpose: GuardPurpose,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut guards = self.guards.write().await;
        let slot = (key.clone(), purpose);

        if guards
            .get(&slot)
            .is_some_and(|record| guard_expired(record, now))
        {
            guards.remove(&slot);
            return Ok(true);
        }

        Ok(false)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut guards = self.guards.write().await;
        let before = guards.len();
        guards.retain(|_, record| !record.is_purgeable(now));
        Ok(count(before - guards.len()))
    }
}
