//! Failed-login lockout per `(tenant, identity)`.
//!
//! Reads degrade to "full budget" when the store is unavailable. Writes
//! surface store errors so the caller can decide whether the failure was
//! about to establish a lock.

use std::sync::Arc;

use rosterhub_core::{AppResult, TenantId};
use rosterhub_domain::{
    GuardKey, GuardPurpose, LoginAttemptPolicy, LoginAttemptState, LoginAttemptStatus,
};

use crate::{AttemptGuardRepository, Clock, StoreTimeout};

/// Login attempt guard service.
#[derive(Clone)]
pub struct LoginAttemptGuard {
    repository: Arc<dyn AttemptGuardRepository>,
    clock: Arc<dyn Clock>,
    timeout: StoreTimeout,
    policy: LoginAttemptPolicy,
}

impl LoginAttemptGuard {
    /// Creates a guard with the default five-attempt, fifteen-minute policy.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AttemptGuardRepository>,
        clock: Arc<dyn Clock>,
        timeout: StoreTimeout,
    ) -> Self {
        Self {
            repository,
            clock,
            timeout,
            policy: LoginAttemptPolicy::default(),
        }
    }

    /// Returns the active policy.
    #[must_use]
    pub fn policy(&self) -> &LoginAttemptPolicy {
        &self.policy
    }

    /// Reports whether the identity may attempt a password comparison.
    ///
    /// An expired lock is deleted on sight and reported as a full budget.
    pub async fn check_login_attempts(
        &self,
        tenant_id: &TenantId,
        identity: &str,
    ) -> AppResult<LoginAttemptStatus> {
        let key = GuardKey::new(tenant_id, identity)?;
        let now = self.clock.now();

        let record = match self
            .timeout
            .run(
                "login guard read",
                self.repository.find_record(&key, GuardPurpose::Login),
            )
            .await
        {
            Ok(record) => record,
            Err(error) if error.is_infrastructure() => {
                tracing::warn!(
                    tenant_id = key.tenant_part(),
                    error = %error,
                    "login guard unavailable, assuming full budget"
                );
                return Ok(self.policy.full_budget());
            }
            Err(error) => return Err(error),
        };

        let state = self.policy.evaluate(record.as_ref(), now);
        if state == LoginAttemptState::Expired {
            self.expire(&key, now).await;
        }

        Ok(self.policy.status(state, now))
    }

    /// Counts one failed login and returns the resulting status.
    ///
    /// The count and any new lock are written in one atomic store operation.
    pub async fn record_failed_login(
        &self,
        tenant_id: &TenantId,
        identity: &str,
    ) -> AppResult<LoginAttemptStatus> {
        let key = GuardKey::new(tenant_id, identity)?;
        let now = self.clock.now();

        let record = self
            .timeout
            .run(
                "login guard write",
                self.repository.record_login_failure(&key, &self.policy, now),
            )
            .await?;

        let status = self
            .policy
            .status(self.policy.evaluate(Some(&record), now), now);

        if status.allowed {
            tracing::info!(
                tenant_id = key.tenant_part(),
                attempts = record.attempts,
                remaining_attempts = status.remaining_attempts,
                "failed login recorded"
            );
        } else {
            tracing::warn!(
                tenant_id = key.tenant_part(),
                attempts = record.attempts,
                locked_for_seconds = status.locked_for_seconds,
                "login locked after repeated failures"
            );
        }

        Ok(status)
    }

    /// Forgets all failures for the identity. Called after a successful login.
    pub async fn clear_login_attempts(&self, tenant_id: &TenantId, identity: &str) -> AppResult<()> {
        let key = GuardKey::new(tenant_id, identity)?;
        self.timeout
            .run(
                "login guard clear",
                self.repository.clear(&key, GuardPurpose::Login),
            )
            .await?;
        Ok(())
    }

    async fn expire(&self, key: &GuardKey, now: chrono::DateTime<chrono::Utc>) {
        let result = self
            .timeout
            .run(
                "login guard expiry",
                self.repository
                    .delete_if_expired(key, GuardPurpose::Login, now),
            )
            .await;

        if let Err(error) = result {
            tracing::warn!(
                tenant_id = key.tenant_part(),
                error = %error,
                "failed to delete expired login lock"
            );
        }
    }
}

#[cfg(test)]
mod tests;
