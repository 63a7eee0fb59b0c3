use async_trait::async_trait;
use chrono::{DateTime, Utc};

use rosterhub_core::AppResult;
use rosterhub_domain::{
    GuardKey, GuardPurpose, GuardRecord, LoginAttemptPolicy, ResetThrottlePolicy,
};

/// Shared store for identity-level guard counters.
///
/// Every mutation touches exactly one `(key, purpose)` row. Implementations
/// must make `record_*` atomic: the new attempt count and any lock or window
/// are computed and written in the same operation, so concurrent failures for
/// one identity can never both read a stale count.
#[async_trait]
pub trait AttemptGuardRepository: Send + Sync {
    /// Reads the record for a key, if any.
    async fn find_record(
        &self,
        key: &GuardKey,
        purpose: GuardPurpose,
    ) -> AppResult<Option<GuardRecord>>;

    /// Counts one failed login following [`LoginAttemptPolicy::apply_failure`].
    async fn record_login_failure(
        &self,
        key: &GuardKey,
        policy: &LoginAttemptPolicy,
        now: DateTime<Utc>,
    ) -> AppResult<GuardRecord>;

    /// Counts one reset request following [`ResetThrottlePolicy::apply_request`].
    async fn record_reset_request(
        &self,
        key: &GuardKey,
        policy: &ResetThrottlePolicy,
        now: DateTime<Utc>,
    ) -> AppResult<GuardRecord>;

    /// Deletes the record unconditionally. Returns whether a row existed.
    async fn clear(&self, key: &GuardKey, purpose: GuardPurpose) -> AppResult<bool>;

    /// Deletes the record only if its lock or window has passed at `now`.
    async fn delete_if_expired(
        &self,
        key: &GuardKey,
        purpose: GuardPurpose,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Deletes every record [`GuardRecord::is_purgeable`] at `now`. Returns the count.
    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}
