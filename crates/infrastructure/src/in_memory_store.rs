//! Embedded store for tests and single-process local development.
//!
//! One struct implements every persistence port. Each mutation holds the
//! relevant write lock for its whole read-modify-write, which gives the same
//! per-row atomicity the PostgreSQL upserts provide.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use rosterhub_application::{AttemptInfo, ResetTokenRecord, TenantRecord, UserRecord};
use rosterhub_core::TenantId;
use rosterhub_domain::{GuardKey, GuardPurpose, GuardRecord};

mod guards;
mod rate_limits;
mod reset_tokens;
mod tenants;
mod users;

/// In-memory implementation of all RosterHub persistence ports.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tenants: RwLock<HashMap<TenantId, TenantRecord>>,
    guards: RwLock<HashMap<(GuardKey, GuardPurpose), GuardRecord>>,
    request_windows: RwLock<HashMap<String, AttemptInfo>>,
    users: RwLock<HashMap<(TenantId, String), UserRecord>>,
    reset_tokens: RwLock<HashMap<String, ResetTokenRecord>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored guard record, if any. Test and diagnostics helper.
    pub async fn guard_record(&self, key: &GuardKey, purpose: GuardPurpose) -> Option<GuardRecord> {
        self.guards
            .read()
            .await
            .get(&(key.clone(), purpose))
            .cloned()
    }
}

fn guard_expired(record: &GuardRecord, now: DateTime<Utc>) -> bool {
    record
        .locked_until
        .or(record.window_end)
        .is_some_and(|until| until <= now)
}

fn count(removed: usize) -> u64 {
    u64::try_from(removed).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests;
