//! Hand-written fakes shared by the service tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use tokio::sync::Mutex;

use rosterhub_core::{AppError, AppResult, TenantId, UserIdentity};
use rosterhub_domain::{
    AllowedOrigins, GuardKey, GuardPurpose, GuardRecord, LoginAttemptPolicy, ResetThrottlePolicy,
    TenantContext, UserId,
};

use crate::{
    AttemptGuardRepository, AttemptInfo, EmailService, ManualClock, PasswordHasher,
    RateLimitRepository, ResetTokenRecord, ResetTokenRepository, SessionToken,
    SessionTokenIssuer, TenantRecord, TenantRegistry, UserRecord, UserRepository,
};

pub fn start_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 18, 30, 0)
        .single()
        .unwrap_or_else(|| panic!("valid timestamp"))
}

pub fn clock_at_start() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(start_instant()))
}

pub fn tenant_id(value: &str) -> TenantId {
    TenantId::parse(value).unwrap_or_else(|error| panic!("invalid tenant id: {error}"))
}

pub fn tenant_context(id: &str, origins: &[&str]) -> TenantContext {
    let origins = AllowedOrigins::new(origins).unwrap_or_else(|error| panic!("origins: {error}"));
    TenantContext::new(tenant_id(id), id, origins, 60)
        .unwrap_or_else(|error| panic!("context: {error}"))
}

pub fn tenant_record(id: &str, api_key_hash: &str, is_active: bool) -> TenantRecord {
    TenantRecord {
        id: tenant_id(id),
        name: id.to_owned(),
        api_key_hash: api_key_hash.to_owned(),
        allowed_origins: AllowedOrigins::new(["https://admin.fckoeln.de"])
            .unwrap_or_else(|error| panic!("origins: {error}")),
        requests_per_minute: 60,
        is_active,
        created_at: start_instant(),
    }
}

fn outage() -> AppError {
    AppError::Unavailable("fake store is down".to_owned())
}

#[derive(Default)]
pub struct FakeTenantRegistry {
    tenants: Mutex<HashMap<TenantId, TenantRecord>>,
    failing: AtomicBool,
}

impl FakeTenantRegistry {
    pub async fn insert(&self, tenant: TenantRecord) {
        self.tenants.lock().await.insert(tenant.id.clone(), tenant);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(outage());
        }
        Ok(())
    }
}

#[async_trait]
impl TenantRegistry for FakeTenantRegistry {
    async fn find_by_api_key_hash(&self, api_key_hash: &str) -> AppResult<Option<TenantRecord>> {
        self.check()?;
        Ok(self
            .tenants
            .lock()
            .await
            .values()
            .find(|tenant| tenant.api_key_hash == api_key_hash)
            .cloned())
    }

    async fn find_by_id(&self, tenant_id: &TenantId) -> AppResult<Option<TenantRecord>> {
        self.check()?;
        Ok(self.tenants.lock().await.get(tenant_id).cloned())
    }

    async fn list(&self) -> AppResult<Vec<TenantRecord>> {
        self.check()?;
        let mut tenants = self
            .tenants
            .lock()
            .await
            .values()
            .cloned()
            .collect::<Vec<_>>();
        tenants.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(tenants)
    }

    async fn create(&self, tenant: &TenantRecord) -> AppResult<()> {
        self.check()?;
        let mut tenants = self.tenants.lock().await;
        if tenants.contains_key(&tenant.id) {
            return Err(AppError::Conflict(format!("tenant '{}' exists", tenant.id)));
        }
        tenants.insert(tenant.id.clone(), tenant.clone());
        Ok(())
    }

    async fn update_api_key_hash(&self, tenant_id: &TenantId, api_key_hash: &str) -> AppResult<()> {
        self.check()?;
        let mut tenants = self.tenants.lock().await;
        let tenant = tenants
            .get_mut(tenant_id)
            .ok_or_else(|| AppError::NotFound(format!("tenant '{tenant_id}' not found")))?;
        api_key_hash.clone_into(&mut tenant.api_key_hash);
        Ok(())
    }

    async fn set_active(&self, tenant_id: &TenantId, is_active: bool) -> AppResult<TenantRecord> {
        self.check()?;
        let mut tenants = self.tenants.lock().await;
        let tenant = tenants
            .get_mut(tenant_id)
            .ok_or_else(|| AppError::NotFound(format!("tenant '{tenant_id}' not found")))?;
        tenant.is_active = is_active;
        Ok(tenant.clone())
    }
}

#[derive(Default)]
pub struct InMemoryGuards {
    records: Mutex<HashMap<(GuardKey, GuardPurpose), GuardRecord>>,
    failing: AtomicBool,
    failing_writes: AtomicBool,
}

impl InMemoryGuards {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Lets reads through but fails every counting write.
    pub fn set_failing_writes(&self, failing: bool) {
        self.failing_writes.store(failing, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn get(&self, key: &GuardKey, purpose: GuardPurpose) -> Option<GuardRecord> {
        self.records
            .lock()
            .await
            .get(&(key.clone(), purpose))
            .cloned()
    }

    fn check(&self) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(outage());
        }
        Ok(())
    }

    fn check_write(&self) -> AppResult<()> {
        self.check()?;
        if self.failing_writes.load(Ordering::SeqCst) {
            return Err(outage());
        }
        Ok(())
    }
}

fn is_expired(record: &GuardRecord, now: DateTime<Utc>) -> bool {
    record
        .locked_until
        .or(record.window_end)
        .is_some_and(|until| until <= now)
}

#[async_trait]
impl AttemptGuardRepository for InMemoryGuards {
    async fn find_record(
        &self,
        key: &GuardKey,
        purpose: GuardPurpose,
    ) -> AppResult<Option<GuardRecord>> {
        self.check()?;
        Ok(self.get(key, purpose).await)
    }

    async fn record_login_failure(
        &self,
        key: &GuardKey,
        policy: &LoginAttemptPolicy,
        now: DateTime<Utc>,
    ) -> AppResult<GuardRecord> {
        self.check_write()?;
        let mut records = self.records.lock().await;
        let slot = (key.clone(), GuardPurpose::Login);
        let next = policy.apply_failure(records.get(&slot), now);
        records.insert(slot, next.clone());
        Ok(next)
    }

    async fn record_reset_request(
        &self,
        key: &GuardKey,
        policy: &ResetThrottlePolicy,
        now: DateTime<Utc>,
    ) -> AppResult<GuardRecord> {
        self.check_write()?;
        let mut records = self.records.lock().await;
        let slot = (key.clone(), GuardPurpose::Reset);
        let next = policy.apply_request(records.get(&slot), now);
        records.insert(slot, next.clone());
        Ok(next)
    }

    async fn clear(&self, key: &GuardKey, purpose: GuardPurpose) -> AppResult<bool> {
        self.check()?;
        Ok(self
            .records
            .lock()
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
        self.check()?;
        let mut records = self.records.lock().await;
        let slot = (key.clone(), purpose);
        if records.get(&slot).is_some_and(|record| is_expired(record, now)) {
            records.remove(&slot);
            return Ok(true);
        }
        Ok(false)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        self.check()?;
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, record| !record.is_purgeable(now));
        Ok(u64::try_from(before - records.len()).unwrap_or(u64::MAX))
    }
}

#[derive(Default)]
pub struct FakeRateLimits {
    windows: Mutex<HashMap<String, AttemptInfo>>,
    failing: AtomicBool,
}

impl FakeRateLimits {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl RateLimitRepository for FakeRateLimits {
    async fn record_attempt(
        &self,
        key: &str,
        window_seconds: i64,
        now: DateTime<Utc>,
    ) -> AppResult<AttemptInfo> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(outage());
        }

        let mut windows = self.windows.lock().await;
        let info = windows
            .entry(key.to_owned())
            .and_modify(|info| {
                if info.window_started_at + TimeDelta::seconds(window_seconds) <= now {
                    info.attempt_count = 1;
                    info.window_started_at = now;
                } else {
                    info.attempt_count += 1;
                }
            })
            .or_insert(AttemptInfo {
                attempt_count: 1,
                window_started_at: now,
            });
        Ok(info.clone())
    }

    async fn cleanup_expired(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let mut windows = self.windows.lock().await;
        let count = windows.len();
        windows.retain(|_, info| info.window_started_at >= before);
        Ok(u64::try_from(count - windows.len()).unwrap_or(u64::MAX))
    }
}

#[derive(Default)]
pub struct FakeUsers {
    users: Mutex<Vec<UserRecord>>,
    pub lookups: Mutex<u32>,
}

impl FakeUsers {
    pub async fn password_hash(&self, email: &str) -> Option<String> {
        self.users
            .lock()
            .await
            .iter()
            .find(|user| user.email == email)
            .map(|user| user.password_hash.clone())
    }
}

#[async_trait]
impl UserRepository for FakeUsers {
    async fn find_by_email(
        &self,
        tenant_id: &TenantId,
        email: &str,
    ) -> AppResult<Option<UserRecord>> {
        *self.lookups.lock().await += 1;
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|user| &user.tenant_id == tenant_id && user.email == email)
            .cloned())
    }

    async fn find_by_id(
        &self,
        tenant_id: &TenantId,
        user_id: UserId,
    ) -> AppResult<Option<UserRecord>> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|user| &user.tenant_id == tenant_id && user.id == user_id)
            .cloned())
    }

    async fn create(&self, user: &UserRecord) -> AppResult<()> {
        let mut users = self.users.lock().await;
        if users
            .iter()
            .any(|existing| existing.tenant_id == user.tenant_id && existing.email == user.email)
        {
            return Err(AppError::Conflict("email already registered".to_owned()));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn update_password(
        &self,
        tenant_id: &TenantId,
        user_id: UserId,
        password_hash: &str,
    ) -> AppResult<()> {
        let mut users = self.users.lock().await;
        let user = users
            .iter_mut()
            .find(|user| &user.tenant_id == tenant_id && user.id == user_id)
            .ok_or_else(|| AppError::NotFound("user not found".to_owned()))?;
        password_hash.clone_into(&mut user.password_hash);
        Ok(())
    }
}

/// Reversible "hash" so tests can assert on stored passwords.
pub struct FakeHasher;

impl PasswordHasher for FakeHasher {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        Ok(format!("hashed:{password}"))
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        Ok(hash == format!("hashed:{password}"))
    }
}

#[derive(Default)]
pub struct FakeResetTokens {
    tokens: Mutex<Vec<ResetTokenRecord>>,
    failing_writes: AtomicBool,
}

impl FakeResetTokens {
    pub async fn all(&self) -> Vec<ResetTokenRecord> {
        self.tokens.lock().await.clone()
    }

    pub fn set_failing_writes(&self, failing: bool) {
        self.failing_writes.store(failing, Ordering::SeqCst);
    }

    fn check_write(&self) -> AppResult<()> {
        if self.failing_writes.load(Ordering::SeqCst) {
            return Err(outage());
        }
        Ok(())
    }
}

#[async_trait]
impl ResetTokenRepository for FakeResetTokens {
    async fn insert(&self, token: &ResetTokenRecord) -> AppResult<()> {
        self.check_write()?;
        self.tokens.lock().await.push(token.clone());
        Ok(())
    }

    async fn invalidate_for_user(
        &self,
        tenant_id: &TenantId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        self.check_write()?;
        for token in self.tokens.lock().await.iter_mut() {
            if &token.tenant_id == tenant_id && token.user_id == user_id && token.used_at.is_none() {
                token.used_at = Some(now);
            }
        }
        Ok(())
    }

    async fn consume(
        &self,
        tenant_id: &TenantId,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<ResetTokenRecord>> {
        let mut tokens = self.tokens.lock().await;
        let Some(token) = tokens.iter_mut().find(|token| {
            &token.tenant_id == tenant_id
                && token.token_hash == token_hash
                && token.used_at.is_none()
                && token.expires_at > now
        }) else {
            return Ok(None);
        };
        token.used_at = Some(now);
        Ok(Some(token.clone()))
    }

    async fn delete_expired(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let mut tokens = self.tokens.lock().await;
        let count = tokens.len();
        tokens.retain(|token| token.expires_at >= before);
        Ok(u64::try_from(count - tokens.len()).unwrap_or(u64::MAX))
    }
}

#[derive(Default)]
pub struct RecordingEmail {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingEmail {
    /// Raw token from the most recent reset link.
    pub async fn last_token(&self) -> Option<String> {
        self.sent
            .lock()
            .await
            .last()
            .and_then(|(_, url)| url.split_once("token=").map(|(_, token)| token.to_owned()))
    }
}

#[async_trait]
impl EmailService for RecordingEmail {
    async fn send_password_reset(
        &self,
        _tenant: &TenantContext,
        to: &str,
        reset_url: &str,
    ) -> AppResult<()> {
        self.sent
            .lock()
            .await
            .push((to.to_owned(), reset_url.to_owned()));
        Ok(())
    }
}

/// Token issuer that encodes the identity in plain text.
pub struct FakeSessionTokens;

impl SessionTokenIssuer for FakeSessionTokens {
    fn issue(&self, identity: &UserIdentity, now: DateTime<Utc>) -> AppResult<SessionToken> {
        Ok(SessionToken {
            token: format!(
                "{}|{}|{}|{}",
                identity.tenant_id(),
                identity.subject(),
                identity.email().unwrap_or_default(),
                identity.display_name()
            ),
            expires_at: now + TimeDelta::hours(1),
        })
    }

    fn verify(&self, token: &str, _now: DateTime<Utc>) -> AppResult<UserIdentity> {
        let mut parts = token.splitn(4, '|');
        let (Some(tenant), Some(subject), Some(email), Some(display_name)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AppError::Unauthorized("invalid session".to_owned()));
        };
        let email = (!email.is_empty()).then(|| email.to_owned());
        Ok(UserIdentity::new(
            subject,
            display_name,
            email,
            TenantId::parse(tenant)?,
        ))
    }
}
