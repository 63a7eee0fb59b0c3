use std::sync::Arc;

use chrono::{TimeDelta, TimeZone, Utc};
use rosterhub_application::{
    AttemptGuardRepository, LoginAttemptGuard, ManualClock, RateLimitRepository,
    ResetTokenRecord, ResetTokenRepository, StoreTimeout, TenantRecord, TenantRegistry,
    UserRecord, UserRepository,
};
use rosterhub_core::{AppError, TenantId};
use rosterhub_domain::{
    AllowedOrigins, GuardKey, GuardPurpose, LoginAttemptPolicy, ResetThrottlePolicy, UserId,
};

use super::InMemoryStore;

fn tenant_id(value: &str) -> TenantId {
    TenantId::parse(value).unwrap_or_else(|error| panic!("tenant: {error}"))
}

fn start() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 18, 30, 0)
        .single()
        .unwrap_or_else(|| panic!("valid timestamp"))
}

fn key(tenant: &str, identity: &str) -> GuardKey {
    GuardKey::new(&tenant_id(tenant), identity).unwrap_or_else(|error| panic!("key: {error}"))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_failures_count_at_most_five_and_lock() {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(ManualClock::new(start()));
    let guard = LoginAttemptGuard::new(store.clone(), clock, StoreTimeout::default());
    let fckoln = tenant_id("fckoln");

    let tasks = (0..32)
        .map(|_| {
            let guard = guard.clone();
            let fckoln = fckoln.clone();
            tokio::spawn(async move { guard.record_failed_login(&fckoln, "user@example.com").await })
        })
        .collect::<Vec<_>>();

    for task in tasks {
        assert!(matches!(task.await, Ok(Ok(_))));
    }

    let record = store
        .guard_record(&key("fckoln", "user@example.com"), GuardPurpose::Login)
        .await;
    assert_eq!(record.as_ref().map(|record| record.attempts), Some(5));
    assert_eq!(
        record.and_then(|record| record.locked_until),
        Some(start() + TimeDelta::minutes(15))
    );
}

#[tokio::test]
async fn conditional_expiry_keeps_live_records() {
    let store = InMemoryStore::new();
    let policy = LoginAttemptPolicy::default();
    let login_key = key("fckoln", "user@example.com");

    for _ in 0..5 {
        assert!(store.record_login_failure(&login_key, &policy, start()).await.is_ok());
    }

    let early = store
        .delete_if_expired(&login_key, GuardPurpose::Login, start() + TimeDelta::minutes(5))
        .await;
    assert_eq!(early.ok(), Some(false));

    let late = store
        .delete_if_expired(&login_key, GuardPurpose::Login, start() + TimeDelta::minutes(15))
        .await;
    assert_eq!(late.ok(), Some(true));
}

#[tokio::test]
async fn purge_removes_only_finished_locks_and_windows() {
    let store = InMemoryStore::new();
    let login = LoginAttemptPolicy::default();
    let reset = ResetThrottlePolicy::default();

    for _ in 0..5 {
        let _ = store
            .record_login_failure(&key("fckoln", "locked@example.com"), &login, start())
            .await;
    }
    let _ = store
        .record_login_failure(&key("fckoln", "warned@example.com"), &login, start())
        .await;
    let _ = store
        .record_reset_request(&key("fckoln", "reset@example.com"), &reset, start())
        .await;

    let purged = AttemptGuardRepository::delete_expired(&store, start() + TimeDelta::minutes(30)).await;
    assert_eq!(purged.ok(), Some(1));

    let purged = AttemptGuardRepository::delete_expired(&store, start() + TimeDelta::minutes(61)).await;
    assert_eq!(purged.ok(), Some(1));

    assert!(store
        .guard_record(&key("fckoln", "warned@example.com"), GuardPurpose::Login)
        .await
        .is_some());

    let purged = AttemptGuardRepository::delete_expired(&store, start() + TimeDelta::hours(24)).await;
    assert_eq!(purged.ok(), Some(1));
    assert!(store
        .guard_record(&key("fckoln", "warned@example.com"), GuardPurpose::Login)
        .await
        .is_none());
}

#[tokio::test]
async fn request_window_restarts_after_its_length() {
    let store = InMemoryStore::new();

    for expected in 1..=3 {
        let info = store.record_attempt("request:fckoln", 60, start()).await;
        assert_eq!(info.map(|info| info.attempt_count).ok(), Some(expected));
    }

    let next = store
        .record_attempt("request:fckoln", 60, start() + TimeDelta::seconds(60))
        .await
        .unwrap_or_else(|error| panic!("record failed: {error}"));
    assert_eq!(next.attempt_count, 1);
    assert_eq!(next.window_started_at, start() + TimeDelta::seconds(60));
}

#[tokio::test]
async fn tenant_registry_enforces_unique_ids() {
    let store = InMemoryStore::new();
    let tenant = TenantRecord {
        id: tenant_id("fckoln"),
        name: "FC Köln".to_owned(),
        api_key_hash: "hash".to_owned(),
        allowed_origins: AllowedOrigins::default(),
        requests_per_minute: 60,
        is_active: true,
        created_at: start(),
    };

    assert!(TenantRegistry::create(&store, &tenant).await.is_ok());
    assert!(matches!(
        TenantRegistry::create(&store, &tenant).await,
        Err(AppError::Conflict(_))
    ));
    assert!(store.update_api_key_hash(&tenant.id, "rotated").await.is_ok());
    assert!(store.find_by_api_key_hash("hash").await.is_ok_and(|found| found.is_none()));
    assert!(matches!(
        store.set_active(&tenant_id("missing"), false).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn users_are_scoped_per_tenant_and_tokens_are_single_use() {
    let store = InMemoryStore::new();
    let user = UserRecord {
        id: UserId::new(),
        tenant_id: tenant_id("fckoln"),
        email: "user@example.com".to_owned(),
        display_name: "Jonas".to_owned(),
        password_hash: "hash".to_owned(),
    };
    assert!(UserRepository::create(&store, &user).await.is_ok());

    let other_tenant = store
        .find_by_email(&tenant_id("other"), "user@example.com")
        .await;
    assert!(other_tenant.is_ok_and(|found| found.is_none()));

    let token = ResetTokenRecord {
        tenant_id: user.tenant_id.clone(),
        user_id: user.id,
        token_hash: "token-hash".to_owned(),
        expires_at: start() + TimeDelta::hours(1),
        used_at: None,
        created_at: start(),
    };
    assert!(store.insert(&token).await.is_ok());

    let first = store.consume(&user.tenant_id, "token-hash", start()).await;
    let second = store.consume(&user.tenant_id, "token-hash", start()).await;
    assert!(first.is_ok_and(|found| found.is_some()));
    assert!(second.is_ok_and(|found| found.is_none()));
}
