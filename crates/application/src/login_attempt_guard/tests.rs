use std::sync::Arc;

use chrono::TimeDelta;
use rosterhub_core::TenantId;
use rosterhub_domain::{GuardKey, GuardPurpose};

use crate::test_support::{InMemoryGuards, clock_at_start};
use crate::{LoginAttemptGuard, ManualClock, StoreTimeout};

fn tenant(value: &str) -> TenantId {
    TenantId::parse(value).unwrap_or_else(|error| panic!("tenant: {error}"))
}

fn guard(store: Arc<InMemoryGuards>, clock: Arc<ManualClock>) -> LoginAttemptGuard {
    LoginAttemptGuard::new(store, clock, StoreTimeout::default())
}

async fn fail(guard: &LoginAttemptGuard, tenant_id: &TenantId, identity: &str, times: u32) {
    for _ in 0..times {
        let recorded = guard.record_failed_login(tenant_id, identity).await;
        assert!(recorded.is_ok());
    }
}

#[tokio::test]
async fn successful_login_clears_any_failure_count() {
    let store = Arc::new(InMemoryGuards::default());
    let guard = guard(store.clone(), clock_at_start());
    let fckoln = tenant("fckoln");

    for failures in 0..5 {
        fail(&guard, &fckoln, "user@example.com", failures).await;
        let cleared = guard.clear_login_attempts(&fckoln, "user@example.com").await;
        assert!(cleared.is_ok());

        let status = guard
            .check_login_attempts(&fckoln, "user@example.com")
            .await
            .unwrap_or_else(|error| panic!("check failed: {error}"));
        assert!(status.allowed);
        assert_eq!(status.remaining_attempts, 5);
    }

    assert_eq!(store.len().await, 0);
}

#[tokio::test]
async fn five_failures_lock_the_sixth_attempt() {
    let guard = guard(Arc::new(InMemoryGuards::default()), clock_at_start());
    let fckoln = tenant("fckoln");

    fail(&guard, &fckoln, "user@example.com", 4).await;
    let fifth = guard
        .record_failed_login(&fckoln, "user@example.com")
        .await
        .unwrap_or_else(|error| panic!("record failed: {error}"));
    assert!(!fifth.allowed);

    let sixth = guard
        .check_login_attempts(&fckoln, "user@example.com")
        .await
        .unwrap_or_else(|error| panic!("check failed: {error}"));
    assert!(!sixth.allowed);
    assert_eq!(sixth.remaining_attempts, 0);
    assert_eq!(sixth.locked_for_seconds, 15 * 60);
}

#[tokio::test]
async fn identity_casing_shares_one_counter() {
    let guard = guard(Arc::new(InMemoryGuards::default()), clock_at_start());
    let fckoln = tenant("fckoln");

    fail(&guard, &fckoln, "A@B.com", 1).await;

    let status = guard
        .check_login_attempts(&fckoln, "a@b.com")
        .await
        .unwrap_or_else(|error| panic!("check failed: {error}"));
    assert_eq!(status.remaining_attempts, 4);
}

#[tokio::test]
async fn failures_never_cross_tenants() {
    let guard = guard(Arc::new(InMemoryGuards::default()), clock_at_start());

    fail(&guard, &tenant("tenant-a"), "user@example.com", 5).await;

    let other = guard
        .check_login_attempts(&tenant("tenant-b"), "user@example.com")
        .await
        .unwrap_or_else(|error| panic!("check failed: {error}"));
    assert!(other.allowed);
    assert_eq!(other.remaining_attempts, 5);
}

#[tokio::test]
async fn expired_lock_reads_as_clear_and_is_deleted() {
    let store = Arc::new(InMemoryGuards::default());
    let clock = clock_at_start();
    let guard = guard(store.clone(), clock.clone());
    let fckoln = tenant("fckoln");

    fail(&guard, &fckoln, "user@example.com", 5).await;
    clock.advance(TimeDelta::minutes(16));

    let status = guard
        .check_login_attempts(&fckoln, "user@example.com")
        .await
        .unwrap_or_else(|error| panic!("check failed: {error}"));
    assert!(status.allowed);
    assert_eq!(status.remaining_attempts, 5);

    let key = GuardKey::new(&fckoln, "user@example.com")
        .unwrap_or_else(|error| panic!("key: {error}"));
    assert_eq!(store.get(&key, GuardPurpose::Login).await, None);
}

#[tokio::test]
async fn failures_while_locked_do_not_extend_the_lock() {
    let clock = clock_at_start();
    let guard = guard(Arc::new(InMemoryGuards::default()), clock.clone());
    let fckoln = tenant("fckoln");

    fail(&guard, &fckoln, "user@example.com", 5).await;
    clock.advance(TimeDelta::minutes(10));
    fail(&guard, &fckoln, "user@example.com", 3).await;

    let status = guard
        .check_login_attempts(&fckoln, "user@example.com")
        .await
        .unwrap_or_else(|error| panic!("check failed: {error}"));
    assert_eq!(status.locked_for_seconds, 5 * 60);
}

#[tokio::test]
async fn store_outage_on_check_assumes_full_budget() {
    let store = Arc::new(InMemoryGuards::default());
    store.set_failing(true);
    let guard = guard(store, clock_at_start());

    let status = guard
        .check_login_attempts(&tenant("fckoln"), "user@example.com")
        .await
        .unwrap_or_else(|error| panic!("check failed: {error}"));
    assert!(status.allowed);
    assert_eq!(status.remaining_attempts, 5);

    let recorded = guard
        .record_failed_login(&tenant("fckoln"), "user@example.com")
        .await;
    assert!(recorded.is_err());
}

#[tokio::test]
async fn blank_identity_is_rejected() {
    let guard = guard(Arc::new(InMemoryGuards::default()), clock_at_start());
    assert!(guard.check_login_attempts(&tenant("fckoln"), "  ").await.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_failures_lock_exactly_once() {
    let store = Arc::new(InMemoryGuards::default());
    let guard = guard(store.clone(), clock_at_start());
    let fckoln = tenant("fckoln");

    let tasks = (0..20)
        .map(|_| {
            let guard = guard.clone();
            let fckoln = fckoln.clone();
            tokio::spawn(async move { guard.record_failed_login(&fckoln, "user@example.com").await })
        })
        .collect::<Vec<_>>();

    for task in tasks {
        let joined = task.await;
        assert!(matches!(joined, Ok(Ok(_))));
    }

    let key = GuardKey::new(&fckoln, "user@example.com")
        .unwrap_or_else(|error| panic!("key: {error}"));
    let record = store.get(&key, GuardPurpose::Login).await;
    assert_eq!(record.as_ref().map(|record| record.attempts), Some(5));
    assert!(record.and_then(|record| record.locked_until).is_some());
}
