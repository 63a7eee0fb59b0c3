use std::sync::Arc;

use chrono::TimeDelta;
use rosterhub_core::{AccessDenial, AppError};

use crate::test_support::{FakeRateLimits, clock_at_start, tenant_context};
use crate::{ManualClock, RateLimitRule, RateLimitService, StoreTimeout};

fn service(store: Arc<FakeRateLimits>, clock: Arc<ManualClock>) -> RateLimitService {
    RateLimitService::new(store, clock, StoreTimeout::default())
}

#[tokio::test]
async fn requests_over_tenant_budget_are_rejected_with_retry_hint() {
    let clock = clock_at_start();
    let service = service(Arc::new(FakeRateLimits::default()), clock.clone());
    let tenant = tenant_context("fckoln", &[]);

    for _ in 0..tenant.requests_per_minute() {
        assert!(service.check_tenant_request(&tenant).await.is_ok());
    }

    clock.advance(TimeDelta::seconds(20));
    let result = service.check_tenant_request(&tenant).await;
    assert!(matches!(
        result,
        Err(AppError::Denied(AccessDenial::RateExceeded {
            retry_after_seconds: 40
        }))
    ));

    clock.advance(TimeDelta::seconds(40));
    assert!(service.check_tenant_request(&tenant).await.is_ok());
}

#[tokio::test]
async fn tenants_have_separate_windows() {
    let service = service(Arc::new(FakeRateLimits::default()), clock_at_start());
    let busy = tenant_context("busy", &[]);
    let quiet = tenant_context("quiet", &[]);

    for _ in 0..=busy.requests_per_minute() {
        let _ = service.check_tenant_request(&busy).await;
    }

    assert!(service.check_tenant_request(&busy).await.is_err());
    assert!(service.check_tenant_request(&quiet).await.is_ok());
}

#[tokio::test]
async fn store_outage_fails_open() {
    let store = Arc::new(FakeRateLimits::default());
    store.set_failing(true);
    let service = service(store, clock_at_start());

    assert!(service
        .check_tenant_request(&tenant_context("fckoln", &[]))
        .await
        .is_ok());
}

#[tokio::test]
async fn decision_reports_remaining_budget() {
    let service = service(Arc::new(FakeRateLimits::default()), clock_at_start());
    let rule = RateLimitRule::new("request", 3, 60);

    let first = service
        .check_rate_limit(&rule, "fckoln")
        .await
        .unwrap_or_else(|error| panic!("check failed: {error}"));

    assert_eq!(first.limit, 3);
    assert_eq!(first.remaining, 2);
    assert_eq!(first.reset_after_seconds, 60);
}

#[tokio::test]
async fn cleanup_drops_windows_older_than_a_day() {
    let store = Arc::new(FakeRateLimits::default());
    let clock = clock_at_start();
    let service = service(store, clock.clone());

    assert!(service
        .check_tenant_request(&tenant_context("fckoln", &[]))
        .await
        .is_ok());
    clock.advance(TimeDelta::hours(25));

    assert_eq!(service.cleanup().await.ok(), Some(1));
}
