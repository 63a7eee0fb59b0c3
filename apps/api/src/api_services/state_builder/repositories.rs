use std::sync::Arc;

use rosterhub_application::{
    AttemptGuardRepository, RateLimitRepository, ResetTokenRepository, TenantRegistry,
    UserRepository,
};
use rosterhub_infrastructure::{
    InMemoryStore, PostgresAttemptGuardRepository, PostgresRateLimitRepository,
    PostgresResetTokenRepository, PostgresTenantRegistry, PostgresUserRepository,
};
use sqlx::PgPool;

/// Every store port the API needs, backed by one implementation family.
#[derive(Clone)]
pub struct StoreSet {
    pub tenant_registry: Arc<dyn TenantRegistry>,
    pub guard_repository: Arc<dyn AttemptGuardRepository>,
    pub rate_limit_repository: Arc<dyn RateLimitRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub reset_token_repository: Arc<dyn ResetTokenRepository>,
}

impl StoreSet {
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            tenant_registry: Arc::new(PostgresTenantRegistry::new(pool.clone())),
            guard_repository: Arc::new(PostgresAttemptGuardRepository::new(pool.clone())),
            rate_limit_repository: Arc::new(PostgresRateLimitRepository::new(pool.clone())),
            user_repository: Arc::new(PostgresUserRepository::new(pool.clone())),
            reset_token_repository: Arc::new(PostgresResetTokenRepository::new(pool.clone())),
        }
    }

    /// Process-local store. State is lost on restart and not shared between
    /// instances, so it is only accepted outside production.
    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            tenant_registry: store.clone(),
            guard_repository: store.clone(),
            rate_limit_repository: store.clone(),
            user_repository: store.clone(),
            reset_token_repository: store,
        }
    }

    pub fn with_rate_limit_repository(self, repository: Arc<dyn RateLimitRepository>) -> Self {
        Self {
            rate_limit_repository: repository,
            ..self
        }
    }
}
