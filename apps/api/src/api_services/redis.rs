use std::sync::Arc;

use rosterhub_application::RateLimitRepository;
use rosterhub_core::AppResult;
use rosterhub_infrastructure::RedisRateLimitRepository;

const RATE_LIMIT_KEY_PREFIX: &str = "rosterhub:rate_limit";

pub async fn build_redis_rate_limit_repository(
    redis_url: &str,
) -> AppResult<Arc<dyn RateLimitRepository>> {
    let repository = RedisRateLimitRepository::connect(redis_url, RATE_LIMIT_KEY_PREFIX).await?;
    Ok(Arc::new(repository))
}
