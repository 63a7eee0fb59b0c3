mod database;
mod redis;
mod state_builder;

pub use database::connect_and_migrate;
pub use redis::build_redis_rate_limit_repository;
pub use state_builder::{StoreSet, assemble_app_state};
