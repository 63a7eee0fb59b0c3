//! Optional development account in the fallback tenant.

use rosterhub_application::NewUser;
use rosterhub_core::{AppError, AppResult};
use tracing::{info, warn};

use crate::api_config::ApiConfig;
use crate::state::AppState;

const DEV_SEED_DISPLAY_NAME: &str = "Local Coach";

pub async fn run(app_state: &AppState, config: &ApiConfig) -> AppResult<()> {
    let Some(seed_user) = config.dev_seed_user.as_ref() else {
        return Ok(());
    };

    if config.runtime_mode.is_production() {
        warn!("DEV_SEED_USER_* is ignored in production");
        return Ok(());
    }

    let tenant_id = config.dev_tenant.id();
    let created = app_state
        .user_service
        .create_user(
            tenant_id,
            NewUser {
                email: seed_user.email.clone(),
                display_name: DEV_SEED_DISPLAY_NAME.to_owned(),
                password: seed_user.password.clone(),
            },
        )
        .await;

    match created {
        Ok(user) => {
            info!(tenant_id = %tenant_id, user_id = %user.id, "seeded development user");
            Ok(())
        }
        Err(AppError::Conflict(_)) => {
            info!(tenant_id = %tenant_id, "development user already present");
            Ok(())
        }
        Err(error) => Err(error),
    }
}
