use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::infra::app_state::AppState;

/// Work run once after the state is built and before the listener binds.
#[async_trait]
pub trait StartupHooks: Send + Sync {
    async fn run(&self, state: &AppState) -> Result<()>;
}

/// Ensures the configured bootstrap admin account exists.
#[derive(Debug, Default)]
pub struct ProdStartupHooks;

#[async_trait]
impl StartupHooks for ProdStartupHooks {
    async fn run(&self, state: &AppState) -> Result<()> {
        let Some(admin) = state.config.bootstrap.as_ref() else {
            return Ok(());
        };

        let user = state
            .users
            .ensure_admin(&admin.email, &admin.password)
            .await
            .context("failed to ensure bootstrap admin account")?;
        info!(user_id = user.id, "bootstrap admin ready");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct NoopStartupHooks;

#[async_trait]
impl StartupHooks for NoopStartupHooks {
    async fn run(&self, _state: &AppState) -> Result<()> {
        Ok(())
    }
}
