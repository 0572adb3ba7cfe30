//! # Warden Server
//!
//! Account service binary: loads configuration, opens the user store, and
//! serves the HTTP API until Ctrl-C.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warden_core::store::MemoryUserStore;

use warden_server::{
    db::{self, PostgresUserStore},
    infra::{
        app_state::AppState,
        config::{Config, ConfigLoad, ConfigLoader},
        startup::{ProdStartupHooks, StartupHooks},
    },
    routes,
};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "warden-server")]
#[command(about = "User account service with bearer-token login and role-gated administration")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, env = "WARDEN_CONFIG")]
    config: Option<PathBuf>,

    /// Path to a .env file (defaults to ./.env when present)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = &cli.env_file {
        loader = loader.with_env_file(path);
    }
    let ConfigLoad {
        mut config,
        warnings,
    } = loader.load().context("failed to load configuration")?;

    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded environment from .env");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "using configuration file");
    }
    for warning in warnings.iter() {
        match &warning.hint {
            Some(hint) => warn!(%hint, "{}", warning.message),
            None => warn!("{}", warning.message),
        }
    }

    let state = build_state(config).await?;

    ProdStartupHooks.run(&state).await?;

    let addr = state.config.server.bind_address();
    let app = routes::create_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "warden listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

async fn build_state(config: Config) -> anyhow::Result<AppState> {
    match config.database.url.clone() {
        Some(url) => {
            let pool = db::connect(&url).await?;
            let store = Arc::new(PostgresUserStore::new(pool));
            AppState::new(config, store).context("invalid authentication settings")
        }
        None => {
            warn!("running with the in-memory user store; accounts will not persist");
            let store = Arc::new(MemoryUserStore::new());
            AppState::new(config, store).context("invalid authentication settings")
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
