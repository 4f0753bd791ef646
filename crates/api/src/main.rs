use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;

use meetup_api::app::{build_router, AppState};
use meetup_api::config::Config;
use meetup_api::middleware::{init_metrics, logging::init_logging};

const RATE_LIMIT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    init_logging(&config.logging).context("failed to initialize logging")?;
    init_metrics().context("failed to install Prometheus recorder")?;

    info!("Starting Meetup API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&(&config.database).into()).await?;

    info!("Running database migrations...");
    persistence::db::run_migrations(&pool).await?;

    let addr = config.socket_addr()?;
    let state = AppState::new(config, pool)?;

    if let Some(limiter) = state.rate_limiter.clone() {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(RATE_LIMIT_SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                limiter.retain_recent();
            }
        });
    }

    if state.oauth.is_none() {
        info!("OAuth provider not configured; /auth/callback will redirect to the error page");
    }

    let app = build_router(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
