//! hospital-ops server entry point.
//!
//! Loads configuration, opens the store, starts the status reconciler,
//! and serves the REST and WebSocket endpoints until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use hospital_ops::app_state::AppState;
use hospital_ops::config::{LogFormat, OpsConfig};
use hospital_ops::domain::EventBus;
use hospital_ops::persistence::{MemoryStore, PostgresStore, SharedStore};
use hospital_ops::service::status_reconciler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = OpsConfig::from_env().context("invalid LISTEN_ADDR")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting hospital-ops");

    let store = open_store(&config).await?;
    tracing::info!(backend = store.backend(), "store ready");

    let event_bus = EventBus::new(config.event_bus_capacity);
    let app_state = AppState::new(store, event_bus, &config);

    // Background status reconciliation
    let cancel = CancellationToken::new();
    let reconciler = tokio::spawn(status_reconciler::run(
        (*app_state.theater_service).clone(),
        Duration::from_secs(config.status_reconcile_interval_secs),
        cancel.clone(),
    ));

    let app = hospital_ops::build_app(app_state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
            tracing::info!("shutdown signal received");
            shutdown.cancel();
        })
        .await
        .context("server error")?;

    cancel.cancel();
    if let Err(e) = reconciler.await {
        tracing::warn!(error = %e, "status reconciler task ended abnormally");
    }
    tracing::info!("hospital-ops stopped");
    Ok(())
}

async fn open_store(config: &OpsConfig) -> anyhow::Result<SharedStore> {
    if !config.persistence_enabled {
        tracing::warn!("persistence disabled, records live in memory only");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await
        .context("failed to connect to PostgreSQL")?;

    let store = PostgresStore::new(pool);
    store.migrate().await.context("failed to run migrations")?;
    Ok(Arc::new(store))
}
