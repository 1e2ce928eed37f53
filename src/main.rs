//! leadswipe server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use leadswipe::api;
use leadswipe::app_state::AppState;
use leadswipe::config::{LeadSwipeConfig, LogFormat, SeedConfig, StoreBackend};
use leadswipe::store::{InMemoryStore, PostgresStore, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = LeadSwipeConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, backend = ?config.store_backend, "starting leadswipe");

    // Build store
    let store = match config.store_backend {
        StoreBackend::Memory => memory_store(&config.seed).await?,
        StoreBackend::Postgres => {
            let database = config
                .database
                .as_ref()
                .context("postgres backend selected without database settings")?;
            let pg = PostgresStore::connect(database)
                .await
                .context("connecting to PostgreSQL")?;
            Store::from_adapter(Arc::new(pg))
        }
    };

    // Build application state and router
    let app_state = AppState::new(store, &config);
    let app = api::build_app(app_state, config.request_timeout);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// In-memory store loaded with the configured seed data.
async fn memory_store(seed: &SeedConfig) -> anyhow::Result<Store> {
    let store = InMemoryStore::new();

    if let Some(path) = &seed.leads_path {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let loaded = store.load_leads_json(&json).await?;
        tracing::info!(loaded, path = %path.display(), "seed leads loaded");
    }

    if let (Some(email), Some(password)) = (&seed.user_email, &seed.user_password) {
        let user = store.register_user(email, password).await;
        tracing::info!(user_id = %user.id, "seed user registered");
    }

    Ok(Store::from_adapter(Arc::new(store)))
}
