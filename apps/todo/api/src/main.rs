use axum_helpers::http::cors_layer_from_config;
use axum_helpers::server::create_production_app;
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_todos::{JsonFilePersistence, TodoPersistence, TodoStore};
use std::sync::Arc;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    // Initialize tracing with ErrorLayer for span trace capture
    init_tracing(&config.environment);

    observability::init_metrics()
        .map_err(|e| eyre::eyre!("Failed to install metrics recorder: {}", e))?;

    // Fails fast in production when no origins are configured
    let cors = cors_layer_from_config(&config.server, &config.environment)?;

    info!(
        "Loading todos from {}",
        config.storage.data_file.display()
    );
    let persistence: Arc<dyn TodoPersistence> =
        Arc::new(JsonFilePersistence::new(config.storage.data_file.clone()));
    let store = TodoStore::load(persistence).await;

    let state = AppState { config, store };

    // create_router adds docs/middleware to our composed routes,
    // then health, readiness and metrics endpoints are merged in
    let app = api::app(&state, cors);

    let server_config = state.config.server.clone();
    let store = state.store.clone();

    info!(
        "Starting todo API with graceful shutdown ({:?} timeout)",
        server_config.shutdown_timeout
    );

    create_production_app(app, &server_config, async move {
        info!("Shutting down: flushing pending todo snapshots");
        store.sync().await;
        info!("Todo snapshots flushed");
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Todo API shutdown complete");
    Ok(())
}
