use std::sync::Arc;

use partner_dispatch::api;
use partner_dispatch::config::Config;
use partner_dispatch::engine::timers;
use partner_dispatch::error::AppError;
use partner_dispatch::state::AppState;
use partner_dispatch::storage::file::FileStore;
use partner_dispatch::storage::memory::MemoryStore;
use partner_dispatch::storage::KeyValueStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let store: Arc<dyn KeyValueStore> = match &config.store_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "using file store");
            Arc::new(FileStore::new(path.clone()))
        }
        None => {
            tracing::info!("using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let http_port = config.http_port;
    let shared_state = Arc::new(AppState::new(config, store));

    match shared_state.restore_session().await {
        Ok(true) => tracing::info!("previous session restored"),
        Ok(false) => {}
        Err(err) => tracing::warn!(error = %err, "could not restore previous session"),
    }

    timers::spawn_background(&shared_state);

    let app = api::rest::router(shared_state.clone());

    let bind_addr = format!("0.0.0.0:{http_port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port, "http server started");

    let shutdown = shared_state.shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    shutdown.cancel();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
