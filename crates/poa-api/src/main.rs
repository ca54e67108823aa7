//! # poa-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for the proof-of-action receipt service.
//! Configuration comes from the environment (see [`poa_api::config`]).

use poa_api::config::AppConfig;
use poa_api::state::AppState;
use poa_store::ReceiptStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::debug!(?config, "configuration loaded");

    // Load the receipt snapshot and rebuild indexes. A corrupt snapshot
    // aborts startup rather than silently starting empty.
    let store = ReceiptStore::open(&config.db_path).map_err(|e| {
        tracing::error!("failed to open receipt store: {e}");
        e
    })?;
    tracing::info!(
        receipts = store.len(),
        path = %config.db_path.display(),
        "receipt store loaded"
    );
    tracing::info!(contract = %config.contract_id(), "watching proof-of-action contract");

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(store, config);
    let app = poa_api::app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("PoA receipt service listening on {addr}");
    tracing::info!("webhook endpoint: http://{addr}/api/webhook/proof");

    axum::serve(listener, app).await?;

    Ok(())
}
