//! apinav host: wires the collection store, service and sync engine
//! together and exposes them to UI surfaces over a JSON-lines stdio bridge.

mod bridge;

use std::sync::Arc;

use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt};

use apinav_core::config::AppConfig;
use apinav_core::result::AppResult;
use apinav_core::types::generator::UuidGenerator;
use apinav_realtime::SyncEngine;
use apinav_service::{CollectionService, TreeMutator};
use apinav_storage::{CollectionStore, build_backend};

#[tokio::main]
async fn main() {
    let env = std::env::var("APINAV_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Host error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging. Stdout carries surface traffic, so logs go
/// to stderr.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

/// Main host run function
async fn run(config: AppConfig) -> AppResult<()> {
    tracing::info!("Starting apinav-host v{}", env!("CARGO_PKG_VERSION"));

    let backend = build_backend(&config.store).await?;
    backend.health_check().await?;
    let store = Arc::new(CollectionStore::new(backend, config.store.state_key.clone()));
    let initial = store.load().await?;
    tracing::info!(
        key = store.key(),
        collections = initial.value.len(),
        "Collection store ready"
    );

    let mutator = TreeMutator::new(Arc::new(UuidGenerator));
    let service = Arc::new(CollectionService::new(store, mutator, &config.sync));
    let engine = Arc::new(SyncEngine::new(service, config.sync.clone()));

    let (out_tx, out_rx) = mpsc::channel(config.sync.channel_buffer_size);
    let writer = tokio::spawn(bridge::write_lines(out_rx, tokio::io::stdout()));
    let bridge = bridge::Bridge::new(engine.clone(), out_tx);

    tokio::select! {
        result = bridge::run(&bridge, BufReader::new(tokio::io::stdin())) => {
            result?;
            tracing::info!("Input closed");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
        }
    }

    bridge.shutdown();
    drop(bridge);
    if let Ok(Err(e)) = writer.await {
        tracing::warn!(error = %e, "Output writer stopped with an error");
    }

    tracing::info!(metrics = ?engine.metrics().snapshot(), "Host stopped");
    Ok(())
}
