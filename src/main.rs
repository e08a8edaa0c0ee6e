// Load configuration
// Set up logging
// Create chain client and in-memory store
// Start blockchain polling task
// Start HTTP server, shut both down on SIGINT/SIGTERM

use eth_tx_watcher::{
    api, blockchain::resolve_start_block, state::AppState, Config, EthClient, MemoryStorage,
    ParserService, PollingEngine, Storage,
};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting eth-tx-watcher");

    // Load configuration
    let config = Config::from_env();
    info!("Configuration loaded: {:?}", config);

    let client = EthClient::new(&config)?;
    let start_block = resolve_start_block(&client, &config.start_block)
        .await
        .inspect_err(|e| error!("Failed to resolve start block {:?}: {}", config.start_block, e))?;

    // Shared store, polling engine and query facade
    let store: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let engine = PollingEngine::new(client, store.clone(), start_block, config.poll_interval);
    let parser = ParserService::new(store, engine.watermark());
    let poller = engine.spawn();
    info!("Blockchain polling task started");

    // Start HTTP server
    let app = api::create_router(Arc::new(AppState::new(parser)), config.request_timeout);
    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Starting server on {}", addr);

    let shutdown = CancellationToken::new();
    let server_shutdown = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
            .await
    });

    tokio::select! {
        result = &mut server => {
            poller.shutdown(config.shutdown_grace).await;
            return match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(format!("server error: {e}").into()),
                Err(e) => Err(format!("server task failed: {e}").into()),
            };
        }
        signal = shutdown_signal() => {
            info!("Shutdown started: {}", signal);
        }
    }

    // Stop polling and give outstanding requests a deadline for completion.
    shutdown.cancel();
    poller.shutdown(config.shutdown_grace).await;

    match tokio::time::timeout(config.shutdown_grace, &mut server).await {
        Ok(Ok(Ok(()))) => info!("Shutdown complete"),
        Ok(Ok(Err(e))) => error!("Server stopped with error: {}", e),
        Ok(Err(e)) => error!("Server task failed: {}", e),
        Err(_) => {
            server.abort();
            return Err("could not stop server gracefully".into());
        }
    }

    Ok(())
}

async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}
