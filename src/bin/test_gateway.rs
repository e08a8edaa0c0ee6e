use eth_tx_watcher::{
    blockchain::{ChainClient, EthClient, PollingEngine},
    config::Config,
    normalize_address, MemoryStorage, Storage,
};
use num_bigint::BigUint;
use std::sync::Arc;
use tracing::{info, warn, Level};

/// Probes a live gateway: reads the head, fetches it, and indexes the most
/// active sender of that block through one real poll cycle.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Starting gateway integration test...");

    let config = Config::from_env();
    let client = EthClient::new(&config)?;
    info!("Using gateway {}", config.gateway_endpoint());

    // 1. Latest block number
    let latest = client.latest_block_number().await?;
    info!("✅ Latest block: {}", latest);

    // 2. Full block with transactions
    let block = client.block_by_number(&latest).await?;
    info!(
        "✅ Block {} ({:?}) has {} transactions",
        latest,
        block.hash,
        block.transactions.len()
    );

    let Some(first) = block.transactions.first() else {
        warn!("Latest block is empty, nothing to index");
        return Ok(());
    };
    let watched = normalize_address(&first.from);

    // 3. One poll cycle over the head block
    let store: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    store.subscribe(&watched);

    let start = if latest > BigUint::default() { &latest - 1u32 } else { latest.clone() };
    let engine = PollingEngine::new(client, store.clone(), start, config.poll_interval);
    let summary = engine.poll_once().await?;
    info!(
        "✅ Cycle scanned {} blocks up to {}, indexed {} transactions",
        summary.blocks_scanned, summary.to, summary.transactions_indexed
    );

    for tx in store.transactions(&watched) {
        info!("   {} {} -> {:?} value {}", tx.hash, tx.from, tx.to, tx.value);
    }

    info!("Gateway integration test completed");
    Ok(())
}
