use crate::blockchain::client::{ChainClient, ClientError};
use crate::blockchain::models::Block;
use crate::config::StartBlock;
use crate::store::Storage;
use crate::validation::normalize_address;
use num_bigint::BigUint;
use num_traits::One;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Where the engine is within its poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    FetchingHeight,
    ScanningBlocks,
}

#[derive(Error, Debug)]
pub enum PollError {
    #[error("failed to fetch latest block number: {0}")]
    Height(#[source] ClientError),

    #[error("failed to fetch block {number}: {source}")]
    Block {
        number: BigUint,
        #[source]
        source: ClientError,
    },
}

/// Outcome of a cycle that reached the gateway's height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    /// Watermark before the cycle.
    pub from: BigUint,
    /// Watermark after the cycle.
    pub to: BigUint,
    pub blocks_scanned: u64,
    pub transactions_indexed: usize,
}

/// Follows the chain head and indexes transactions of subscribed addresses.
///
/// The watermark only moves forward, one block at a time, and only after
/// every match in that block has been appended to the store.
pub struct PollingEngine<C> {
    client: C,
    store: Arc<dyn Storage>,
    poll_interval: Duration,
    watermark: watch::Sender<BigUint>,
    state: watch::Sender<CycleState>,
}

impl<C: ChainClient> PollingEngine<C> {
    /// Creates an engine that considers every block up to `start_block` processed.
    pub fn new(
        client: C,
        store: Arc<dyn Storage>,
        start_block: BigUint,
        poll_interval: Duration,
    ) -> Self {
        let (watermark, _) = watch::channel(start_block);
        let (state, _) = watch::channel(CycleState::Idle);
        Self {
            client,
            store,
            poll_interval,
            watermark,
            state,
        }
    }

    /// Receiver that always holds the highest fully indexed block.
    pub fn watermark(&self) -> watch::Receiver<BigUint> {
        self.watermark.subscribe()
    }

    pub fn state(&self) -> watch::Receiver<CycleState> {
        self.state.subscribe()
    }

    /// Runs one poll cycle.
    ///
    /// On a block fetch failure the cycle stops and the watermark stays on the
    /// last block that was fully indexed, so the failed block is retried first
    /// on the next cycle.
    pub async fn poll_once(&self) -> Result<CycleSummary, PollError> {
        let result = self.scan().await;
        self.state.send_replace(CycleState::Idle);
        result
    }

    async fn scan(&self) -> Result<CycleSummary, PollError> {
        self.state.send_replace(CycleState::FetchingHeight);
        let latest = self
            .client
            .latest_block_number()
            .await
            .map_err(PollError::Height)?;

        let start = self.watermark.borrow().clone();
        let mut summary = CycleSummary {
            from: start.clone(),
            to: start.clone(),
            blocks_scanned: 0,
            transactions_indexed: 0,
        };

        if latest <= start {
            debug!("No new blocks: watermark {}, latest {}", start, latest);
            return Ok(summary);
        }

        self.state.send_replace(CycleState::ScanningBlocks);
        let subscribers = self.store.subscribers();
        debug!(
            "Scanning blocks {}-{} for {} subscribed addresses",
            &start + 1u32,
            latest,
            subscribers.len()
        );

        let mut number = start + 1u32;
        while number <= latest {
            let block = self
                .client
                .block_by_number(&number)
                .await
                .map_err(|source| PollError::Block {
                    number: number.clone(),
                    source,
                })?;

            summary.transactions_indexed += self.index_block(&number, &block, &subscribers);
            summary.blocks_scanned += 1;

            // No await between indexing and advancing the watermark.
            self.watermark.send_replace(number.clone());
            summary.to = number.clone();
            number += BigUint::one();
        }

        Ok(summary)
    }

    /// Appends every transaction of `block` that touches a subscriber. Returns
    /// the number of appends.
    fn index_block(&self, number: &BigUint, block: &Block, subscribers: &HashSet<String>) -> usize {
        if subscribers.is_empty() {
            return 0;
        }

        let mut appended = 0;
        for rpc_tx in &block.transactions {
            let from = normalize_address(&rpc_tx.from);
            let to = rpc_tx.to.as_deref().map(normalize_address);

            let mut matches = Vec::with_capacity(2);
            if subscribers.contains(&from) {
                matches.push(from);
            }
            if let Some(to) = to {
                if subscribers.contains(&to) && !matches.contains(&to) {
                    matches.push(to);
                }
            }
            if matches.is_empty() {
                continue;
            }

            let tx = rpc_tx.to_transaction(number, block.hash.as_deref());
            for address in matches {
                debug!("Indexing transaction {} for {} at block {}", tx.hash, address, number);
                self.store.append_transaction(&address, tx.clone());
                appended += 1;
            }
        }
        appended
    }

    /// Moves the engine onto a background task and returns its handle.
    pub fn spawn(self) -> PollerHandle {
        let shutdown = CancellationToken::new();
        let watermark = self.watermark();
        let state = self.state();
        let task_shutdown = shutdown.clone();
        let join = tokio::spawn(async move { self.run(task_shutdown).await });

        PollerHandle {
            shutdown,
            join,
            watermark,
            state,
        }
    }

    /// Polls until `shutdown` is cancelled. A cycle in flight at cancellation
    /// is abandoned at its next await point.
    pub async fn run(self, shutdown: CancellationToken) {
        let start = self.watermark.borrow().clone();
        info!(
            "Starting blockchain polling from block {} every {:?}",
            start, self.poll_interval
        );

        loop {
            tokio::select! {
                result = self.poll_once() => match result {
                    Ok(summary) if summary.blocks_scanned > 0 => info!(
                        "Indexed blocks {}-{}: {} transactions",
                        summary.from + 1u32,
                        summary.to,
                        summary.transactions_indexed
                    ),
                    Ok(_) => {}
                    Err(e @ PollError::Height(_)) => error!("Error polling latest block: {}", e),
                    Err(e @ PollError::Block { .. }) => {
                        let watermark = self.watermark.borrow().clone();
                        warn!("Stopping cycle at block {}: {}", watermark, e);
                    }
                },
                _ = shutdown.cancelled() => break,
            }

            // The next cycle is only scheduled once this one has finished.
            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = shutdown.cancelled() => break,
            }
        }

        self.state.send_replace(CycleState::Idle);
        info!("Shutting down blockchain polling service");
    }
}

/// Turns the configured start block into the engine's initial watermark.
///
/// `latest` asks the gateway once. A failed lookup is returned to the caller
/// rather than replaced by block 0.
pub async fn resolve_start_block<C: ChainClient>(
    client: &C,
    start_block: &StartBlock,
) -> Result<BigUint, ClientError> {
    match start_block {
        StartBlock::Number(number) => Ok(number.clone()),
        StartBlock::Latest => {
            let latest = client.latest_block_number().await?;
            info!("Resolved start block to gateway head {}", latest);
            Ok(latest)
        }
    }
}

/// Owned lifecycle handle for a spawned [`PollingEngine`].
pub struct PollerHandle {
    shutdown: CancellationToken,
    join: JoinHandle<()>,
    watermark: watch::Receiver<BigUint>,
    state: watch::Receiver<CycleState>,
}

impl PollerHandle {
    pub fn watermark(&self) -> watch::Receiver<BigUint> {
        self.watermark.clone()
    }

    pub fn state(&self) -> watch::Receiver<CycleState> {
        self.state.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Stops the loop and waits up to `grace` for it to exit, aborting it after that.
    pub async fn shutdown(self, grace: Duration) {
        self.shutdown.cancel();

        let abort = self.join.abort_handle();
        match tokio::time::timeout(grace, self.join).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Polling task failed: {}", e),
            Err(_) => {
                warn!("Polling task did not stop within {:?}, aborting", grace);
                abort.abort();
            }
        }
    }
}
