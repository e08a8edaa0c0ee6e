pub mod client;
pub mod models;
pub mod polling;

// Re-exports for convenience
pub use client::{ChainClient, ClientError, EthClient};
pub use polling::{resolve_start_block, CycleState, CycleSummary, PollError, PollerHandle, PollingEngine};
