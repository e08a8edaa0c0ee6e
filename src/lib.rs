pub mod api;
pub mod blockchain;
pub mod config;
pub mod models;
pub mod service;
pub mod state;
pub mod store;
pub mod validation;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience
pub use api::error::ApiError;
pub use api::response::ApiResponse;
pub use api::route::create_router;
pub use blockchain::{ChainClient, ClientError, EthClient, PollerHandle, PollingEngine};
pub use config::{Config, StartBlock};
pub use models::Transaction;
pub use service::ParserService;
pub use store::{MemoryStorage, Storage};
pub use validation::{normalize_address, validate_eth_address, ValidationError};
