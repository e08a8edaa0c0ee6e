//! Query side of the watcher: the calls the HTTP layer makes.

use crate::models::Transaction;
use crate::store::Storage;
use crate::validation::normalize_address;
use num_bigint::BigUint;
use std::sync::Arc;
use tokio::sync::watch;

/// Read access to the polling engine's progress plus subscription management.
///
/// Cheap to clone; every clone sees the same store and watermark.
#[derive(Clone)]
pub struct ParserService {
    store: Arc<dyn Storage>,
    watermark: watch::Receiver<BigUint>,
}

impl ParserService {
    pub fn new(store: Arc<dyn Storage>, watermark: watch::Receiver<BigUint>) -> Self {
        Self { store, watermark }
    }

    /// Highest block whose transactions are fully indexed.
    pub fn current_block(&self) -> BigUint {
        self.watermark.borrow().clone()
    }

    /// Returns `true` if the address was not subscribed before this call.
    pub fn subscribe(&self, address: &str) -> bool {
        self.store.subscribe(&normalize_address(address))
    }

    /// Inbound and outbound transactions for `address`, in block order.
    pub fn transactions(&self, address: &str) -> Vec<Transaction> {
        self.store.transactions(&normalize_address(address))
    }
}
