//! In-memory storage implementation

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use tracing::debug;

use super::Storage;
use crate::models::Transaction;

/// Keeps subscriptions and matched transactions for the life of the process.
///
/// Subscriptions and the transaction index sit behind separate locks, so an
/// append never waits on a subscribe and neither blocks readers for longer
/// than a single map operation.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    subscriptions: RwLock<HashSet<String>>,
    transactions: RwLock<HashMap<String, Vec<Transaction>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn subscribe(&self, address: &str) -> bool {
        let added = self.subscriptions.write().insert(address.to_string());
        if added {
            debug!(address, "subscribed address");
        }
        added
    }

    fn is_subscribed(&self, address: &str) -> bool {
        self.subscriptions.read().contains(address)
    }

    fn subscribers(&self) -> HashSet<String> {
        self.subscriptions.read().clone()
    }

    fn append_transaction(&self, address: &str, tx: Transaction) {
        self.transactions
            .write()
            .entry(address.to_string())
            .or_default()
            .push(tx);
    }

    fn transactions(&self, address: &str) -> Vec<Transaction> {
        self.transactions
            .read()
            .get(address)
            .cloned()
            .unwrap_or_default()
    }
}
