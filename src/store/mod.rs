//! Subscription registry and per-address transaction index.

pub mod memory;

use crate::models::Transaction;
use std::collections::HashSet;

pub use memory::MemoryStorage;

/// Concurrency-safe store shared by the polling engine and the query side.
///
/// Addresses are compared exactly as given; callers canonicalize them first.
/// No operation fails: unknown addresses simply have no transactions.
pub trait Storage: Send + Sync {
    /// Registers `address`. Returns `false` if it was already subscribed.
    fn subscribe(&self, address: &str) -> bool;

    fn is_subscribed(&self, address: &str) -> bool;

    /// Point-in-time copy of every subscribed address.
    fn subscribers(&self) -> HashSet<String>;

    /// Appends `tx` to the end of the sequence kept for `address`.
    fn append_transaction(&self, address: &str, tx: Transaction);

    /// Transactions indexed for `address`, oldest first.
    fn transactions(&self, address: &str) -> Vec<Transaction>;
}
