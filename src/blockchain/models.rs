//! JSON-RPC wire types and their conversion into the indexed [`Transaction`] model.

use crate::models::{Transaction, STATUS_MINED};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ethereum JSON-RPC method names used by the client.
pub mod rpc_methods {
    /// Get the number of the most recent block
    pub const BLOCK_NUMBER: &str = "eth_blockNumber";
    /// Get a block by number, optionally with full transaction objects
    pub const GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";
}

/// A JSON-RPC 2.0 request envelope.
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: Value,
    pub id: u64,
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
            id,
        }
    }
}

/// The `error` member of a JSON-RPC response.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// A block as returned by `eth_getBlockByNumber(n, true)`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(default, with = "quantity::option")]
    pub number: Option<BigUint>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub transactions: Vec<RpcTransaction>,
}

/// A full transaction object embedded in a block.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    pub hash: String,
    pub from: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub gas: String,
    #[serde(default)]
    pub gas_price: Option<String>,
    #[serde(default, with = "quantity::option")]
    pub block_number: Option<BigUint>,
    #[serde(default)]
    pub block_hash: Option<String>,
}

impl RpcTransaction {
    /// Builds the stored record. `block_number` and `block_hash` fill in
    /// fields the gateway left out of the transaction object.
    pub fn to_transaction(&self, block_number: &BigUint, block_hash: Option<&str>) -> Transaction {
        Transaction {
            hash: self.hash.clone(),
            from: self.from.clone(),
            to: self.to.clone(),
            value: self.value.clone(),
            gas: self.gas.clone(),
            gas_price: self.gas_price.clone().unwrap_or_default(),
            block_number: self
                .block_number
                .clone()
                .unwrap_or_else(|| block_number.clone()),
            block_hash: self
                .block_hash
                .clone()
                .or_else(|| block_hash.map(str::to_string))
                .unwrap_or_default(),
            status: STATUS_MINED.to_string(),
        }
    }
}

/// Hex quantity encoding (`0x1b4`) used by Ethereum JSON-RPC.
pub mod quantity {
    use num_bigint::BigUint;

    /// Decodes a `0x`-prefixed hexadecimal quantity.
    pub fn decode(raw: &str) -> Option<BigUint> {
        let digits = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X"))?;
        BigUint::parse_bytes(digits.as_bytes(), 16)
    }

    pub fn encode(value: &BigUint) -> String {
        format!("0x{value:x}")
    }

    pub mod option {
        use num_bigint::BigUint;
        use serde::{de, Deserialize, Deserializer};

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<BigUint>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(raw) => super::decode(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid hex quantity: {raw}"))),
            }
        }
    }
}
