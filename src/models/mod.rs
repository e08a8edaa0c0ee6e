// Indexed transaction record and API response models

use crate::validation::normalize_address;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// Status recorded for transactions taken from a mined block.
pub const STATUS_MINED: &str = "mined";

/// A transaction that touched at least one subscribed address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    pub from: String,
    /// `None` for contract creations.
    pub to: Option<String>,
    pub value: String,
    pub gas: String,
    pub gas_price: String,
    #[serde(with = "decimal")]
    pub block_number: BigUint,
    pub block_hash: String,
    pub status: String,
}

impl Transaction {
    /// Whether `address` is the sender or the recipient, ignoring case and
    /// surrounding whitespace.
    pub fn involves(&self, address: &str) -> bool {
        let address = normalize_address(address);
        normalize_address(&self.from) == address
            || self.to.as_deref().map(normalize_address).as_deref() == Some(address.as_str())
    }
}

// API response models
#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentBlockResponse {
    #[serde(with = "decimal")]
    pub current_block: BigUint,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubscribeResponse {
    pub result: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<Transaction>,
}

/// Serializes a [`BigUint`] as a base-10 string so JSON readers never round it.
pub mod decimal {
    use num_bigint::BigUint;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let raw = String::deserialize(deserializer)?;
        BigUint::parse_bytes(raw.as_bytes(), 10)
            .ok_or_else(|| de::Error::custom(format!("invalid decimal number: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(from: &str, to: Option<&str>) -> Transaction {
        Transaction {
            hash: "0xhash".to_string(),
            from: from.to_string(),
            to: to.map(str::to_string),
            value: "0x0".to_string(),
            gas: "0x5208".to_string(),
            gas_price: "0x1".to_string(),
            block_number: BigUint::from(1u32),
            block_hash: "0xblock".to_string(),
            status: STATUS_MINED.to_string(),
        }
    }

    #[test]
    fn involves_matches_checksummed_gateway_text() {
        let tx = transfer(
            "0xDE0B295669A9FD93D5F28D9EC85E40F4CB697BAE",
            Some("0x00000000000000000000000000000000000000Bb"),
        );

        assert!(tx.involves("0xde0b295669a9fd93d5f28d9ec85e40f4cb697bae"));
        assert!(tx.involves("0xde0B295669a9FD93d5F28D9Ec85E40f4cb697BAe"));
        assert!(tx.involves("0x00000000000000000000000000000000000000bb"));
        assert!(!tx.involves("0x00000000000000000000000000000000000000cc"));
    }

    #[test]
    fn contract_creation_only_involves_sender() {
        let tx = transfer("0x00000000000000000000000000000000000000aa", None);
        assert!(tx.involves("0x00000000000000000000000000000000000000AA"));
        assert!(!tx.involves(""));
    }

    #[test]
    fn block_number_serializes_as_decimal_string() {
        let value = serde_json::to_value(transfer("0xa", None)).unwrap();
        assert_eq!(value["blockNumber"], "1");
        assert_eq!(value["gasPrice"], "0x1");
    }
}
