use thiserror::Error;

const ADDRESS_HEX_LEN: usize = 40;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid Ethereum address format: {0}")]
    InvalidAddress(String),
}

/// Checks that `address` is `0x` followed by exactly 40 hex digits.
///
/// Mixed case is accepted; checksums are not verified because addresses are
/// lowercased by [`normalize_address`] before they are stored or matched.
pub fn validate_eth_address(address: &str) -> Result<(), ValidationError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ValidationError::MissingParameter("address".to_string()));
    }

    let digits = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| ValidationError::InvalidAddress(address.to_string()))?;

    if digits.len() != ADDRESS_HEX_LEN || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidAddress(address.to_string()));
    }

    Ok(())
}

/// Canonical form used for subscriptions, lookups and matching.
pub fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "0xde0B295669a9FD93d5F28D9Ec85E40f4cb697BAe";

    #[test]
    fn accepts_checksummed_and_lowercase_addresses() {
        assert!(validate_eth_address(ADDRESS).is_ok());
        assert!(validate_eth_address(&ADDRESS.to_lowercase()).is_ok());
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert_eq!(
            validate_eth_address("unknown"),
            Err(ValidationError::InvalidAddress("unknown".to_string()))
        );
        assert!(validate_eth_address("0x123").is_err());
        assert!(validate_eth_address("0xzz0B295669a9FD93d5F28D9Ec85E40f4cb697BAe").is_err());
        assert!(validate_eth_address("de0B295669a9FD93d5F28D9Ec85E40f4cb697BAe").is_err());
        assert_eq!(
            validate_eth_address("  "),
            Err(ValidationError::MissingParameter("address".to_string()))
        );
    }

    #[test]
    fn normalization_folds_case_and_whitespace() {
        assert_eq!(
            normalize_address(" 0xDE0B295669A9FD93D5F28D9EC85E40F4CB697BAE "),
            "0xde0b295669a9fd93d5f28d9ec85e40f4cb697bae"
        );
    }
}
