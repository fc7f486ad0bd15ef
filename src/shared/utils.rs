//! Utility functions and helpers

use super::errors::AppError;
use super::types::{Address, Amount, PRECISION};

/// Parse a `0x`-prefixed (or bare) hex address
pub fn parse_address(value: &str) -> Result<Address, AppError> {
    let trimmed = value.trim();
    let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(hex_part)
        .map_err(|e| AppError::ConfigError(format!("Invalid address {}: {}", value, e)))?;
    if bytes.len() != Address::len_bytes() {
        return Err(AppError::ConfigError(format!(
            "Invalid address {}: expected {} bytes, got {}",
            value,
            Address::len_bytes(),
            bytes.len()
        )));
    }
    Ok(Address::from_slice(&bytes))
}

/// Parse a decimal amount string into a 256-bit amount
pub fn parse_amount(value: &str) -> Result<Amount, AppError> {
    Amount::from_dec_str(value.trim())
        .map_err(|e| AppError::ConfigError(format!("Invalid amount {}: {:?}", value, e)))
}

/// Parse a comma-separated address list
pub fn parse_address_list(value: &str) -> Result<Vec<Address>, AppError> {
    value.split(',').map(parse_address).collect()
}

/// Parse a comma-separated list of basis-point fees
pub fn parse_fee_list(value: &str) -> Result<Vec<u32>, AppError> {
    value
        .split(',')
        .map(|s| {
            s.trim()
                .parse::<u32>()
                .map_err(|e| AppError::ConfigError(format!("Invalid fee {}: {}", s, e)))
        })
        .collect()
}

/// Full lowercase hex form of an address
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_bytes()))
}

/// Render a `PRECISION`-scaled fraction as a percentage
pub fn format_scaled_percent(value: u64) -> String {
    let whole = value / (PRECISION / 100);
    let frac = value % (PRECISION / 100);
    format!("{}.{:04}%", whole, frac)
}

/// Generate unique ID
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Serde adapters for decimal-string amounts and hex-string addresses in
/// configuration files.
pub mod serde_helpers {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::shared::types::{Address, Amount};

    pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<Amount, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_amount(&raw).map_err(de::Error::custom)
    }

    pub fn serialize_amount<S>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize_address<'de, D>(deserializer: D) -> Result<Address, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_address(&raw).map_err(de::Error::custom)
    }

    pub fn serialize_address<S>(address: &Address, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_address(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_roundtrip() {
        let addr = parse_address("0x00000000000000000000000000000000000000aa").unwrap();
        assert_eq!(addr, Address::from_low_u64_be(0xaa));
        assert_eq!(
            format_address(&addr),
            "0x00000000000000000000000000000000000000aa"
        );
        assert!(parse_address("0xnothex").is_err());
    }

    #[test]
    fn test_parse_lists() {
        let fees = parse_fee_list("30, 25,5").unwrap();
        assert_eq!(fees, vec![30, 25, 5]);
        assert!(parse_fee_list("30,x").is_err());
        assert_eq!(parse_amount("1000").unwrap(), Amount::from(1000u64));
    }

    #[test]
    fn test_format_scaled_percent() {
        assert_eq!(format_scaled_percent(20_100), "2.0100%");
        assert_eq!(format_scaled_percent(PRECISION), "100.0000%");
    }
}
