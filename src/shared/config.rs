use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::domain::protection::OperationId;
use crate::shared::errors::AppError;
use crate::shared::types::{Address, Amount, MevConfig, RiskParameters};
use crate::shared::utils::serde_helpers::{deserialize_address, deserialize_amount};

/// Default configuration file name
pub const DEFAULT_CONFIG_PATH: &str = "Config.toml";

/// Engine identity and ledger timing
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    #[serde(deserialize_with = "deserialize_address")]
    pub base_asset: Address,
    #[serde(deserialize_with = "deserialize_address")]
    pub owner: Address,
    /// Address holding the router's in-flight balances
    #[serde(deserialize_with = "deserialize_address")]
    pub router: Address,
    #[serde(default = "default_slot_duration_ms")]
    pub slot_duration_ms: u64,
}

fn default_slot_duration_ms() -> u64 {
    3_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiskSection {
    #[serde(deserialize_with = "deserialize_amount")]
    pub max_trade_volume: Amount,
    #[serde(deserialize_with = "deserialize_amount")]
    pub min_pool_liquidity: Amount,
    pub max_price_impact: u64,
    pub sandwich_protection_bips: u32,
}

impl From<RiskSection> for RiskParameters {
    fn from(section: RiskSection) -> Self {
        Self {
            max_trade_volume: section.max_trade_volume,
            min_pool_liquidity: section.min_pool_liquidity,
            max_price_impact: section.max_price_impact,
            sandwich_protection_bips: section.sandwich_protection_bips,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CooldownEntry {
    pub operation: OperationId,
    pub seconds: u64,
}

/// Seed pool for the in-memory pool service
#[derive(Debug, Clone, Deserialize)]
pub struct PoolEntry {
    #[serde(deserialize_with = "deserialize_address")]
    pub address: Address,
    #[serde(deserialize_with = "deserialize_address")]
    pub token_a: Address,
    #[serde(deserialize_with = "deserialize_address")]
    pub token_b: Address,
    #[serde(deserialize_with = "deserialize_amount")]
    pub reserve_a: Amount,
    #[serde(deserialize_with = "deserialize_amount")]
    pub reserve_b: Amount,
    #[serde(default = "default_pool_fee_bps")]
    pub fee_bps: u32,
}

fn default_pool_fee_bps() -> u32 {
    crate::shared::types::DEFAULT_HOP_FEE_BPS
}

/// Seed token balance for the in-memory pool service
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceEntry {
    #[serde(deserialize_with = "deserialize_address")]
    pub token: Address,
    #[serde(deserialize_with = "deserialize_address")]
    pub holder: Address,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Amount,
}

/// Full router configuration as read from `Config.toml`
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub engine: EngineSection,
    pub risk: Option<RiskSection>,
    #[serde(default)]
    pub mev: MevConfig,
    #[serde(default)]
    pub cooldowns: Vec<CooldownEntry>,
    #[serde(default)]
    pub pools: Vec<PoolEntry>,
    #[serde(default)]
    pub balances: Vec<BalanceEntry>,
}

impl EngineConfig {
    pub fn risk_parameters(&self) -> RiskParameters {
        self.risk.clone().map(RiskParameters::from).unwrap_or_default()
    }

    /// Reject configurations that could never produce a working router
    pub fn validate(&self) -> Result<(), AppError> {
        if self.engine.base_asset.is_zero() || self.engine.owner.is_zero() || self.engine.router.is_zero() {
            return Err(AppError::ConfigError(
                "engine addresses must be non-zero".to_string(),
            ));
        }
        if self.engine.slot_duration_ms == 0 {
            return Err(AppError::ConfigError(
                "slot_duration_ms must be positive".to_string(),
            ));
        }
        self.risk_parameters().validate()?;
        for pool in &self.pools {
            if pool.token_a == pool.token_b {
                return Err(AppError::ConfigError(format!(
                    "pool {:?} pairs a token with itself",
                    pool.address
                )));
            }
        }
        Ok(())
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the configuration from `Config.toml` in the working directory
    pub fn load_config() -> Result<EngineConfig, AppError> {
        Self::load(DEFAULT_CONFIG_PATH)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<EngineConfig, AppError> {
        let config_content = fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::ConfigError(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&config_content)
    }

    pub fn from_toml(content: &str) -> Result<EngineConfig, AppError> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[engine]
base_asset = "0x0000000000000000000000000000000000000001"
owner = "0x00000000000000000000000000000000000000f0"
router = "0x00000000000000000000000000000000000000f1"

[risk]
max_trade_volume = "1000000"
min_pool_liquidity = "1000"
max_price_impact = 100000
sandwich_protection_bips = 50

[mev]
enabled = true
max_tx_per_block = 2
min_tx_delay = 0

[[cooldowns]]
operation = "execute_batch_swaps"
seconds = 30

[[pools]]
address = "0x0000000000000000000000000000000000000a01"
token_a = "0x0000000000000000000000000000000000000001"
token_b = "0x0000000000000000000000000000000000000002"
reserve_a = "10000"
reserve_b = "10000"
"#;

    #[test]
    fn test_parse_sample_config() {
        let config = ConfigLoader::from_toml(SAMPLE).unwrap();
        assert_eq!(config.engine.base_asset, Address::from_low_u64_be(1));
        assert_eq!(config.engine.slot_duration_ms, 3_000);
        assert_eq!(config.risk_parameters().max_price_impact, 100_000);
        assert_eq!(config.mev.max_tx_per_block, 2);
        assert_eq!(config.cooldowns[0].operation, OperationId::ExecuteBatchSwaps);
        assert_eq!(config.pools[0].fee_bps, 30);
        assert_eq!(config.pools[0].reserve_a, Amount::from(10_000u64));
    }

    #[test]
    fn test_rejects_excessive_price_impact() {
        let broken = SAMPLE.replace("max_price_impact = 100000", "max_price_impact = 300000");
        assert!(matches!(
            ConfigLoader::from_toml(&broken),
            Err(AppError::SwapError(_))
        ));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        assert!(matches!(
            ConfigLoader::load("/nonexistent/Config.toml"),
            Err(AppError::ConfigError(_))
        ));
    }
}
