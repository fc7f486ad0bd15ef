//! Common types used across the router

use primitive_types::{H160, U256};
use serde::{Deserialize, Serialize};

use crate::shared::errors::SwapError;

/// Ledger address (asset, pool, caller or holder)
pub type Address = H160;

/// Token amount with 256-bit precision
pub type Amount = U256;

/// Fixed-point scale representing 100%
pub const PRECISION: u64 = 1_000_000;

/// Default slippage tolerance (1%) used when deriving a minimum output
pub const MAX_SLIPPAGE: u64 = PRECISION / 100;

/// Upper bound for `RiskParameters::max_price_impact` (20%)
pub const MAX_PRICE_IMPACT_CAP: u64 = PRECISION / 5;

pub const MIN_PATH_LENGTH: usize = 2;
pub const MAX_PATH_LENGTH: usize = 6;
pub const MAX_BATCH_SIZE: usize = 10;

/// Basis-point denominator; also the largest fee a hop may carry
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Standard constant-product pool fee assumed by fee-less simulations
pub const DEFAULT_HOP_FEE_BPS: u32 = 30;

pub const MAX_SANDWICH_PROTECTION_BIPS: u32 = 100;

/// Who is calling and when, as seen by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub slot: u64,
    pub timestamp: u64,
}

impl CallContext {
    pub fn new(caller: Address, slot: u64, timestamp: u64) -> Self {
        Self {
            caller,
            slot,
            timestamp,
        }
    }
}

/// Owner-mutable risk limits applied to every swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskParameters {
    pub max_trade_volume: Amount,
    pub min_pool_liquidity: Amount,
    /// Cumulative price impact ceiling, fraction of `PRECISION`
    pub max_price_impact: u64,
    pub sandwich_protection_bips: u32,
}

impl RiskParameters {
    pub fn validate(&self) -> Result<(), SwapError> {
        if self.max_trade_volume.is_zero() {
            return Err(SwapError::InvalidRiskParameters(
                "max_trade_volume must be positive".to_string(),
            ));
        }
        if self.max_price_impact > MAX_PRICE_IMPACT_CAP {
            return Err(SwapError::InvalidRiskParameters(format!(
                "max_price_impact {} exceeds cap {}",
                self.max_price_impact, MAX_PRICE_IMPACT_CAP
            )));
        }
        if self.sandwich_protection_bips > MAX_SANDWICH_PROTECTION_BIPS {
            return Err(SwapError::InvalidRiskParameters(format!(
                "sandwich_protection_bips {} exceeds {}",
                self.sandwich_protection_bips, MAX_SANDWICH_PROTECTION_BIPS
            )));
        }
        Ok(())
    }
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            max_trade_volume: U256::from(10u64).pow(U256::from(24u64)), // 1M tokens at 18 decimals
            min_pool_liquidity: U256::from(1_000u64),
            max_price_impact: PRECISION / 10, // 10%
            sandwich_protection_bips: 50,     // 0.5%
        }
    }
}

/// Front-running / flash-loan heuristics configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MevConfig {
    pub enabled: bool,
    pub max_tx_per_block: u32,
    /// Minimum seconds between two guarded actions of one caller
    pub min_tx_delay: u64,
}

impl Default for MevConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_tx_per_block: 3,
            min_tx_delay: 0,
        }
    }
}
