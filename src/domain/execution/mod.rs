//! Execution domain - swap validation, hop walks and the orchestrator

mod events;
mod swap_executor;
mod swap_orchestrator;
mod swap_validator;

pub use events::{EventLog, RouterEvent};
pub use swap_executor::SwapExecutor;
pub use swap_orchestrator::{RouterSetup, SwapOrchestrator};
pub use swap_validator::SwapValidator;

use primitive_types::{U256, U512};
use serde::Serialize;

use crate::shared::errors::SwapError;
use crate::shared::types::{Address, Amount, PRECISION};
use crate::shared::utils::serde_helpers::{serialize_address, serialize_amount};

/// One cyclic swap along `path`, starting and ending at the base asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub path: Vec<Address>,
    /// Per-hop fee in basis points, `path.len() - 1` entries
    pub fees: Vec<u32>,
    pub amount_in: Amount,
    pub min_amount_out: Amount,
    /// Last ledger timestamp (seconds) at which the swap may still apply
    pub deadline: u64,
}

impl SwapRequest {
    pub fn hop_count(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

/// Several independent walks executed as one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiSwapRequest {
    pub paths: Vec<Vec<Address>>,
    pub fees: Vec<Vec<u32>>,
    pub amounts: Vec<Amount>,
    pub min_amounts: Vec<Amount>,
    pub deadline: u64,
}

impl MultiSwapRequest {
    /// Split into per-path requests; all arrays must have equal length
    pub fn into_requests(self) -> Result<Vec<SwapRequest>, SwapError> {
        let n = self.paths.len();
        if n == 0 || self.fees.len() != n || self.amounts.len() != n || self.min_amounts.len() != n {
            return Err(SwapError::InvalidArrayLength);
        }
        let deadline = self.deadline;
        Ok(self
            .paths
            .into_iter()
            .zip(self.fees)
            .zip(self.amounts.into_iter().zip(self.min_amounts))
            .map(|((path, fees), (amount_in, min_amount_out))| SwapRequest {
                path,
                fees,
                amount_in,
                min_amount_out,
                deadline,
            })
            .collect())
    }
}

/// What happened (or would happen) on one hop
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HopTrace {
    #[serde(serialize_with = "serialize_address")]
    pub pool: Address,
    #[serde(serialize_with = "serialize_address")]
    pub token_in: Address,
    #[serde(serialize_with = "serialize_address")]
    pub token_out: Address,
    #[serde(serialize_with = "serialize_amount")]
    pub reserve_in: Amount,
    #[serde(serialize_with = "serialize_amount")]
    pub reserve_out: Amount,
    #[serde(serialize_with = "serialize_amount")]
    pub amount_in: Amount,
    /// Amount carried into the next hop: the lesser of what the pool
    /// reported and what actually arrived
    #[serde(serialize_with = "serialize_amount")]
    pub amount_out: Amount,
    /// Constant-product quote from the snapshot
    #[serde(serialize_with = "serialize_amount")]
    pub quoted_out: Amount,
    /// Return value of the pool's swap call
    #[serde(serialize_with = "serialize_amount")]
    pub reported_out: Amount,
    /// Balance increase observed at the router
    #[serde(serialize_with = "serialize_amount")]
    pub measured_out: Amount,
    pub fee_bps: u32,
    pub price_impact: u64,
}

impl HopTrace {
    /// Pool delivered less than it claimed
    pub fn is_shortchanged(&self) -> bool {
        self.measured_out < self.reported_out
    }
}

/// Result of a completed walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOutcome {
    pub amount_in: Amount,
    pub amount_out: Amount,
    /// Sum of per-hop impacts, fraction of `PRECISION`
    pub price_impact: u64,
    pub hops: Vec<HopTrace>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiSwapOutcome {
    pub outcomes: Vec<SwapOutcome>,
    pub total_in: Amount,
    pub total_out: Amount,
}

/// Read-only evaluation of a path for one input amount
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMetrics {
    pub amount_in: Amount,
    pub expected_output: Amount,
    pub price_impact: u64,
    /// `expected_output / amount_in` at `PRECISION` scale; above
    /// `PRECISION` means the cycle returns more than it takes
    pub optimality_score: u64,
    pub hops: Vec<HopTrace>,
}

impl PathMetrics {
    pub fn from_outcome(outcome: SwapOutcome) -> Self {
        Self {
            amount_in: outcome.amount_in,
            expected_output: outcome.amount_out,
            price_impact: outcome.price_impact,
            optimality_score: optimality_score(outcome.amount_in, outcome.amount_out),
            hops: outcome.hops,
        }
    }

    pub fn is_profitable(&self) -> bool {
        self.optimality_score > PRECISION
    }
}

/// `amount_out * PRECISION / amount_in`, saturating at `u64::MAX`
pub fn optimality_score(amount_in: Amount, amount_out: Amount) -> u64 {
    if amount_in.is_zero() {
        return 0;
    }
    let scaled = amount_out.full_mul(U256::from(PRECISION)) / U512::from(amount_in);
    if scaled > U512::from(u64::MAX) {
        u64::MAX
    } else {
        scaled.low_u64()
    }
}

/// Minimum acceptable output for `expected` under a slippage tolerance
/// given as a fraction of `PRECISION` (`MAX_SLIPPAGE` is 1%)
pub fn min_amount_out(expected: Amount, slippage: u64) -> Result<Amount, SwapError> {
    if slippage > PRECISION {
        return Err(SwapError::InvalidAmount);
    }
    let scaled = expected.full_mul(U256::from(PRECISION - slippage)) / U512::from(PRECISION);
    U256::try_from(scaled).map_err(|_| SwapError::MathOverflow)
}
