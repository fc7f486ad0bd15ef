//! Pool domain - reserve snapshots and hop analysis

mod pool_analyzer;

pub use pool_analyzer::PoolAnalyzer;

use serde::Serialize;

use crate::shared::types::{Address, Amount};

/// Reserves of one pool oriented along a hop, read fresh per hop
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    pub pool: Address,
    pub token_in: Address,
    pub token_out: Address,
    pub reserve_in: Amount,
    pub reserve_out: Amount,
    /// `floor(sqrt(reserve_in * reserve_out))`
    pub liquidity: Amount,
    pub token_in_is_token0: bool,
}
