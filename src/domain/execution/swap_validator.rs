//! Swap request validation

use tracing::debug;

use super::SwapRequest;
use crate::domain::dex::PoolService;
use crate::domain::pool::PoolAnalyzer;
use crate::domain::protection::SecurityState;
use crate::shared::errors::SwapError;
use crate::shared::types::{
    Address, RiskParameters, BPS_DENOMINATOR, MAX_BATCH_SIZE, MAX_PATH_LENGTH, MIN_PATH_LENGTH,
};

/// Validates swap requests before any pool is touched
pub struct SwapValidator {
    base_asset: Address,
}

impl SwapValidator {
    pub fn new(base_asset: Address) -> Self {
        Self { base_asset }
    }

    /// Structural checks on a path: cyclic through the base asset, no
    /// self-hops, at most `MAX_PATH_LENGTH` assets, non-zero addresses.
    pub fn validate_path(&self, path: &[Address]) -> Result<(), SwapError> {
        if path.len() < MIN_PATH_LENGTH {
            return Err(SwapError::InvalidPath);
        }
        let (first, last) = (path[0], path[path.len() - 1]);
        if first != last || first != self.base_asset {
            return Err(SwapError::InvalidPath);
        }
        if path.windows(2).any(|hop| hop[0] == hop[1]) {
            return Err(SwapError::InvalidPath);
        }
        if path.len() > MAX_PATH_LENGTH {
            return Err(SwapError::PathTooLong(path.len()));
        }
        if path.iter().any(|asset| asset.is_zero()) {
            return Err(SwapError::InvalidAddress);
        }
        Ok(())
    }

    pub fn validate_fees(&self, path: &[Address], fees: &[u32]) -> Result<(), SwapError> {
        if fees.len() + 1 != path.len() {
            return Err(SwapError::InvalidArrayLength);
        }
        if let Some(fee) = fees.iter().find(|fee| **fee > BPS_DENOMINATOR) {
            return Err(SwapError::InvalidFee(*fee));
        }
        Ok(())
    }

    /// Every check that needs nothing but the request itself and the clock
    pub fn validate_request(&self, request: &SwapRequest, risk: &RiskParameters, now: u64) -> Result<(), SwapError> {
        self.validate_path(&request.path)?;
        if now > request.deadline {
            return Err(SwapError::DeadlineExpired);
        }
        self.validate_fees(&request.path, &request.fees)?;
        if request.amount_in.is_zero() || request.min_amount_out.is_zero() {
            return Err(SwapError::InvalidAmount);
        }
        if request.amount_in > risk.max_trade_volume {
            return Err(SwapError::ExcessiveTradeSize);
        }
        Ok(())
    }

    pub fn validate_batch_size(&self, len: usize) -> Result<(), SwapError> {
        if len == 0 || len > MAX_BATCH_SIZE {
            return Err(SwapError::InvalidArrayLength);
        }
        Ok(())
    }

    /// Resolve the pool of every hop and reject deny-listed ones
    pub fn resolve_pools<P: PoolService + ?Sized>(
        &self,
        pools: &P,
        path: &[Address],
        security: &SecurityState,
    ) -> Result<Vec<Address>, SwapError> {
        path.windows(2)
            .map(|hop| -> Result<Address, SwapError> {
                let pool = PoolAnalyzer::resolve_pool(pools, &hop[0], &hop[1])?;
                security.check_pool_allowed(&pool)?;
                debug!("Hop {:?} -> {:?} via pool {:?}", hop[0], hop[1], pool);
                Ok(pool)
            })
            .collect()
    }
}
