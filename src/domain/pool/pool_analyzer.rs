//! Pool analysis: reserve inspection, price impact and trade validation

use primitive_types::{U256, U512};
use tracing::debug;

use super::PoolSnapshot;
use crate::domain::dex::PoolService;
use crate::domain::math::geometric_mean;
use crate::shared::errors::SwapError;
use crate::shared::types::{Address, Amount, BPS_DENOMINATOR, PRECISION};

/// Analyzes pools for liquidity depth and price impact
pub struct PoolAnalyzer;

impl PoolAnalyzer {
    /// Resolve the pool for a hop through the service's pair lookup
    pub fn resolve_pool<P: PoolService + ?Sized>(
        pools: &P,
        token_in: &Address,
        token_out: &Address,
    ) -> Result<Address, SwapError> {
        pools
            .get_pair(token_in, token_out)
            .ok_or(SwapError::PairNotFound)
    }

    /// Fresh read of one pool oriented from `token_in` to `token_out`
    pub fn snapshot<P: PoolService + ?Sized>(
        pools: &P,
        pool: &Address,
        token_in: &Address,
        token_out: &Address,
    ) -> Result<PoolSnapshot, SwapError> {
        let (token0, token1) = pools.get_token_order(pool)?;
        let (reserve0, reserve1) = pools.get_reserves(pool)?;
        let snapshot = Self::orient(*pool, (token0, token1), (reserve0, reserve1), token_in, token_out)?;
        debug!(
            "Snapshot {:?}: reserve_in={} reserve_out={} liquidity={}",
            pool, snapshot.reserve_in, snapshot.reserve_out, snapshot.liquidity
        );
        Ok(snapshot)
    }

    /// Order raw reserves into `(reserve_in, reserve_out)` for a hop
    pub fn orient(
        pool: Address,
        tokens: (Address, Address),
        reserves: (Amount, Amount),
        token_in: &Address,
        token_out: &Address,
    ) -> Result<PoolSnapshot, SwapError> {
        let (token0, token1) = tokens;
        let (reserve0, reserve1) = reserves;
        let (reserve_in, reserve_out, token_in_is_token0) =
            if *token_in == token0 && *token_out == token1 {
                (reserve0, reserve1, true)
            } else if *token_in == token1 && *token_out == token0 {
                (reserve1, reserve0, false)
            } else {
                return Err(SwapError::PairNotFound);
            };

        Ok(PoolSnapshot {
            pool,
            token_in: *token_in,
            token_out: *token_out,
            reserve_in,
            reserve_out,
            liquidity: geometric_mean(reserve_in, reserve_out),
            token_in_is_token0,
        })
    }

    /// Constant-product output for `amount_in` after a `fee_bps` fee
    pub fn amount_out(
        amount_in: Amount,
        reserve_in: Amount,
        reserve_out: Amount,
        fee_bps: u32,
    ) -> Result<Amount, SwapError> {
        if fee_bps > BPS_DENOMINATOR {
            return Err(SwapError::InvalidFee(fee_bps));
        }
        if amount_in.is_zero() {
            return Err(SwapError::InvalidAmount);
        }
        if reserve_in.is_zero() || reserve_out.is_zero() {
            return Err(SwapError::InsufficientLiquidity);
        }

        let amount_in_with_fee = amount_in.full_mul(U256::from(BPS_DENOMINATOR - fee_bps));
        let numerator = amount_in_with_fee
            .checked_mul(U512::from(reserve_out))
            .ok_or(SwapError::MathOverflow)?;
        let denominator = U512::from(reserve_in)
            .checked_mul(U512::from(BPS_DENOMINATOR))
            .and_then(|scaled| scaled.checked_add(amount_in_with_fee))
            .ok_or(SwapError::MathOverflow)?;

        // Output is strictly below reserve_out, so it always narrows
        U256::try_from(numerator / denominator).map_err(|_| SwapError::MathOverflow)
    }

    /// Relative price displacement at `PRECISION` scale using the
    /// third-order expansion `λ + λ²/2 + λ³/6`, `λ = amount_in / reserve_in`.
    ///
    /// Overestimates for large λ; saturates at `u64::MAX`.
    pub fn price_impact(reserve_in: Amount, _reserve_out: Amount, amount_in: Amount) -> Result<u64, SwapError> {
        if amount_in.is_zero() {
            return Ok(0);
        }
        if reserve_in.is_zero() {
            return Err(SwapError::InsufficientLiquidity);
        }

        let precision = U512::from(PRECISION);
        let lambda = amount_in.full_mul(U256::from(PRECISION)) / U512::from(reserve_in);
        // Anything past u64 saturates anyway; keeps the cube inside 512 bits
        if lambda > U512::from(u64::MAX) {
            return Ok(u64::MAX);
        }

        let lambda_sq = lambda * lambda;
        let second = lambda_sq / (precision * 2);
        let third = lambda_sq * lambda / (precision * precision * 6);
        let impact = lambda + second + third;

        Ok(if impact > U512::from(u64::MAX) {
            u64::MAX
        } else {
            impact.low_u64()
        })
    }

    /// Check a proposed hop against liquidity and size limits.
    ///
    /// The 50%-of-reserve cap holds regardless of configured risk limits.
    pub fn validate(
        reserve_in: Amount,
        reserve_out: Amount,
        amount_in: Amount,
        amount_out: Amount,
        min_liquidity: Amount,
    ) -> Result<(), SwapError> {
        if amount_in.is_zero() || amount_out.is_zero() {
            return Err(SwapError::InvalidAmount);
        }
        if geometric_mean(reserve_in, reserve_out) < min_liquidity {
            return Err(SwapError::InsufficientLiquidity);
        }
        if amount_in > reserve_in / 2 {
            return Err(SwapError::ExcessiveTradeSize);
        }
        Ok(())
    }
}
