//! Hop-by-hop path walks, live and simulated

use std::collections::HashMap;

use primitive_types::{U256, U512};
use tracing::{debug, info, warn};

use super::{HopTrace, SwapOutcome, SwapRequest};
use crate::domain::dex::PoolService;
use crate::domain::pool::{PoolAnalyzer, PoolSnapshot};
use crate::shared::errors::SwapError;
use crate::shared::types::{Address, Amount, RiskParameters, BPS_DENOMINATOR};

/// Progress of one walk; owned by that walk alone
#[derive(Debug)]
struct SwapState {
    current_asset: Address,
    current_amount: Amount,
    cumulative_impact: u64,
    hops: Vec<HopTrace>,
}

impl SwapState {
    fn start(asset: Address, amount: Amount, hop_count: usize) -> Self {
        Self {
            current_asset: asset,
            current_amount: amount,
            cumulative_impact: 0,
            hops: Vec::with_capacity(hop_count),
        }
    }

    fn advance(&mut self, trace: HopTrace) {
        self.current_asset = trace.token_out;
        self.current_amount = trace.amount_out;
        self.cumulative_impact = self.cumulative_impact.saturating_add(trace.price_impact);
        self.hops.push(trace);
    }

    fn finish(self, amount_in: Amount) -> SwapOutcome {
        SwapOutcome {
            amount_in,
            amount_out: self.current_amount,
            price_impact: self.cumulative_impact,
            hops: self.hops,
        }
    }
}

/// Walks a validated path through a pool service.
///
/// Pools must already be resolved and checked against the deny-list; the
/// executor only deals with reserves, amounts and token movements.
pub struct SwapExecutor<'a> {
    router: Address,
    risk: &'a RiskParameters,
}

impl<'a> SwapExecutor<'a> {
    pub fn new(router: Address, risk: &'a RiskParameters) -> Self {
        Self { router, risk }
    }

    /// Pull `amount_in` from the caller, swap through every hop, enforce
    /// minimum output and cumulative impact, and pay the caller.
    ///
    /// Effects are not undone on error; the caller owns the checkpoint.
    pub fn execute<P: PoolService + ?Sized>(
        &self,
        pools: &mut P,
        caller: &Address,
        request: &SwapRequest,
        hop_pools: &[Address],
    ) -> Result<SwapOutcome, SwapError> {
        let base = request.path[0];
        pools.transfer(&base, caller, &self.router, request.amount_in)?;

        let mut state = SwapState::start(base, request.amount_in, hop_pools.len());
        for (i, pool) in hop_pools.iter().enumerate() {
            let token_out = request.path[i + 1];
            let snapshot = PoolAnalyzer::snapshot(&*pools, pool, &state.current_asset, &token_out)?;
            let trace = self.quote_hop(&snapshot, state.current_amount, request.fees[i])?;
            let delivery = self.swap_hop(pools, &trace)?;
            state.advance(HopTrace {
                amount_out: delivery.reported.min(delivery.measured),
                reported_out: delivery.reported,
                measured_out: delivery.measured,
                ..trace
            });
        }

        let outcome = state.finish(request.amount_in);
        if outcome.amount_out < request.min_amount_out {
            return Err(SwapError::InsufficientOutput {
                amount_out: outcome.amount_out,
                min_amount_out: request.min_amount_out,
            });
        }
        if outcome.price_impact > self.risk.max_price_impact {
            return Err(SwapError::ExcessiveSlippage {
                impact: outcome.price_impact,
                limit: self.risk.max_price_impact,
            });
        }

        pools.transfer(&base, &self.router, caller, outcome.amount_out)?;
        info!(
            "Walk of {} hops: {} -> {} (impact {})",
            outcome.hops.len(),
            outcome.amount_in,
            outcome.amount_out,
            outcome.price_impact
        );
        Ok(outcome)
    }

    /// The same walk against a private copy of the touched reserves; the
    /// pool service is only read.
    pub fn simulate<P: PoolService + ?Sized>(
        &self,
        pools: &P,
        path: &[Address],
        fees: &[u32],
        amount_in: Amount,
        hop_pools: &[Address],
    ) -> Result<SwapOutcome, SwapError> {
        let mut overlay: HashMap<Address, (Amount, Amount)> = HashMap::new();
        let mut state = SwapState::start(path[0], amount_in, hop_pools.len());

        for (i, pool) in hop_pools.iter().enumerate() {
            let tokens = pools.get_token_order(pool)?;
            let reserves = match overlay.get(pool) {
                Some(reserves) => *reserves,
                None => pools.get_reserves(pool)?,
            };
            let snapshot = PoolAnalyzer::orient(*pool, tokens, reserves, &state.current_asset, &path[i + 1])?;
            let trace = self.quote_hop(&snapshot, state.current_amount, fees[i])?;

            let reserve_in = snapshot
                .reserve_in
                .checked_add(trace.amount_in)
                .ok_or(SwapError::MathOverflow)?;
            let reserve_out = snapshot.reserve_out - trace.amount_out;
            let updated = if snapshot.token_in_is_token0 {
                (reserve_in, reserve_out)
            } else {
                (reserve_out, reserve_in)
            };
            overlay.insert(*pool, updated);

            state.advance(trace);
        }

        Ok(state.finish(amount_in))
    }

    /// Quote a hop from a fresh snapshot and check it against the risk
    /// parameters
    fn quote_hop(&self, snapshot: &PoolSnapshot, amount_in: Amount, fee_bps: u32) -> Result<HopTrace, SwapError> {
        let amount_out = PoolAnalyzer::amount_out(amount_in, snapshot.reserve_in, snapshot.reserve_out, fee_bps)?;
        PoolAnalyzer::validate(
            snapshot.reserve_in,
            snapshot.reserve_out,
            amount_in,
            amount_out,
            self.risk.min_pool_liquidity,
        )?;
        let price_impact = PoolAnalyzer::price_impact(snapshot.reserve_in, snapshot.reserve_out, amount_in)?;

        debug!(
            "Hop {:?} -> {:?}: in={} quote={} impact={}",
            snapshot.token_in, snapshot.token_out, amount_in, amount_out, price_impact
        );
        Ok(HopTrace {
            pool: snapshot.pool,
            token_in: snapshot.token_in,
            token_out: snapshot.token_out,
            reserve_in: snapshot.reserve_in,
            reserve_out: snapshot.reserve_out,
            amount_in,
            amount_out,
            quoted_out: amount_out,
            reported_out: amount_out,
            measured_out: amount_out,
            fee_bps,
            price_impact,
        })
    }

    /// Push the hop input to the pool, swap, and check what arrived
    /// against the quote less the sandwich tolerance
    fn swap_hop<P: PoolService + ?Sized>(&self, pools: &mut P, hop: &HopTrace) -> Result<Delivery, SwapError> {
        pools.transfer(&hop.token_in, &self.router, &hop.pool, hop.amount_in)?;

        let before = pools.balance_of(&hop.token_out, &self.router);
        let reported = pools.swap(&hop.pool, &hop.token_in, hop.amount_in, &self.router)?;
        let measured = pools.balance_of(&hop.token_out, &self.router).saturating_sub(before);
        let delivered = reported.min(measured);
        if measured < reported {
            warn!(
                "Pool {:?} reported {} but router received {}",
                hop.pool, reported, measured
            );
        }

        let floor = sandwich_floor(hop.quoted_out, self.risk.sandwich_protection_bips);
        if delivered < floor {
            return Err(SwapError::TransferFailed(format!(
                "pool {:?} delivered {} of {}, below floor {}",
                hop.pool, delivered, hop.quoted_out, floor
            )));
        }
        Ok(Delivery { reported, measured })
    }
}

/// Output of one live hop as the pool claimed it and as the ledger shows it
#[derive(Debug, Clone, Copy)]
struct Delivery {
    reported: Amount,
    measured: Amount,
}

/// `quote * (10000 - bips) / 10000`
fn sandwich_floor(quote: Amount, bips: u32) -> Amount {
    let tolerance = BPS_DENOMINATOR.saturating_sub(bips);
    let scaled = quote.full_mul(U256::from(tolerance)) / U512::from(BPS_DENOMINATOR);
    // tolerance <= denominator keeps the result at or below the quote
    U256::try_from(scaled).unwrap_or(quote)
}
