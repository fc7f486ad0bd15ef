//! Swap orchestrator - the router's public operations

use tracing::{info, warn};

use super::{
    EventLog, HopTrace, MultiSwapOutcome, MultiSwapRequest, PathMetrics, RouterEvent,
    SwapExecutor, SwapOutcome, SwapRequest, SwapValidator,
};
use crate::domain::dex::PoolService;
use crate::domain::protection::{LockState, OperationId, SecurityState};
use crate::shared::errors::SwapError;
use crate::shared::types::{
    Address, Amount, CallContext, MevConfig, RiskParameters, DEFAULT_HOP_FEE_BPS,
};

/// Deployment-time identity and limits of a router
#[derive(Debug, Clone)]
pub struct RouterSetup {
    pub base_asset: Address,
    pub owner: Address,
    /// Address holding in-flight balances between hops
    pub router: Address,
    pub risk: RiskParameters,
    pub mev: MevConfig,
}

/// Validates, guards and executes cyclic swaps against a pool service.
///
/// Every mutating operation is all-or-nothing: on any error the pool
/// service is rolled back to a checkpoint, protection records touched by
/// the call are restored and its events are discarded.
pub struct SwapOrchestrator<P: PoolService> {
    base_asset: Address,
    router: Address,
    pools: P,
    security: SecurityState,
    risk: RiskParameters,
    events: EventLog,
}

impl<P: PoolService> SwapOrchestrator<P> {
    pub fn new(setup: RouterSetup, pools: P) -> Result<Self, SwapError> {
        if setup.base_asset.is_zero() || setup.owner.is_zero() || setup.router.is_zero() {
            return Err(SwapError::InvalidAddress);
        }
        setup.risk.validate()?;

        info!(
            "Router {:?} ready: base asset {:?}, owner {:?}",
            setup.router, setup.base_asset, setup.owner
        );
        Ok(Self {
            base_asset: setup.base_asset,
            router: setup.router,
            pools,
            security: SecurityState::new(setup.owner, setup.mev),
            risk: setup.risk,
            events: EventLog::new(),
        })
    }

    // ---- swaps ----

    pub fn execute_swap(&mut self, ctx: &CallContext, request: SwapRequest) -> Result<SwapOutcome, SwapError> {
        let hop_pools = self.prepare(&request, ctx.timestamp).map_err(|e| rejected("execute_swap", e))?;
        self.run_guarded(ctx, OperationId::ExecuteSwap, |router| {
            router.walk(ctx, &request, &hop_pools)
        })
    }

    /// Independent walks under one guard; the combined output must exceed
    /// the combined input
    pub fn execute_multi_swap(
        &mut self,
        ctx: &CallContext,
        request: MultiSwapRequest,
    ) -> Result<MultiSwapOutcome, SwapError> {
        let prepared = request
            .into_requests()
            .and_then(|requests| self.prepare_all(requests, ctx.timestamp))
            .map_err(|e| rejected("execute_multi_swap", e))?;

        self.run_guarded(ctx, OperationId::ExecuteMultiSwap, |router| {
            let mut outcomes = Vec::with_capacity(prepared.len());
            let mut total_in = Amount::zero();
            let mut total_out = Amount::zero();
            for (request, hop_pools) in &prepared {
                let outcome = router.walk(ctx, request, hop_pools)?;
                total_in = total_in.checked_add(outcome.amount_in).ok_or(SwapError::MathOverflow)?;
                total_out = total_out.checked_add(outcome.amount_out).ok_or(SwapError::MathOverflow)?;
                outcomes.push(outcome);
            }
            if total_out <= total_in {
                return Err(SwapError::UnprofitableExecution { total_in, total_out });
            }
            Ok(MultiSwapOutcome {
                outcomes,
                total_in,
                total_out,
            })
        })
    }

    /// Up to `MAX_BATCH_SIZE` swaps applied together or not at all
    pub fn execute_batch_swaps(
        &mut self,
        ctx: &CallContext,
        swaps: Vec<SwapRequest>,
    ) -> Result<Vec<SwapOutcome>, SwapError> {
        let prepared = self
            .validator()
            .validate_batch_size(swaps.len())
            .and_then(|_| self.prepare_all(swaps, ctx.timestamp))
            .map_err(|e| rejected("execute_batch_swaps", e))?;

        self.run_guarded(ctx, OperationId::ExecuteBatchSwaps, |router| {
            prepared
                .iter()
                .map(|(request, hop_pools)| router.walk(ctx, request, hop_pools))
                .collect()
        })
    }

    // ---- read-only evaluation ----

    /// Evaluate each candidate input along `path` at the standard hop fee
    /// and return the metrics of the best-scoring one. Candidates that
    /// fail are skipped; if all fail, the first error is returned.
    pub fn get_optimal_path_metrics(&self, path: &[Address], amounts: &[Amount]) -> Result<PathMetrics, SwapError> {
        let validator = self.validator();
        validator.validate_path(path)?;
        if amounts.is_empty() {
            return Err(SwapError::InvalidArrayLength);
        }
        let fees = vec![DEFAULT_HOP_FEE_BPS; path.len() - 1];
        let hop_pools = validator.resolve_pools(&self.pools, path, &self.security)?;

        let mut best: Option<PathMetrics> = None;
        let mut first_error: Option<SwapError> = None;
        for amount in amounts {
            match self.simulate_prepared(path, &fees, *amount, &hop_pools) {
                Ok(metrics) => {
                    if best
                        .as_ref()
                        .map_or(true, |current| metrics.optimality_score > current.optimality_score)
                    {
                        best = Some(metrics);
                    }
                }
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match (best, first_error) {
            (Some(metrics), _) => Ok(metrics),
            (None, Some(e)) => Err(e),
            (None, None) => Err(SwapError::InvalidArrayLength),
        }
    }

    /// Fee-aware evaluation of a single input amount
    pub fn simulate_path(&self, path: &[Address], fees: &[u32], amount_in: Amount) -> Result<PathMetrics, SwapError> {
        let validator = self.validator();
        validator.validate_path(path)?;
        validator.validate_fees(path, fees)?;
        let hop_pools = validator.resolve_pools(&self.pools, path, &self.security)?;
        self.simulate_prepared(path, fees, amount_in, &hop_pools)
    }

    /// Per-hop trace of what `simulate_path` would do
    pub fn inspect_swap(&self, path: &[Address], fees: &[u32], amount_in: Amount) -> Result<Vec<HopTrace>, SwapError> {
        self.simulate_path(path, fees, amount_in).map(|metrics| metrics.hops)
    }

    // ---- owner-gated configuration ----

    pub fn update_risk_params(&mut self, caller: &Address, params: RiskParameters) -> Result<(), SwapError> {
        self.security.check_owner(caller)?;
        params.validate()?;
        self.risk = params.clone();
        self.events.emit(RouterEvent::RiskParamsUpdated { params });
        Ok(())
    }

    pub fn configure_mev_protection(&mut self, caller: &Address, config: MevConfig) -> Result<(), SwapError> {
        self.security.configure_mev(caller, config.clone())?;
        self.events.emit(RouterEvent::MevProtectionUpdated { config });
        Ok(())
    }

    pub fn set_pool_blacklist(&mut self, caller: &Address, pool: Address, blacklisted: bool) -> Result<(), SwapError> {
        self.security.set_pool_blacklist(caller, pool, blacklisted)?;
        self.events.emit(RouterEvent::PoolBlacklistUpdated { pool, blacklisted });
        Ok(())
    }

    pub fn pause(&mut self, caller: &Address) -> Result<(), SwapError> {
        self.security.pause(caller)?;
        self.events.emit(RouterEvent::PauseStateChanged { paused: true });
        Ok(())
    }

    pub fn unpause(&mut self, caller: &Address) -> Result<(), SwapError> {
        self.security.unpause(caller)?;
        self.events.emit(RouterEvent::PauseStateChanged { paused: false });
        Ok(())
    }

    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> Result<(), SwapError> {
        let previous_owner = self.security.transfer_ownership(caller, new_owner)?;
        self.events.emit(RouterEvent::OwnershipTransferred {
            previous_owner,
            new_owner,
        });
        Ok(())
    }

    pub fn set_operator(&mut self, caller: &Address, operator: Address, enabled: bool) -> Result<(), SwapError> {
        self.security.set_operator(caller, operator, enabled)?;
        self.events.emit(RouterEvent::OperatorUpdated { operator, enabled });
        Ok(())
    }

    pub fn set_operation_cooldown(&mut self, caller: &Address, operation: OperationId, seconds: u64) -> Result<(), SwapError> {
        self.security.set_operation_cooldown(caller, operation, seconds)?;
        self.events.emit(RouterEvent::CooldownUpdated { operation, seconds });
        Ok(())
    }

    /// Move the router's own stranded balance out; only while paused
    pub fn emergency_recovery(&mut self, caller: &Address, token: Address, to: Address, amount: Amount) -> Result<(), SwapError> {
        self.security.check_owner(caller)?;
        if !self.security.is_paused() {
            return Err(SwapError::SystemNotPaused);
        }
        if token.is_zero() || to.is_zero() {
            return Err(SwapError::InvalidAddress);
        }
        if amount.is_zero() {
            return Err(SwapError::InvalidAmount);
        }
        let available = self.pools.balance_of(&token, &self.router);
        if available < amount {
            return Err(SwapError::TransferFailed(format!(
                "router holds {} of {:?}, {} requested",
                available, token, amount
            )));
        }

        self.pools.transfer(&token, &self.router, &to, amount)?;
        warn!("Emergency recovery of {} {:?} to {:?}", amount, token, to);
        self.events.emit(RouterEvent::EmergencyRecovery { token, to, amount });
        Ok(())
    }

    // ---- accessors ----

    pub fn base_asset(&self) -> Address {
        self.base_asset
    }

    pub fn router_address(&self) -> Address {
        self.router
    }

    pub fn owner(&self) -> Address {
        self.security.owner()
    }

    pub fn risk_parameters(&self) -> &RiskParameters {
        &self.risk
    }

    pub fn mev_config(&self) -> &MevConfig {
        self.security.mev_config()
    }

    pub fn is_paused(&self) -> bool {
        self.security.is_paused()
    }

    pub fn is_pool_blacklisted(&self, pool: &Address) -> bool {
        self.security.is_pool_blacklisted(pool)
    }

    pub fn is_operator(&self, account: &Address) -> bool {
        self.security.is_operator(account)
    }

    pub fn lock_state(&self) -> LockState {
        self.security.lock_state()
    }

    pub fn security(&self) -> &SecurityState {
        &self.security
    }

    pub fn pools(&self) -> &P {
        &self.pools
    }

    /// Direct pool access for hosts seeding or inspecting state
    pub fn pools_mut(&mut self) -> &mut P {
        &mut self.pools
    }

    pub fn events(&self) -> &[RouterEvent] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<RouterEvent> {
        self.events.drain()
    }

    // ---- internals ----

    fn validator(&self) -> SwapValidator {
        SwapValidator::new(self.base_asset)
    }

    /// Request validation and pool resolution; touches nothing
    fn prepare(&self, request: &SwapRequest, now: u64) -> Result<Vec<Address>, SwapError> {
        let validator = self.validator();
        validator.validate_request(request, &self.risk, now)?;
        validator.resolve_pools(&self.pools, &request.path, &self.security)
    }

    fn prepare_all(
        &self,
        requests: Vec<SwapRequest>,
        now: u64,
    ) -> Result<Vec<(SwapRequest, Vec<Address>)>, SwapError> {
        requests
            .into_iter()
            .map(|request| -> Result<(SwapRequest, Vec<Address>), SwapError> {
                let hop_pools = self.prepare(&request, now)?;
                Ok((request, hop_pools))
            })
            .collect()
    }

    fn walk(&mut self, ctx: &CallContext, request: &SwapRequest, hop_pools: &[Address]) -> Result<SwapOutcome, SwapError> {
        let executor = SwapExecutor::new(self.router, &self.risk);
        let outcome = executor.execute(&mut self.pools, &ctx.caller, request, hop_pools)?;
        self.events.emit(RouterEvent::SwapExecuted {
            initiator: ctx.caller,
            path_length: request.path.len(),
            amount_in: outcome.amount_in,
            amount_out: outcome.amount_out,
            price_impact: outcome.price_impact,
        });
        Ok(outcome)
    }

    fn simulate_prepared(
        &self,
        path: &[Address],
        fees: &[u32],
        amount_in: Amount,
        hop_pools: &[Address],
    ) -> Result<PathMetrics, SwapError> {
        if amount_in.is_zero() {
            return Err(SwapError::InvalidAmount);
        }
        if amount_in > self.risk.max_trade_volume {
            return Err(SwapError::ExcessiveTradeSize);
        }
        let executor = SwapExecutor::new(self.router, &self.risk);
        let outcome = executor.simulate(&self.pools, path, fees, amount_in, hop_pools)?;
        Ok(PathMetrics::from_outcome(outcome))
    }

    /// Pause check, guard bracket and MEV checks around `work`, with
    /// rollback of pools, protection records and events on failure
    fn run_guarded<T, F>(&mut self, ctx: &CallContext, operation: OperationId, work: F) -> Result<T, SwapError>
    where
        F: FnOnce(&mut Self) -> Result<T, SwapError>,
    {
        self.security
            .check_not_paused()
            .map_err(|e| rejected(&operation.to_string(), e))?;

        let journal = self.security.journal(ctx.caller, operation);
        let mark = self.events.len();

        let guard = self
            .security
            .enter_guard(operation, ctx.timestamp)
            .map_err(|e| rejected(&operation.to_string(), e))?;
        let checkpoint = self.pools.checkpoint();
        let result = self
            .security
            .apply_mev_checks(ctx)
            .and_then(|_| work(self));
        guard.exit();

        match &result {
            Ok(_) => self.pools.commit(checkpoint),
            Err(e) => {
                self.pools.rollback(checkpoint);
                self.security.restore(journal);
                self.events.truncate(mark);
                warn!("{} by {:?} aborted and rolled back: {}", operation, ctx.caller, e);
            }
        }
        result
    }
}

fn rejected(operation: &str, error: SwapError) -> SwapError {
    warn!("{} rejected: {}", operation, error);
    error
}
