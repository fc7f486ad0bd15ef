//! Application services and use cases

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

use crate::domain::dex::PoolService;
use crate::domain::execution::{
    HopTrace, MultiSwapOutcome, MultiSwapRequest, PathMetrics, RouterEvent, RouterSetup,
    SwapOrchestrator, SwapOutcome, SwapRequest,
};
use crate::domain::math::split_amount;
use crate::infrastructure::InMemoryPoolService;
use crate::shared::config::EngineConfig;
use crate::shared::errors::AppError;
use crate::shared::types::{Address, Amount, CallContext, MevConfig, RiskParameters};
use crate::shared::utils::serde_helpers::serialize_address;

/// Snapshot of router configuration for display
#[derive(Debug, Clone, Serialize)]
pub struct RouterStatus {
    #[serde(serialize_with = "serialize_address")]
    pub base_asset: Address,
    #[serde(serialize_with = "serialize_address")]
    pub owner: Address,
    #[serde(serialize_with = "serialize_address")]
    pub router: Address,
    pub risk: RiskParameters,
    pub mev: MevConfig,
    pub paused: bool,
}

/// Host of one orchestrator. Every call takes the mutex for its whole
/// duration, so operations are applied one at a time in arrival order.
pub struct RouterService<P: PoolService> {
    orchestrator: Arc<Mutex<SwapOrchestrator<P>>>,
    slot_duration_ms: u64,
}

impl<P: PoolService> Clone for RouterService<P> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
            slot_duration_ms: self.slot_duration_ms,
        }
    }
}

impl RouterService<InMemoryPoolService> {
    /// Build a router over in-memory pools seeded from the configuration
    pub fn from_config(config: &EngineConfig) -> Result<Self, AppError> {
        config.validate()?;
        let pools = InMemoryPoolService::from_config(config)?;
        let setup = RouterSetup {
            base_asset: config.engine.base_asset,
            owner: config.engine.owner,
            router: config.engine.router,
            risk: config.risk_parameters(),
            mev: config.mev.clone(),
        };
        let mut orchestrator = SwapOrchestrator::new(setup, pools)?;
        for cooldown in &config.cooldowns {
            orchestrator.set_operation_cooldown(&config.engine.owner, cooldown.operation, cooldown.seconds)?;
        }
        // Configuration events are not part of any caller's history
        orchestrator.take_events();

        info!("🚀 Router service ready with {} pools", config.pools.len());
        Ok(Self::new(orchestrator, config.engine.slot_duration_ms))
    }
}

impl<P: PoolService> RouterService<P> {
    pub fn new(orchestrator: SwapOrchestrator<P>, slot_duration_ms: u64) -> Self {
        Self {
            orchestrator: Arc::new(Mutex::new(orchestrator)),
            slot_duration_ms: slot_duration_ms.max(1),
        }
    }

    /// Ledger context for `caller` from the wall clock
    pub fn context(&self, caller: Address) -> CallContext {
        let now = Utc::now();
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
        let seconds = u64::try_from(now.timestamp()).unwrap_or_default();
        CallContext::new(caller, millis / self.slot_duration_ms, seconds)
    }

    pub async fn execute_swap(&self, caller: Address, request: SwapRequest) -> Result<SwapOutcome, AppError> {
        let ctx = self.context(caller);
        self.execute_swap_at(&ctx, request).await
    }

    pub async fn execute_swap_at(&self, ctx: &CallContext, request: SwapRequest) -> Result<SwapOutcome, AppError> {
        let mut orchestrator = self.orchestrator.lock().await;
        Ok(orchestrator.execute_swap(ctx, request)?)
    }

    pub async fn execute_multi_swap(&self, caller: Address, request: MultiSwapRequest) -> Result<MultiSwapOutcome, AppError> {
        let ctx = self.context(caller);
        let mut orchestrator = self.orchestrator.lock().await;
        Ok(orchestrator.execute_multi_swap(&ctx, request)?)
    }

    pub async fn execute_batch_swaps(&self, caller: Address, swaps: Vec<SwapRequest>) -> Result<Vec<SwapOutcome>, AppError> {
        let ctx = self.context(caller);
        self.execute_batch_swaps_at(&ctx, swaps).await
    }

    pub async fn execute_batch_swaps_at(&self, ctx: &CallContext, swaps: Vec<SwapRequest>) -> Result<Vec<SwapOutcome>, AppError> {
        let mut orchestrator = self.orchestrator.lock().await;
        Ok(orchestrator.execute_batch_swaps(ctx, swaps)?)
    }

    pub async fn get_optimal_path_metrics(&self, path: &[Address], amounts: &[Amount]) -> Result<PathMetrics, AppError> {
        let orchestrator = self.orchestrator.lock().await;
        Ok(orchestrator.get_optimal_path_metrics(path, amounts)?)
    }

    pub async fn simulate_path(&self, path: &[Address], fees: &[u32], amount_in: Amount) -> Result<PathMetrics, AppError> {
        let orchestrator = self.orchestrator.lock().await;
        Ok(orchestrator.simulate_path(path, fees, amount_in)?)
    }

    pub async fn inspect_swap(&self, path: &[Address], fees: &[u32], amount_in: Amount) -> Result<Vec<HopTrace>, AppError> {
        let orchestrator = self.orchestrator.lock().await;
        Ok(orchestrator.inspect_swap(path, fees, amount_in)?)
    }

    /// Golden-ratio plan for spending `total` over `legs` legs
    pub fn split_amount(&self, total: Amount, legs: usize) -> Result<Vec<Amount>, AppError> {
        Ok(split_amount(total, legs)?)
    }

    pub async fn status(&self) -> RouterStatus {
        let orchestrator = self.orchestrator.lock().await;
        RouterStatus {
            base_asset: orchestrator.base_asset(),
            owner: orchestrator.owner(),
            router: orchestrator.router_address(),
            risk: orchestrator.risk_parameters().clone(),
            mev: orchestrator.mev_config().clone(),
            paused: orchestrator.is_paused(),
        }
    }

    /// Run `f` with exclusive access, for owner operations and inspection
    pub async fn with_orchestrator<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut SwapOrchestrator<P>) -> R,
    {
        let mut orchestrator = self.orchestrator.lock().await;
        f(&mut orchestrator)
    }

    pub async fn take_events(&self) -> Vec<RouterEvent> {
        self.orchestrator.lock().await.take_events()
    }
}
