//! Per-caller flash-loan and rate-limit heuristics

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::shared::errors::SwapError;
use crate::shared::types::{Address, CallContext, MevConfig};

/// Activity of one caller; created on first action, never removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProtectionRecord {
    pub last_slot: u64,
    pub tx_count_in_slot: u32,
    pub last_action_ts: u64,
}

/// Detects same-slot bursts and rapid repeats by one caller.
///
/// Records are updated on every guarded call; limits are only enforced
/// while the configuration is enabled.
#[derive(Debug, Clone, Default)]
pub struct MevProtection {
    config: MevConfig,
    records: HashMap<Address, ProtectionRecord>,
}

impl MevProtection {
    pub fn new(config: MevConfig) -> Self {
        Self {
            config,
            records: HashMap::new(),
        }
    }

    pub fn config(&self) -> &MevConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: MevConfig) {
        self.config = config;
    }

    pub fn record(&self, caller: &Address) -> Option<&ProtectionRecord> {
        self.records.get(caller)
    }

    /// Put back a record captured before a failed operation
    pub fn restore_record(&mut self, caller: Address, record: Option<ProtectionRecord>) {
        match record {
            Some(record) => {
                self.records.insert(caller, record);
            }
            None => {
                self.records.remove(&caller);
            }
        }
    }

    /// Count the call against the caller's slot budget
    pub fn check_flash_loan(&mut self, ctx: &CallContext, max_tx_per_slot: u32) -> Result<(), SwapError> {
        let count = self.bump_slot_counter(ctx);
        if count > max_tx_per_slot {
            warn!(
                "Flash loan pattern from {:?}: {} calls in slot {}",
                ctx.caller, count, ctx.slot
            );
            return Err(SwapError::FlashLoanDetected);
        }
        Ok(())
    }

    fn bump_slot_counter(&mut self, ctx: &CallContext) -> u32 {
        let record = self.records.entry(ctx.caller).or_default();
        if record.tx_count_in_slot > 0 && record.last_slot == ctx.slot {
            record.tx_count_in_slot = record.tx_count_in_slot.saturating_add(1);
        } else {
            record.last_slot = ctx.slot;
            record.tx_count_in_slot = 1;
        }
        record.tx_count_in_slot
    }

    /// Reject a caller acting again within `min_delay` seconds
    pub fn check_rate_limit(&self, ctx: &CallContext, min_delay: u64) -> Result<(), SwapError> {
        if let Some(record) = self.records.get(&ctx.caller) {
            // A zero timestamp means the caller has not acted yet
            let elapsed = ctx.timestamp.saturating_sub(record.last_action_ts);
            if record.last_action_ts > 0 && elapsed < min_delay {
                warn!("Rate limit hit by {:?}: {}s since last action", ctx.caller, elapsed);
                return Err(SwapError::RateLimitExceeded);
            }
        }
        Ok(())
    }

    pub fn record_action(&mut self, ctx: &CallContext) {
        let record = self.records.entry(ctx.caller).or_default();
        record.last_action_ts = ctx.timestamp;
    }

    /// Flash-loan check, then rate limit, then stamp the action
    pub fn apply(&mut self, ctx: &CallContext) -> Result<(), SwapError> {
        let MevConfig {
            enabled,
            max_tx_per_block,
            min_tx_delay,
        } = self.config;

        if enabled {
            self.check_flash_loan(ctx, max_tx_per_block)?;
            self.check_rate_limit(ctx, min_tx_delay)?;
        } else {
            self.bump_slot_counter(ctx);
        }
        self.record_action(ctx);
        debug!("MEV record updated for {:?} at slot {}", ctx.caller, ctx.slot);
        Ok(())
    }
}
