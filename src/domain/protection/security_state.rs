//! Security state: ownership, circuit breaker, guard bracket and deny-list

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use super::{
    LockState, MevProtection, OperationId, ProtectionRecord, ReentrancyGuard, ReentrancyLock,
    RunState,
};
use crate::shared::errors::SwapError;
use crate::shared::types::{Address, CallContext, MevConfig};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Cooldown {
    period: u64,
    last_invocation: Option<u64>,
}

/// Protection state touched by one guarded call, captured up front so a
/// failed operation can be undone.
#[derive(Debug, Clone)]
pub struct ProtectionJournal {
    caller: Address,
    record: Option<ProtectionRecord>,
    operation: OperationId,
    last_invocation: Option<u64>,
}

/// Process-wide protection state owned by the orchestrator's host.
///
/// The reentrancy lock and the run state are independent: a paused system
/// can still be locked and vice versa.
#[derive(Debug)]
pub struct SecurityState {
    owner: Address,
    operators: HashSet<Address>,
    blacklisted_pools: HashSet<Address>,
    run_state: RunState,
    lock: ReentrancyLock,
    mev: MevProtection,
    cooldowns: HashMap<OperationId, Cooldown>,
}

impl SecurityState {
    pub fn new(owner: Address, mev_config: MevConfig) -> Self {
        Self {
            owner,
            operators: HashSet::new(),
            blacklisted_pools: HashSet::new(),
            run_state: RunState::Running,
            lock: ReentrancyLock::new(),
            mev: MevProtection::new(mev_config),
            cooldowns: HashMap::new(),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_operator(&self, account: &Address) -> bool {
        self.operators.contains(account)
    }

    pub fn is_paused(&self) -> bool {
        self.run_state == RunState::Paused
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn lock_state(&self) -> LockState {
        self.lock.state()
    }

    /// Handle to the lock, for callers that bracket work themselves
    pub fn lock(&self) -> &ReentrancyLock {
        &self.lock
    }

    pub fn mev_config(&self) -> &MevConfig {
        self.mev.config()
    }

    pub fn protection_record(&self, caller: &Address) -> Option<ProtectionRecord> {
        self.mev.record(caller).copied()
    }

    pub fn is_pool_blacklisted(&self, pool: &Address) -> bool {
        self.blacklisted_pools.contains(pool)
    }

    /// Configured cooldown in seconds, if any
    pub fn cooldown(&self, operation: OperationId) -> Option<u64> {
        self.cooldowns.get(&operation).map(|c| c.period)
    }

    // ---- checks ----

    pub fn check_owner(&self, caller: &Address) -> Result<(), SwapError> {
        if *caller != self.owner {
            warn!("Unauthorized owner call from {:?}", caller);
            return Err(SwapError::Unauthorized);
        }
        Ok(())
    }

    /// Strict membership; the owner is not an implicit operator
    pub fn check_operator(&self, caller: &Address) -> Result<(), SwapError> {
        if !self.operators.contains(caller) {
            warn!("Unauthorized operator call from {:?}", caller);
            return Err(SwapError::Unauthorized);
        }
        Ok(())
    }

    pub fn check_not_paused(&self) -> Result<(), SwapError> {
        if self.is_paused() {
            return Err(SwapError::SystemPaused);
        }
        Ok(())
    }

    pub fn check_pool_allowed(&self, pool: &Address) -> Result<(), SwapError> {
        if self.is_pool_blacklisted(pool) {
            return Err(SwapError::PoolBlacklisted(*pool));
        }
        Ok(())
    }

    // ---- guard bracket ----

    /// Lock, then enforce the operation's cooldown. The lock is released
    /// again if the cooldown rejects the call.
    pub fn enter_guard(&mut self, operation: OperationId, now: u64) -> Result<ReentrancyGuard, SwapError> {
        let guard = self.lock.enter()?;

        if let Some(cooldown) = self.cooldowns.get_mut(&operation) {
            if let Some(last) = cooldown.last_invocation {
                if now.saturating_sub(last) < cooldown.period {
                    warn!("{} still cooling down ({}s period)", operation, cooldown.period);
                    return Err(SwapError::CooldownActive);
                }
            }
            cooldown.last_invocation = Some(now);
        }

        Ok(guard)
    }

    /// Same-slot and rate-limit heuristics for the caller
    pub fn apply_mev_checks(&mut self, ctx: &CallContext) -> Result<(), SwapError> {
        self.mev.apply(ctx)
    }

    /// Snapshot what a guarded call by `caller` may change
    pub fn journal(&self, caller: Address, operation: OperationId) -> ProtectionJournal {
        ProtectionJournal {
            caller,
            record: self.mev.record(&caller).copied(),
            operation,
            last_invocation: self.cooldowns.get(&operation).and_then(|c| c.last_invocation),
        }
    }

    pub fn restore(&mut self, journal: ProtectionJournal) {
        self.mev.restore_record(journal.caller, journal.record);
        if let Some(cooldown) = self.cooldowns.get_mut(&journal.operation) {
            cooldown.last_invocation = journal.last_invocation;
        }
    }

    // ---- owner-gated mutators ----

    pub fn pause(&mut self, caller: &Address) -> Result<(), SwapError> {
        self.check_owner(caller)?;
        if self.is_paused() {
            return Err(SwapError::SystemPaused);
        }
        self.run_state = RunState::Paused;
        info!("System paused by {:?}", caller);
        Ok(())
    }

    pub fn unpause(&mut self, caller: &Address) -> Result<(), SwapError> {
        self.check_owner(caller)?;
        if !self.is_paused() {
            return Err(SwapError::SystemNotPaused);
        }
        self.run_state = RunState::Running;
        info!("System unpaused by {:?}", caller);
        Ok(())
    }

    /// Returns the previous owner
    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> Result<Address, SwapError> {
        self.check_owner(caller)?;
        if new_owner.is_zero() {
            return Err(SwapError::InvalidAddress);
        }
        let previous = std::mem::replace(&mut self.owner, new_owner);
        info!("Ownership transferred from {:?} to {:?}", previous, new_owner);
        Ok(previous)
    }

    pub fn set_operator(&mut self, caller: &Address, operator: Address, enabled: bool) -> Result<(), SwapError> {
        self.check_owner(caller)?;
        if operator.is_zero() {
            return Err(SwapError::InvalidAddress);
        }
        if enabled {
            self.operators.insert(operator);
        } else {
            self.operators.remove(&operator);
        }
        Ok(())
    }

    pub fn set_pool_blacklist(&mut self, caller: &Address, pool: Address, blacklisted: bool) -> Result<(), SwapError> {
        self.check_owner(caller)?;
        if pool.is_zero() {
            return Err(SwapError::InvalidAddress);
        }
        if blacklisted {
            self.blacklisted_pools.insert(pool);
        } else {
            self.blacklisted_pools.remove(&pool);
        }
        Ok(())
    }

    pub fn configure_mev(&mut self, caller: &Address, config: MevConfig) -> Result<(), SwapError> {
        self.check_owner(caller)?;
        if config.enabled && config.max_tx_per_block == 0 {
            return Err(SwapError::InvalidRiskParameters(
                "max_tx_per_block must be positive".to_string(),
            ));
        }
        self.mev.set_config(config);
        Ok(())
    }

    /// A zero period removes the cooldown
    pub fn set_operation_cooldown(&mut self, caller: &Address, operation: OperationId, seconds: u64) -> Result<(), SwapError> {
        self.check_owner(caller)?;
        if seconds == 0 {
            self.cooldowns.remove(&operation);
        } else {
            let entry = self.cooldowns.entry(operation).or_default();
            entry.period = seconds;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Address {
        Address::from_low_u64_be(0xf0)
    }

    fn state() -> SecurityState {
        SecurityState::new(owner(), MevConfig::default())
    }

    #[test]
    fn test_pause_transitions() {
        let mut security = state();
        let stranger = Address::from_low_u64_be(0x99);
        assert_eq!(security.pause(&stranger), Err(SwapError::Unauthorized));
        assert_eq!(security.unpause(&owner()), Err(SwapError::SystemNotPaused));

        security.pause(&owner()).unwrap();
        assert_eq!(security.run_state(), RunState::Paused);
        assert_eq!(security.check_not_paused(), Err(SwapError::SystemPaused));
        assert_eq!(security.pause(&owner()), Err(SwapError::SystemPaused));

        security.unpause(&owner()).unwrap();
        assert!(security.check_not_paused().is_ok());
    }

    #[test]
    fn test_cooldown_releases_lock_on_rejection() {
        let mut security = state();
        security
            .set_operation_cooldown(&owner(), OperationId::ExecuteSwap, 30)
            .unwrap();

        let guard = security.enter_guard(OperationId::ExecuteSwap, 100).unwrap();
        drop(guard);

        assert!(matches!(
            security.enter_guard(OperationId::ExecuteSwap, 120),
            Err(SwapError::CooldownActive)
        ));
        assert_eq!(security.lock_state(), LockState::Unlocked);

        // Other operations are unaffected
        assert!(security.enter_guard(OperationId::ExecuteBatchSwaps, 120).is_ok());
        assert!(security.enter_guard(OperationId::ExecuteSwap, 130).is_ok());
    }

    #[test]
    fn test_guard_rejects_reentry() {
        let mut security = state();
        let _guard = security.enter_guard(OperationId::ExecuteSwap, 1).unwrap();
        assert!(matches!(
            security.enter_guard(OperationId::ExecuteMultiSwap, 1),
            Err(SwapError::ReentrancyAttempt)
        ));
    }

    #[test]
    fn test_journal_restores_cooldown_and_record() {
        let mut security = state();
        let caller = Address::from_low_u64_be(5);
        security
            .set_operation_cooldown(&owner(), OperationId::ExecuteSwap, 60)
            .unwrap();

        let journal = security.journal(caller, OperationId::ExecuteSwap);
        drop(security.enter_guard(OperationId::ExecuteSwap, 10).unwrap());
        security
            .apply_mev_checks(&CallContext::new(caller, 1, 10))
            .unwrap();
        security.restore(journal);

        assert!(security.protection_record(&caller).is_none());
        assert!(security.enter_guard(OperationId::ExecuteSwap, 11).is_ok());
    }

    #[test]
    fn test_operator_is_strict() {
        let mut security = state();
        let operator = Address::from_low_u64_be(0x0b);
        assert_eq!(security.check_operator(&owner()), Err(SwapError::Unauthorized));
        security.set_operator(&owner(), operator, true).unwrap();
        assert!(security.check_operator(&operator).is_ok());
        security.set_operator(&owner(), operator, false).unwrap();
        assert!(!security.is_operator(&operator));
    }

    #[test]
    fn test_ownership_and_blacklist() {
        let mut security = state();
        let next = Address::from_low_u64_be(0xf1);
        let pool = Address::from_low_u64_be(0xa1);

        assert_eq!(
            security.transfer_ownership(&owner(), Address::zero()),
            Err(SwapError::InvalidAddress)
        );
        assert_eq!(security.transfer_ownership(&owner(), next), Ok(owner()));
        assert_eq!(
            security.set_pool_blacklist(&owner(), pool, true),
            Err(SwapError::Unauthorized)
        );
        security.set_pool_blacklist(&next, pool, true).unwrap();
        assert_eq!(security.check_pool_allowed(&pool), Err(SwapError::PoolBlacklisted(pool)));
    }
}
