//! Protection domain - ownership, circuit breaker, reentrancy and MEV checks

mod mev_protection;
mod reentrancy_guard;
mod security_state;

pub use mev_protection::{MevProtection, ProtectionRecord};
pub use reentrancy_guard::{ReentrancyGuard, ReentrancyLock};
pub use security_state::{ProtectionJournal, SecurityState};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Guarded operations that may carry a cooldown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationId {
    ExecuteSwap,
    ExecuteMultiSwap,
    ExecuteBatchSwaps,
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationId::ExecuteSwap => write!(f, "execute_swap"),
            OperationId::ExecuteMultiSwap => write!(f, "execute_multi_swap"),
            OperationId::ExecuteBatchSwaps => write!(f, "execute_batch_swaps"),
        }
    }
}

/// Reentrancy lock state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LockState {
    Unlocked,
    Locked,
}

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    Running,
    Paused,
}
