//! Scoped reentrancy guard

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::warn;

use super::LockState;
use crate::shared::errors::SwapError;

/// Shared lock flag; cloning hands out another handle to the same flag
#[derive(Debug, Clone, Default)]
pub struct ReentrancyLock {
    locked: Arc<AtomicBool>,
}

impl ReentrancyLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock for the lifetime of the returned guard
    pub fn enter(&self) -> Result<ReentrancyGuard, SwapError> {
        if self
            .locked
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Reentrancy attempt rejected");
            return Err(SwapError::ReentrancyAttempt);
        }
        Ok(ReentrancyGuard {
            locked: Arc::clone(&self.locked),
        })
    }

    pub fn state(&self) -> LockState {
        if self.locked.load(Ordering::Acquire) {
            LockState::Locked
        } else {
            LockState::Unlocked
        }
    }
}

/// Holds the lock; unlocks on drop, whatever path the holder exits by
#[derive(Debug)]
pub struct ReentrancyGuard {
    locked: Arc<AtomicBool>,
}

impl ReentrancyGuard {
    /// Explicit release, same as dropping the guard
    pub fn exit(self) {}
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        self.locked.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_enter_rejected() {
        let lock = ReentrancyLock::new();
        let guard = lock.enter().unwrap();
        assert_eq!(lock.state(), LockState::Locked);
        assert_eq!(lock.enter().unwrap_err(), SwapError::ReentrancyAttempt);
        guard.exit();
        assert_eq!(lock.state(), LockState::Unlocked);
    }

    #[test]
    fn test_unlocks_on_early_return() {
        fn failing(lock: &ReentrancyLock) -> Result<(), SwapError> {
            let _guard = lock.enter()?;
            Err(SwapError::InvalidAmount)
        }

        let lock = ReentrancyLock::new();
        assert_eq!(failing(&lock), Err(SwapError::InvalidAmount));
        assert_eq!(lock.state(), LockState::Unlocked);
        assert!(lock.enter().is_ok());
    }

    #[test]
    fn test_clones_share_the_flag() {
        let lock = ReentrancyLock::new();
        let other = lock.clone();
        let _guard = lock.enter().unwrap();
        assert_eq!(other.state(), LockState::Locked);
    }
}
