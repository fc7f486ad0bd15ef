mod common;

use bofh_router::domain::execution::{RouterEvent, SwapOrchestrator};
use bofh_router::domain::protection::{LockState, OperationId, ReentrancyLock};
use bofh_router::infrastructure::LedgerMark;
use bofh_router::shared::errors::PoolServiceError;
use bofh_router::shared::types::{Address, Amount, MevConfig};
use bofh_router::{InMemoryPoolService, PoolService, SwapError, SwapRequest};

use common::*;

const SINK: u64 = 0xdead;

/// Pool service that can shortchange the recipient of every swap and
/// probe the router's lock from inside a swap call
struct HostilePools {
    inner: InMemoryPoolService,
    skim_divisor: Option<u64>,
    probe: Option<ReentrancyLock>,
    observed: Vec<Result<(), SwapError>>,
}

impl HostilePools {
    fn new() -> Self {
        Self {
            inner: seeded_pools(),
            skim_divisor: None,
            probe: None,
            observed: Vec::new(),
        }
    }
}

impl PoolService for HostilePools {
    type Checkpoint = LedgerMark;

    fn get_pair(&self, token_a: &Address, token_b: &Address) -> Option<Address> {
        self.inner.get_pair(token_a, token_b)
    }

    fn get_reserves(&self, pool: &Address) -> Result<(Amount, Amount), PoolServiceError> {
        self.inner.get_reserves(pool)
    }

    fn get_token_order(&self, pool: &Address) -> Result<(Address, Address), PoolServiceError> {
        self.inner.get_token_order(pool)
    }

    fn swap(
        &mut self,
        pool: &Address,
        token_in: &Address,
        amount_in: Amount,
        recipient: &Address,
    ) -> Result<Amount, PoolServiceError> {
        if let Some(lock) = &self.probe {
            self.observed.push(lock.enter().map(|_| ()));
        }

        let out = self.inner.swap(pool, token_in, amount_in, recipient)?;
        if let Some(divisor) = self.skim_divisor {
            let (token0, token1) = self.inner.get_token_order(pool)?;
            let token_out = if *token_in == token0 { token1 } else { token0 };
            let skim = out / Amount::from(divisor);
            self.inner.transfer(&token_out, recipient, &addr(SINK), skim)?;
        }
        Ok(out)
    }

    fn balance_of(&self, token: &Address, holder: &Address) -> Amount {
        self.inner.balance_of(token, holder)
    }

    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), PoolServiceError> {
        self.inner.transfer(token, from, to, amount)
    }

    fn checkpoint(&mut self) -> LedgerMark {
        self.inner.checkpoint()
    }

    fn commit(&mut self, checkpoint: LedgerMark) {
        self.inner.commit(checkpoint)
    }

    fn rollback(&mut self, checkpoint: LedgerMark) {
        self.inner.rollback(checkpoint)
    }
}

fn hostile_router() -> SwapOrchestrator<HostilePools> {
    SwapOrchestrator::new(setup(MevConfig::default()), HostilePools::new()).unwrap()
}

#[test]
fn shortchanging_pool_aborts_and_rolls_back() {
    let mut router = hostile_router();
    router.pools_mut().skim_divisor = Some(2);
    let before = router.pools().inner.ledger().clone();

    let result = router.execute_swap(&ctx(1), triangle(100, 1));

    assert!(matches!(result, Err(SwapError::TransferFailed(_))));
    assert_eq!(router.pools().inner.ledger(), &before);
    assert_eq!(router.pools().balance_of(&addr(TOKEN_A), &addr(SINK)), Amount::zero());
    assert_eq!(router.lock_state(), LockState::Unlocked);
    assert!(router.security().protection_record(&addr(TRADER)).is_none());
    assert!(router.events().is_empty());
}

#[test]
fn skim_within_sandwich_tolerance_is_accepted() {
    let mut router = hostile_router();
    // 1/300 of each hop output stays inside the 50 bps tolerance
    router.pools_mut().skim_divisor = Some(300);

    let outcome = router.execute_swap(&ctx(1), two_hop(400, 1)).unwrap();
    let first = &outcome.hops[0];
    assert_eq!(first.quoted_out, amount(383));
    assert_eq!(first.reported_out, amount(383));
    assert_eq!(first.measured_out, amount(382));
    assert_eq!(first.amount_out, amount(382));
    assert!(first.is_shortchanged());
    // The second hop is quoted from what actually arrived
    assert_eq!(outcome.hops[1].amount_in, amount(382));
    let honest = router_output_without_skim(400);
    assert!(outcome.amount_out < honest);
}

fn router_output_without_skim(amount_in: u64) -> Amount {
    let mut router = router();
    router
        .execute_swap(&ctx(1), two_hop(amount_in, 1))
        .unwrap()
        .amount_out
}

#[test]
fn reentry_from_pool_is_rejected() {
    let mut router = hostile_router();
    let lock = router.security().lock().clone();
    router.pools_mut().probe = Some(lock.clone());

    let outcome = router.execute_swap(&ctx(1), triangle(100, 1)).unwrap();

    assert_eq!(outcome.hops.len(), 3);
    assert_eq!(router.pools().observed, vec![Err(SwapError::ReentrancyAttempt); 3]);
    assert_eq!(lock.state(), LockState::Unlocked);
    assert!(lock.enter().is_ok());
}

#[test]
fn lock_released_after_every_failure() {
    let mut router = router();
    let failures = [
        triangle(100, 1_000_000),
        triangle(6_000, 1),
        SwapRequest {
            fees: vec![30, 30, 10_001],
            ..triangle(100, 1)
        },
    ];
    for request in failures {
        assert!(router.execute_swap(&ctx(1), request).is_err());
        assert_eq!(router.lock_state(), LockState::Unlocked);
        assert!(router.security().protection_record(&addr(TRADER)).is_none());
    }
    assert!(router.execute_swap(&ctx(1), triangle(100, 1)).is_ok());
}

#[test]
fn same_slot_budget_is_enforced() {
    let mev = MevConfig {
        enabled: true,
        max_tx_per_block: 1,
        min_tx_delay: 0,
    };
    let mut router = SwapOrchestrator::new(setup(mev), seeded_pools()).unwrap();

    router.execute_swap(&ctx(5), triangle(100, 1)).unwrap();
    assert_eq!(
        router.execute_swap(&ctx(5), triangle(100, 1)).unwrap_err(),
        SwapError::FlashLoanDetected
    );

    let record = router.security().protection_record(&addr(TRADER)).unwrap();
    assert_eq!(record.last_slot, 5);
    assert_eq!(record.tx_count_in_slot, 1);

    assert!(router.execute_swap(&ctx(6), triangle(100, 1)).is_ok());
}

#[test]
fn disabled_mev_still_counts_but_never_rejects() {
    let mev = MevConfig {
        enabled: false,
        max_tx_per_block: 1,
        min_tx_delay: 100,
    };
    let mut router = SwapOrchestrator::new(setup(mev), seeded_pools()).unwrap();
    for _ in 0..3 {
        router.execute_swap(&ctx(5), two_hop(10, 1)).unwrap();
    }
    let record = router.security().protection_record(&addr(TRADER)).unwrap();
    assert_eq!(record.tx_count_in_slot, 3);
    assert_eq!(record.last_action_ts, 1_005);
}

#[test]
fn rate_limit_between_actions() {
    let mev = MevConfig {
        enabled: true,
        max_tx_per_block: 3,
        min_tx_delay: 10,
    };
    let mut router = SwapOrchestrator::new(setup(mev), seeded_pools()).unwrap();

    router.execute_swap(&ctx(1), two_hop(10, 1)).unwrap();
    assert_eq!(
        router.execute_swap(&ctx(2), two_hop(10, 1)).unwrap_err(),
        SwapError::RateLimitExceeded
    );
    assert!(router.execute_swap(&ctx(20), two_hop(10, 1)).is_ok());
}

#[test]
fn cooldown_survives_only_successful_calls() {
    let mut router = router();
    router
        .set_operation_cooldown(&addr(OWNER), OperationId::ExecuteSwap, 60)
        .unwrap();

    // A failed call leaves no cooldown behind
    assert!(router.execute_swap(&ctx(1), two_hop(10, 1_000)).is_err());
    router.execute_swap(&ctx(2), two_hop(10, 1)).unwrap();

    assert_eq!(
        router.execute_swap(&ctx(3), two_hop(10, 1)).unwrap_err(),
        SwapError::CooldownActive
    );
    assert_eq!(router.lock_state(), LockState::Unlocked);

    // Cooldowns are per operation
    assert!(router.execute_batch_swaps(&ctx(4), vec![two_hop(10, 1)]).is_ok());
    assert!(router.execute_swap(&ctx(100), two_hop(10, 1)).is_ok());
}

#[test]
fn blacklisted_pool_blocks_paths_through_it() {
    let mut router = router();
    router
        .set_pool_blacklist(&addr(OWNER), addr(POOL_A_B), true)
        .unwrap();

    assert_eq!(
        router.execute_swap(&ctx(1), triangle(100, 1)).unwrap_err(),
        SwapError::PoolBlacklisted(addr(POOL_A_B))
    );
    assert!(router.execute_swap(&ctx(1), two_hop(100, 1)).is_ok());

    router
        .set_pool_blacklist(&addr(OWNER), addr(POOL_A_B), false)
        .unwrap();
    assert!(router.execute_swap(&ctx(2), triangle(100, 1)).is_ok());
}

#[test]
fn owner_operations_reject_strangers() {
    let mut router = router();
    let stranger = addr(TRADER);

    assert_eq!(router.pause(&stranger), Err(SwapError::Unauthorized));
    assert_eq!(
        router.set_pool_blacklist(&stranger, addr(POOL_A_B), true),
        Err(SwapError::Unauthorized)
    );
    assert_eq!(
        router.transfer_ownership(&stranger, stranger),
        Err(SwapError::Unauthorized)
    );

    router.transfer_ownership(&addr(OWNER), stranger).unwrap();
    assert_eq!(router.owner(), stranger);
    assert_eq!(router.pause(&addr(OWNER)), Err(SwapError::Unauthorized));
    router.pause(&stranger).unwrap();
    assert_eq!(
        router.events().first(),
        Some(&RouterEvent::OwnershipTransferred {
            previous_owner: addr(OWNER),
            new_owner: stranger,
        })
    );
}
