#![allow(dead_code)]

use bofh_router::domain::execution::{RouterSetup, SwapOrchestrator, SwapRequest};
use bofh_router::shared::types::{Address, Amount, CallContext, MevConfig, RiskParameters};
use bofh_router::InMemoryPoolService;

pub const BASE: u64 = 0x01;
pub const TOKEN_A: u64 = 0x02;
pub const TOKEN_B: u64 = 0x03;
pub const POOL_BASE_A: u64 = 0xa1;
pub const POOL_A_B: u64 = 0xa2;
pub const POOL_B_BASE: u64 = 0xa3;
pub const OWNER: u64 = 0xf0;
pub const ROUTER: u64 = 0xf1;
pub const TRADER: u64 = 0xc0;

pub fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

pub fn amount(n: u64) -> Amount {
    Amount::from(n)
}

/// Three 10k/10k pools forming BASE -> A -> B -> BASE, trader funded
pub fn seeded_pools() -> InMemoryPoolService {
    let mut pools = InMemoryPoolService::new();
    let r = amount(10_000);
    pools.add_pool(addr(POOL_BASE_A), addr(BASE), addr(TOKEN_A), r, r, 30).unwrap();
    pools.add_pool(addr(POOL_A_B), addr(TOKEN_A), addr(TOKEN_B), r, r, 30).unwrap();
    pools.add_pool(addr(POOL_B_BASE), addr(TOKEN_B), addr(BASE), r, r, 30).unwrap();
    pools.mint(addr(BASE), addr(TRADER), amount(1_000_000));
    pools
}

pub fn setup(mev: MevConfig) -> RouterSetup {
    RouterSetup {
        base_asset: addr(BASE),
        owner: addr(OWNER),
        router: addr(ROUTER),
        risk: RiskParameters::default(),
        mev,
    }
}

pub fn router() -> SwapOrchestrator<InMemoryPoolService> {
    SwapOrchestrator::new(setup(MevConfig::default()), seeded_pools()).unwrap()
}

pub fn ctx(slot: u64) -> CallContext {
    CallContext::new(addr(TRADER), slot, 1_000 + slot)
}

pub fn two_hop(amount_in: u64, min_out: u64) -> SwapRequest {
    SwapRequest {
        path: vec![addr(BASE), addr(TOKEN_A), addr(BASE)],
        fees: vec![30, 30],
        amount_in: amount(amount_in),
        min_amount_out: amount(min_out),
        deadline: 1_000_000,
    }
}

pub fn triangle(amount_in: u64, min_out: u64) -> SwapRequest {
    SwapRequest {
        path: vec![addr(BASE), addr(TOKEN_A), addr(TOKEN_B), addr(BASE)],
        fees: vec![30, 30, 30],
        amount_in: amount(amount_in),
        min_amount_out: amount(min_out),
        deadline: 1_000_000,
    }
}
