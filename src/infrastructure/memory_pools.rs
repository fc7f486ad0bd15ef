//! In-memory constant-product pool service with a token ledger

use std::collections::HashMap;

use primitive_types::{U256, U512};
use tracing::debug;

use crate::domain::dex::PoolService;
use crate::shared::config::EngineConfig;
use crate::shared::errors::{AppError, PoolServiceError};
use crate::shared::types::{Address, Amount, BPS_DENOMINATOR};

/// One pool; tokens are stored sorted so `token0 < token1`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolState {
    pub token0: Address,
    pub token1: Address,
    pub reserve0: Amount,
    pub reserve1: Amount,
    pub fee_bps: u32,
}

/// Pools, pair index and token balances
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerState {
    pools: HashMap<Address, PoolState>,
    pairs: HashMap<(Address, Address), Address>,
    balances: HashMap<(Address, Address), Amount>,
}

fn pair_key(a: &Address, b: &Address) -> (Address, Address) {
    if a < b {
        (*a, *b)
    } else {
        (*b, *a)
    }
}

impl LedgerState {
    fn balance(&self, token: &Address, holder: &Address) -> Amount {
        self.balances
            .get(&(*token, *holder))
            .copied()
            .unwrap_or_default()
    }
}

/// Prior value of one ledger entry, put back on rollback
#[derive(Debug, Clone)]
enum UndoEntry {
    Balance {
        key: (Address, Address),
        previous: Option<Amount>,
    },
    Pool {
        pool: Address,
        previous: Option<PoolState>,
    },
    Pair {
        key: (Address, Address),
        previous: Option<Address>,
    },
}

/// Position in the undo journal when a checkpoint was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerMark {
    position: usize,
}

/// Pool service backed by process memory, with the same swap contract as
/// a constant-product pair: input must already sit in the pool's balance
/// when `swap` is called.
///
/// While a checkpoint is open every write records the entry's prior value,
/// so rollback costs what the unit of work touched, not the ledger size.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPoolService {
    state: LedgerState,
    journal: Vec<UndoEntry>,
    open_checkpoints: usize,
}

impl InMemoryPoolService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `[[pools]]` and `[[balances]]` sections
    pub fn from_config(config: &EngineConfig) -> Result<Self, AppError> {
        let mut service = Self::new();
        for pool in &config.pools {
            service.add_pool(
                pool.address,
                pool.token_a,
                pool.token_b,
                pool.reserve_a,
                pool.reserve_b,
                pool.fee_bps,
            )?;
        }
        for balance in &config.balances {
            service.mint(balance.token, balance.holder, balance.amount);
        }
        debug!(
            "In-memory pools ready: {} pools, {} balances",
            config.pools.len(),
            config.balances.len()
        );
        Ok(service)
    }

    /// Register a pool and credit it with its initial reserves
    pub fn add_pool(
        &mut self,
        pool: Address,
        token_a: Address,
        token_b: Address,
        reserve_a: Amount,
        reserve_b: Amount,
        fee_bps: u32,
    ) -> Result<(), PoolServiceError> {
        if token_a == token_b {
            return Err(PoolServiceError::TokenNotInPool { pool, token: token_b });
        }
        if reserve_a.is_zero() || reserve_b.is_zero() || fee_bps >= BPS_DENOMINATOR {
            return Err(PoolServiceError::InsufficientLiquidity);
        }

        let (token0, token1, reserve0, reserve1) = if token_a < token_b {
            (token_a, token_b, reserve_a, reserve_b)
        } else {
            (token_b, token_a, reserve_b, reserve_a)
        };
        self.credit(&token0, &pool, reserve0)?;
        self.credit(&token1, &pool, reserve1)?;
        self.set_pair(pair_key(&token0, &token1), pool);
        self.set_pool(
            pool,
            PoolState {
                token0,
                token1,
                reserve0,
                reserve1,
                fee_bps,
            },
        );
        Ok(())
    }

    pub fn mint(&mut self, token: Address, holder: Address, amount: Amount) {
        let updated = self.state.balance(&token, &holder).saturating_add(amount);
        self.set_balance(&token, &holder, updated);
    }

    pub fn pool(&self, pool: &Address) -> Option<&PoolState> {
        self.state.pools.get(pool)
    }

    /// Registered pool addresses in ascending order
    pub fn pool_addresses(&self) -> Vec<Address> {
        let mut addresses: Vec<Address> = self.state.pools.keys().copied().collect();
        addresses.sort();
        addresses
    }

    /// Current ledger contents
    pub fn ledger(&self) -> &LedgerState {
        &self.state
    }

    /// Entries waiting in the undo journal
    pub fn journal_len(&self) -> usize {
        self.journal.len()
    }

    fn pool_state(&self, pool: &Address) -> Result<&PoolState, PoolServiceError> {
        self.state
            .pools
            .get(pool)
            .ok_or(PoolServiceError::UnknownPool(*pool))
    }

    fn recording(&self) -> bool {
        self.open_checkpoints > 0
    }

    fn set_balance(&mut self, token: &Address, holder: &Address, amount: Amount) {
        let key = (*token, *holder);
        let previous = self.state.balances.insert(key, amount);
        if self.recording() {
            self.journal.push(UndoEntry::Balance { key, previous });
        }
    }

    fn set_pool(&mut self, pool: Address, state: PoolState) {
        let previous = self.state.pools.insert(pool, state);
        if self.recording() {
            self.journal.push(UndoEntry::Pool { pool, previous });
        }
    }

    fn set_pair(&mut self, key: (Address, Address), pool: Address) {
        let previous = self.state.pairs.insert(key, pool);
        if self.recording() {
            self.journal.push(UndoEntry::Pair { key, previous });
        }
    }

    fn credit(&mut self, token: &Address, holder: &Address, amount: Amount) -> Result<(), PoolServiceError> {
        let updated = self
            .state
            .balance(token, holder)
            .checked_add(amount)
            .ok_or(PoolServiceError::Overflow)?;
        self.set_balance(token, holder, updated);
        Ok(())
    }

    fn debit(&mut self, token: &Address, holder: &Address, amount: Amount) -> Result<(), PoolServiceError> {
        let current = self.state.balance(token, holder);
        if current < amount {
            return Err(PoolServiceError::InsufficientBalance {
                token: *token,
                holder: *holder,
            });
        }
        self.set_balance(token, holder, current - amount);
        Ok(())
    }

    fn undo(&mut self, entry: UndoEntry) {
        match entry {
            UndoEntry::Balance { key, previous } => match previous {
                Some(amount) => {
                    self.state.balances.insert(key, amount);
                }
                None => {
                    self.state.balances.remove(&key);
                }
            },
            UndoEntry::Pool { pool, previous } => match previous {
                Some(state) => {
                    self.state.pools.insert(pool, state);
                }
                None => {
                    self.state.pools.remove(&pool);
                }
            },
            UndoEntry::Pair { key, previous } => match previous {
                Some(pool) => {
                    self.state.pairs.insert(key, pool);
                }
                None => {
                    self.state.pairs.remove(&key);
                }
            },
        }
    }

    fn close_checkpoint(&mut self) {
        self.open_checkpoints = self.open_checkpoints.saturating_sub(1);
        if self.open_checkpoints == 0 {
            self.journal.clear();
        }
    }
}

fn constant_product_out(
    amount_in: Amount,
    reserve_in: Amount,
    reserve_out: Amount,
    fee_bps: u32,
) -> Result<Amount, PoolServiceError> {
    let amount_in_with_fee = amount_in.full_mul(U256::from(BPS_DENOMINATOR - fee_bps));
    let numerator = amount_in_with_fee
        .checked_mul(U512::from(reserve_out))
        .ok_or(PoolServiceError::Overflow)?;
    let denominator = U512::from(reserve_in)
        .checked_mul(U512::from(BPS_DENOMINATOR))
        .and_then(|scaled| scaled.checked_add(amount_in_with_fee))
        .ok_or(PoolServiceError::Overflow)?;
    U256::try_from(numerator / denominator).map_err(|_| PoolServiceError::Overflow)
}

impl PoolService for InMemoryPoolService {
    type Checkpoint = LedgerMark;

    fn get_pair(&self, token_a: &Address, token_b: &Address) -> Option<Address> {
        self.state.pairs.get(&pair_key(token_a, token_b)).copied()
    }

    fn get_reserves(&self, pool: &Address) -> Result<(Amount, Amount), PoolServiceError> {
        let state = self.pool_state(pool)?;
        Ok((state.reserve0, state.reserve1))
    }

    fn get_token_order(&self, pool: &Address) -> Result<(Address, Address), PoolServiceError> {
        let state = self.pool_state(pool)?;
        Ok((state.token0, state.token1))
    }

    fn swap(
        &mut self,
        pool: &Address,
        token_in: &Address,
        amount_in: Amount,
        recipient: &Address,
    ) -> Result<Amount, PoolServiceError> {
        let state = self.pool_state(pool)?.clone();
        let (reserve_in, reserve_out, token_out) = if *token_in == state.token0 {
            (state.reserve0, state.reserve1, state.token1)
        } else if *token_in == state.token1 {
            (state.reserve1, state.reserve0, state.token0)
        } else {
            return Err(PoolServiceError::TokenNotInPool {
                pool: *pool,
                token: *token_in,
            });
        };

        let received = self.state.balance(token_in, pool).saturating_sub(reserve_in);
        if amount_in.is_zero() || received < amount_in {
            return Err(PoolServiceError::InsufficientInputAmount);
        }

        let amount_out = constant_product_out(amount_in, reserve_in, reserve_out, state.fee_bps)?;
        if amount_out.is_zero() || amount_out >= reserve_out {
            return Err(PoolServiceError::InsufficientLiquidity);
        }

        let new_in = reserve_in.checked_add(amount_in).ok_or(PoolServiceError::Overflow)?;
        let new_out = reserve_out - amount_out;
        self.debit(&token_out, pool, amount_out)?;
        self.credit(&token_out, recipient, amount_out)?;

        let mut updated = state;
        if *token_in == updated.token0 {
            updated.reserve0 = new_in;
            updated.reserve1 = new_out;
        } else {
            updated.reserve1 = new_in;
            updated.reserve0 = new_out;
        }
        self.set_pool(*pool, updated);

        debug!("Pool {:?} swapped {} {:?} for {} {:?}", pool, amount_in, token_in, amount_out, token_out);
        Ok(amount_out)
    }

    fn balance_of(&self, token: &Address, holder: &Address) -> Amount {
        self.state.balance(token, holder)
    }

    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), PoolServiceError> {
        self.debit(token, from, amount)?;
        self.credit(token, to, amount)
    }

    fn checkpoint(&mut self) -> LedgerMark {
        self.open_checkpoints += 1;
        LedgerMark {
            position: self.journal.len(),
        }
    }

    fn commit(&mut self, _checkpoint: LedgerMark) {
        self.close_checkpoint();
    }

    fn rollback(&mut self, checkpoint: LedgerMark) {
        while self.journal.len() > checkpoint.position {
            if let Some(entry) = self.journal.pop() {
                self.undo(entry);
            }
        }
        self.close_checkpoint();
    }
}
