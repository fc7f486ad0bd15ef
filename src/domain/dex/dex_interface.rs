//! Pool service interface

use crate::shared::errors::PoolServiceError;
use crate::shared::types::{Address, Amount};

/// Common interface for the external constant-product pool service.
///
/// Calls are synchronous: the router treats every call as atomic relative
/// to its own unit of work, and reserve reads must reflect all swaps
/// already performed inside that unit.
pub trait PoolService {
    /// Opaque state captured by [`PoolService::checkpoint`]
    type Checkpoint;

    /// Pool trading `token_a` against `token_b`, if one exists
    fn get_pair(&self, token_a: &Address, token_b: &Address) -> Option<Address>;

    /// Reserves in token order, `(reserve0, reserve1)`
    fn get_reserves(&self, pool: &Address) -> Result<(Amount, Amount), PoolServiceError>;

    /// `(token0, token1)` of the pool
    fn get_token_order(&self, pool: &Address) -> Result<(Address, Address), PoolServiceError>;

    /// Swap `amount_in` of `token_in`, already transferred to the pool,
    /// for the other side; the output is sent to `recipient`.
    fn swap(
        &mut self,
        pool: &Address,
        token_in: &Address,
        amount_in: Amount,
        recipient: &Address,
    ) -> Result<Amount, PoolServiceError>;

    fn balance_of(&self, token: &Address, holder: &Address) -> Amount;

    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), PoolServiceError>;

    /// Open a unit of work; effects from here on can be undone by
    /// [`PoolService::rollback`]. Checkpoints nest and must be closed in
    /// reverse order of opening.
    fn checkpoint(&mut self) -> Self::Checkpoint;

    /// Close the unit of work and keep its effects
    fn commit(&mut self, checkpoint: Self::Checkpoint);

    /// Close the unit of work and undo every effect since `checkpoint`
    fn rollback(&mut self, checkpoint: Self::Checkpoint);
}
