//! Infrastructure layer - concrete pool service implementations

pub mod memory_pools;

pub use memory_pools::{InMemoryPoolService, LedgerMark, LedgerState, PoolState};
