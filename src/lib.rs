//! Bofh router - cyclic multi-hop swaps over constant-product pools
//! Built with Domain-Driven Design principles

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod report;
pub mod shared;

// Re-export main types for convenience
pub use application::RouterService;
pub use domain::dex::PoolService;
pub use domain::execution::{MultiSwapRequest, PathMetrics, SwapOrchestrator, SwapOutcome, SwapRequest};
pub use domain::pool::PoolAnalyzer;
pub use domain::protection::SecurityState;
pub use infrastructure::InMemoryPoolService;
pub use shared::errors::{AppError, SwapError};
