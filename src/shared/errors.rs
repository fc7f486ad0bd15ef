//! Error handling for the router

use thiserror::Error;

use super::types::{Address, Amount};

/// Terminal failures of a router operation. Any of these aborts the whole
/// operation; nothing is retried internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwapError {
    // Input errors
    #[error("Invalid swap path")]
    InvalidPath,

    #[error("Array length mismatch")]
    InvalidArrayLength,

    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Invalid address")]
    InvalidAddress,

    #[error("Invalid fee: {0} bps")]
    InvalidFee(u32),

    #[error("Path too long: {0} assets")]
    PathTooLong(usize),

    #[error("Deadline expired")]
    DeadlineExpired,

    // Market errors
    #[error("Insufficient liquidity")]
    InsufficientLiquidity,

    #[error("Excessive trade size")]
    ExcessiveTradeSize,

    #[error("Pair not found")]
    PairNotFound,

    #[error("Insufficient output: got {amount_out}, required {min_amount_out}")]
    InsufficientOutput {
        amount_out: Amount,
        min_amount_out: Amount,
    },

    #[error("Excessive slippage: impact {impact} exceeds limit {limit}")]
    ExcessiveSlippage { impact: u64, limit: u64 },

    #[error("Unprofitable execution: out {total_out} <= in {total_in}")]
    UnprofitableExecution { total_in: Amount, total_out: Amount },

    // Protection errors
    #[error("Reentrancy attempt")]
    ReentrancyAttempt,

    #[error("Flash loan pattern detected")]
    FlashLoanDetected,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Operation cooldown active")]
    CooldownActive,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Pool blacklisted: {0:?}")]
    PoolBlacklisted(Address),

    #[error("System paused")]
    SystemPaused,

    #[error("System not paused")]
    SystemNotPaused,

    #[error("Invalid risk parameters: {0}")]
    InvalidRiskParameters(String),

    #[error("Arithmetic overflow")]
    MathOverflow,

    // External errors
    #[error("Transfer failed: {0}")]
    TransferFailed(String),
}

/// Failures reported by a pool service implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolServiceError {
    #[error("Pool not found: {0:?}")]
    UnknownPool(Address),

    #[error("Token {token:?} is not part of pool {pool:?}")]
    TokenNotInPool { pool: Address, token: Address },

    #[error("Insufficient balance of {token:?} held by {holder:?}")]
    InsufficientBalance { token: Address, holder: Address },

    #[error("Pool received less input than declared")]
    InsufficientInputAmount,

    #[error("Pool cannot cover the requested output")]
    InsufficientLiquidity,

    #[error("Arithmetic overflow in pool accounting")]
    Overflow,
}

impl From<PoolServiceError> for SwapError {
    fn from(err: PoolServiceError) -> Self {
        match err {
            PoolServiceError::UnknownPool(_) => SwapError::PairNotFound,
            other => SwapError::TransferFailed(other.to_string()),
        }
    }
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Swap error: {0}")]
    SwapError(#[from] SwapError),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<PoolServiceError> for AppError {
    fn from(err: PoolServiceError) -> Self {
        AppError::SwapError(err.into())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}
