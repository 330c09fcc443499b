//! Routing errors
//!
//! Library code returns `Result<_, RouteError>`. Binaries wrap these in eyre.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    /// A pool has a zero (or negative) reserve on the side being traded.
    /// Recoverable: the optimizer drops the chain, never the whole call.
    #[error("Insufficient liquidity: reserve_in={reserve_in}, reserve_out={reserve_out}")]
    InsufficientLiquidity { reserve_in: f64, reserve_out: f64 },

    /// No chain is left with a usable pool after eviction.
    #[error("No valid route: {0}")]
    NoValidRoute(String),

    /// Rejected before the optimizer loop starts.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Arithmetic produced a non-finite value.
    #[error("Calculation error: {0}")]
    Calculation(String),
}

impl RouteError {
    pub fn invalid(message: impl Into<String>) -> Self {
        RouteError::InvalidInput(message.into())
    }

    pub fn no_route(message: impl Into<String>) -> Self {
        RouteError::NoValidRoute(message.into())
    }
}

pub type RouteResult<T> = std::result::Result<T, RouteError>;
