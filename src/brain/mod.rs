//! Phase 2: The Brain
//!
//! Responsible for:
//! - Pricing the next allocation step on every chain
//! - Greedy allocation under the slippage ceiling

mod marginal;
mod optimizer;

pub use marginal::{MarginalCost, MarginalCostEstimator};
pub use optimizer::{AllocationOptimizer, AllocationPlan};
