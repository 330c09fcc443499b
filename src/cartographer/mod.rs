//! Phase 1: The Cartographer (Pool Snapshots)
//!
//! Plain-data view of the pools the fetching side discovered, per chain.

mod health;
mod snapshot;

pub use health::{analyze_pool_health, HealthLabel, PoolHealth};
pub use snapshot::{ChainLane, PoolSnapshot, SwapRequest};
