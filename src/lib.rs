//! crossroute - split large swaps across chains
//!
//! Pipeline: pool snapshot → allocation optimizer → recommendation.
//! Everything here is synchronous and side-effect free; the binaries add
//! file loading, logging and output on top.

pub mod brain;
pub mod cartographer;
pub mod config;
pub mod error;
pub mod gas;
pub mod planner;
pub mod simulator;
pub mod tokens;

pub use cartographer::{PoolSnapshot, SwapRequest};
pub use config::RouterConfig;
pub use error::{RouteError, RouteResult};
pub use planner::{recommend, RouteRecommendation, SwapRecommendation};
