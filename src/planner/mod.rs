//! Phase 4: The Planner
//!
//! Builds the ranked per-chain execution plan from an allocation.

mod recommendation;

pub use recommendation::{
    assemble, confidence_for, recommend, RouteRecommendation, SwapRecommendation,
};
