//! Pool health diagnostics
//!
//! Advisory only. The optimizer never consults this; diagnostics and operators do.

use serde::{Deserialize, Serialize};

use super::PoolSnapshot;

/// Reserve ratio band considered balanced
const BALANCED_RATIO_MIN: f64 = 0.8;
const BALANCED_RATIO_MAX: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthLabel {
    Good,
    Moderate,
}

impl std::fmt::Display for HealthLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthLabel::Good => write!(f, "good"),
            HealthLabel::Moderate => write!(f, "moderate"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolHealth {
    /// base / quote (0 when quote is empty)
    pub reserve_ratio: f64,
    pub is_balanced: bool,

    /// Mean of the two reserves
    pub liquidity_depth: f64,

    pub tvl_usd: f64,
    pub fee_percent: f64,
    pub health: HealthLabel,
}

pub fn analyze_pool_health(
    base_reserve: f64,
    quote_reserve: f64,
    tvl_usd: f64,
    fee_bps: u32,
    healthy_tvl_floor_usd: f64,
) -> PoolHealth {
    let reserve_ratio = if quote_reserve != 0.0 {
        base_reserve / quote_reserve
    } else {
        0.0
    };
    let is_balanced = (BALANCED_RATIO_MIN..=BALANCED_RATIO_MAX).contains(&reserve_ratio);
    let health = if is_balanced && tvl_usd > healthy_tvl_floor_usd {
        HealthLabel::Good
    } else {
        HealthLabel::Moderate
    };

    PoolHealth {
        reserve_ratio,
        is_balanced,
        liquidity_depth: (base_reserve + quote_reserve) / 2.0,
        tvl_usd,
        fee_percent: fee_bps as f64 / 100.0,
        health,
    }
}

impl PoolSnapshot {
    pub fn health(&self, healthy_tvl_floor_usd: f64) -> PoolHealth {
        analyze_pool_health(
            self.reserve0,
            self.reserve1,
            self.tvl_usd,
            self.fee_bps,
            healthy_tvl_floor_usd,
        )
    }
}
