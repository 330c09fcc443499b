//! Pool snapshots and swap requests
//!
//! The data-fetching side hands us one normalized snapshot per call. Nothing
//! here talks to a chain; a snapshot is plain data and is never mutated.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{RouteError, RouteResult};
use crate::simulator::{decode_sqrt_price_str, DecodedPrice};
use crate::tokens::{decimals_for, normalize_symbol, same_asset};

fn default_usd_price() -> f64 {
    1.0
}

/// One discovered liquidity pool on one chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub chain: String,
    pub address: String,
    pub token0: String,
    pub token1: String,

    /// Fee tier in basis points (30 = 0.3%)
    pub fee_bps: u32,

    pub reserve0: f64,
    pub reserve1: f64,

    /// Raw sqrtPriceX96 (decimal or 0x-hex), when the pool exposes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqrt_price_x96: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token0_decimals: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token1_decimals: Option<u8>,

    #[serde(default)]
    pub tvl_usd: f64,
}

impl PoolSnapshot {
    pub fn new(
        chain: &str,
        address: &str,
        token0: &str,
        token1: &str,
        fee_bps: u32,
        reserve0: f64,
        reserve1: f64,
    ) -> Self {
        Self {
            chain: chain.to_string(),
            address: address.to_string(),
            token0: token0.to_string(),
            token1: token1.to_string(),
            fee_bps,
            reserve0,
            reserve1,
            sqrt_price_x96: None,
            tick: None,
            token0_decimals: None,
            token1_decimals: None,
            tvl_usd: 0.0,
        }
    }

    pub fn with_tvl(mut self, tvl_usd: f64) -> Self {
        self.tvl_usd = tvl_usd;
        self
    }

    pub fn with_sqrt_price(mut self, sqrt_price_x96: &str, tick: i32) -> Self {
        self.sqrt_price_x96 = Some(sqrt_price_x96.to_string());
        self.tick = Some(tick);
        self
    }

    /// Fee as a fraction (30 bps -> 0.003)
    pub fn fee_fraction(&self) -> f64 {
        self.fee_bps as f64 / 10_000.0
    }

    /// Both reserves are positive (and finite)
    pub fn has_liquidity(&self) -> bool {
        self.reserve0 > 0.0
            && self.reserve1 > 0.0
            && self.reserve0.is_finite()
            && self.reserve1.is_finite()
    }

    /// The pool trades exactly this pair (either order, wrapped native == native)
    pub fn matches_pair(&self, token_a: &str, token_b: &str) -> bool {
        (same_asset(&self.token0, token_a) && same_asset(&self.token1, token_b))
            || (same_asset(&self.token0, token_b) && same_asset(&self.token1, token_a))
    }

    /// (reserve_in, reserve_out) for a swap that sells `token_in`
    pub fn oriented_reserves(&self, token_in: &str) -> Option<(f64, f64)> {
        let token_in = normalize_symbol(token_in);
        if normalize_symbol(&self.token0) == token_in {
            Some((self.reserve0, self.reserve1))
        } else if normalize_symbol(&self.token1) == token_in {
            Some((self.reserve1, self.reserve0))
        } else {
            None
        }
    }

    /// Output-per-input spot rate when selling `token_in`
    pub fn spot_rate(&self, token_in: &str) -> Option<f64> {
        let (reserve_in, reserve_out) = self.oriented_reserves(token_in)?;
        if reserve_in > 0.0 {
            Some(reserve_out / reserve_in)
        } else {
            None
        }
    }

    pub fn decimals(&self) -> (u8, u8) {
        (
            self.token0_decimals.unwrap_or_else(|| decimals_for(&self.token0)),
            self.token1_decimals.unwrap_or_else(|| decimals_for(&self.token1)),
        )
    }

    /// Decode the pool's own sqrt price, if it carries one
    pub fn decoded_price(&self) -> Option<RouteResult<DecodedPrice>> {
        let raw = self.sqrt_price_x96.as_deref()?;
        let (d0, d1) = self.decimals();
        Some(decode_sqrt_price_str(raw, d0, d1))
    }
}

/// A swap to route across chains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub amount_in: f64,
    pub token_in: String,
    pub token_out: String,

    /// Chain id -> candidate pools, already filtered to the pair
    pub pools: BTreeMap<String, Vec<PoolSnapshot>>,

    /// Externally proposed split (chain id -> amount), checked and repaired
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_allocation: Option<BTreeMap<String, f64>>,

    #[serde(default = "default_usd_price")]
    pub token_in_usd: f64,

    #[serde(default = "default_usd_price")]
    pub token_out_usd: f64,
}

impl SwapRequest {
    pub fn new(amount_in: f64, token_in: &str, token_out: &str) -> Self {
        Self {
            amount_in,
            token_in: token_in.to_string(),
            token_out: token_out.to_string(),
            pools: BTreeMap::new(),
            preferred_allocation: None,
            token_in_usd: 1.0,
            token_out_usd: 1.0,
        }
    }

    /// Add a pool under its own chain id
    pub fn with_pool(mut self, pool: PoolSnapshot) -> Self {
        self.pools.entry(pool.chain.clone()).or_default().push(pool);
        self
    }

    pub fn with_preferred_allocation(mut self, allocation: BTreeMap<String, f64>) -> Self {
        self.preferred_allocation = Some(allocation);
        self
    }

    pub fn with_usd_prices(mut self, token_in_usd: f64, token_out_usd: f64) -> Self {
        self.token_in_usd = token_in_usd;
        self.token_out_usd = token_out_usd;
        self
    }

    pub fn pool_count(&self) -> usize {
        self.pools.values().map(Vec::len).sum()
    }

    /// Reject requests the optimizer can't start on
    pub fn validate(&self) -> RouteResult<()> {
        if !self.amount_in.is_finite() || self.amount_in <= 0.0 {
            return Err(RouteError::invalid(format!(
                "swap amount must be positive, got {}",
                self.amount_in
            )));
        }
        if self.token_in.trim().is_empty() || self.token_out.trim().is_empty() {
            return Err(RouteError::invalid("token symbols must not be empty"));
        }
        if same_asset(&self.token_in, &self.token_out) {
            return Err(RouteError::invalid(format!(
                "{} and {} are the same asset",
                self.token_in, self.token_out
            )));
        }
        if self.pool_count() == 0 {
            return Err(RouteError::invalid("pool snapshot is empty"));
        }
        for (label, price) in [("token_in_usd", self.token_in_usd), ("token_out_usd", self.token_out_usd)] {
            if !price.is_finite() || price <= 0.0 {
                return Err(RouteError::invalid(format!("{} must be positive, got {}", label, price)));
            }
        }
        Ok(())
    }
}

/// The optimizer's view of one chain: its active pool, oriented for the swap
#[derive(Debug, Clone, PartialEq)]
pub struct ChainLane {
    pub chain: String,
    pub pool: PoolSnapshot,
    pub reserve_in: f64,
    pub reserve_out: f64,
    pub fee: f64,
}

impl ChainLane {
    /// Pick the highest-TVL usable pool on a chain (first one wins ties)
    pub fn select(chain: &str, pools: &[PoolSnapshot], token_in: &str, token_out: &str) -> Option<Self> {
        let mut best: Option<&PoolSnapshot> = None;

        for pool in pools {
            if !pool.has_liquidity() || !pool.matches_pair(token_in, token_out) {
                continue;
            }
            match best {
                Some(current) if pool.tvl_usd <= current.tvl_usd => {}
                _ => best = Some(pool),
            }
        }

        let pool = best?;
        let (reserve_in, reserve_out) = pool.oriented_reserves(token_in)?;
        Some(Self {
            chain: chain.to_string(),
            pool: pool.clone(),
            reserve_in,
            reserve_out,
            fee: pool.fee_fraction(),
        })
    }

    /// Output-per-input spot rate of the lane's pool
    pub fn spot_rate(&self) -> f64 {
        self.reserve_out / self.reserve_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weth_usdc(chain: &str, address: &str, tvl: f64) -> PoolSnapshot {
        PoolSnapshot::new(chain, address, "WETH", "USDC", 30, 1_000.0, 3_000_000.0).with_tvl(tvl)
    }

    #[test]
    fn test_pair_matching_normalizes_native() {
        let pool = weth_usdc("base", "0x1", 1e6);
        assert!(pool.matches_pair("ETH", "USDC"));
        assert!(pool.matches_pair("usdc", "weth"));
        assert!(!pool.matches_pair("ETH", "DAI"));
    }

    #[test]
    fn test_oriented_reserves() {
        let pool = weth_usdc("base", "0x1", 1e6);
        assert_eq!(pool.oriented_reserves("ETH"), Some((1_000.0, 3_000_000.0)));
        assert_eq!(pool.oriented_reserves("USDC"), Some((3_000_000.0, 1_000.0)));
        assert_eq!(pool.oriented_reserves("DAI"), None);
        assert_eq!(pool.spot_rate("ETH"), Some(3_000.0));
    }

    #[test]
    fn test_lane_picks_highest_tvl() {
        let pools = vec![
            weth_usdc("arbitrum", "0xa", 5e6),
            weth_usdc("arbitrum", "0xb", 9e6),
            weth_usdc("arbitrum", "0xc", 9e6),
        ];
        let lane = ChainLane::select("arbitrum", &pools, "ETH", "USDC").unwrap();
        assert_eq!(lane.pool.address, "0xb");
        assert_eq!(lane.reserve_in, 1_000.0);
        assert!((lane.fee - 0.003).abs() < 1e-12);
    }

    #[test]
    fn test_lane_skips_empty_pools() {
        let mut dry = weth_usdc("polygon", "0xdry", 1e9);
        dry.reserve1 = 0.0;
        let pools = vec![dry.clone(), weth_usdc("polygon", "0xwet", 1e3)];
        let lane = ChainLane::select("polygon", &pools, "ETH", "USDC").unwrap();
        assert_eq!(lane.pool.address, "0xwet");
        assert!(ChainLane::select("polygon", &[dry], "ETH", "USDC").is_none());
    }

    #[test]
    fn test_request_validation() {
        let request = SwapRequest::new(0.0, "ETH", "USDC").with_pool(weth_usdc("base", "0x1", 1e6));
        assert!(matches!(request.validate(), Err(RouteError::InvalidInput(_))));

        let request = SwapRequest::new(10.0, "ETH", "USDC");
        assert!(matches!(request.validate(), Err(RouteError::InvalidInput(_))));

        let request = SwapRequest::new(10.0, "WETH", "ETH").with_pool(weth_usdc("base", "0x1", 1e6));
        assert!(matches!(request.validate(), Err(RouteError::InvalidInput(_))));

        let request = SwapRequest::new(10.0, "ETH", "USDC").with_pool(weth_usdc("base", "0x1", 1e6));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_request_json_defaults() {
        let json = r#"{
            "amount_in": 5.0,
            "token_in": "ETH",
            "token_out": "USDC",
            "pools": {
                "base": [{
                    "chain": "base", "address": "0x1", "token0": "WETH", "token1": "USDC",
                    "fee_bps": 5, "reserve0": 100.0, "reserve1": 300000.0, "tvl_usd": 600000.0
                }]
            }
        }"#;
        let request: SwapRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.token_in_usd, 1.0);
        assert!(request.preferred_allocation.is_none());
        assert_eq!(request.pools["base"][0].sqrt_price_x96, None);
    }

    #[test]
    fn test_pool_decoded_price() {
        let pool = PoolSnapshot::new("ethereum", "0x88e6", "USDC", "WETH", 5, 1.0, 1.0)
            .with_sqrt_price("1584563250285286751870879006720000", 200_000);
        let decoded = pool.decoded_price().unwrap().unwrap();
        assert!((decoded.token0_per_token1 - 2500.0).abs() < 1e-3);
        assert!(weth_usdc("base", "0x1", 1.0).decoded_price().is_none());
    }
}
