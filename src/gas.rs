//! Per-chain gas and latency table
//!
//! Each route pays one swap's worth of gas on its own chain. Costs are kept in
//! USD so chains with different native assets compare directly.
//! Values come from configuration; the built-in table is only a starting point.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use tracing::trace;

// ============================================
// CONSTANTS
// ============================================

/// Fallback gas cost for chains missing from the table
const FALLBACK_GAS_COST_USD: f64 = 5.0;

/// Fallback execution time for chains missing from the table
const FALLBACK_EXECUTION_SECS: f64 = 30.0;

// ============================================
// CHAIN COSTS
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainCosts {
    /// Estimated cost of one swap, USD
    pub gas_cost_usd: f64,

    /// Estimated time to finality for one swap, seconds
    pub execution_time_secs: f64,
}

impl ChainCosts {
    pub fn new(gas_cost_usd: f64, execution_time_secs: f64) -> Self {
        Self { gas_cost_usd, execution_time_secs }
    }

    pub fn fallback() -> Self {
        Self::new(FALLBACK_GAS_COST_USD, FALLBACK_EXECUTION_SECS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CostSource {
    Configured,
    Fallback,
}

impl std::fmt::Display for CostSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CostSource::Configured => write!(f, "Configured"),
            CostSource::Fallback => write!(f, "Fallback"),
        }
    }
}

// ============================================
// GAS TABLE
// ============================================

/// Chain id -> swap costs, with a fallback for unknown chains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasTable {
    /// Keys are lower-cased on load so lookups ignore case
    #[serde(default, deserialize_with = "lowercase_chains")]
    pub chains: BTreeMap<String, ChainCosts>,

    #[serde(default = "ChainCosts::fallback")]
    pub fallback: ChainCosts,
}

fn lowercase_chains<'de, D>(deserializer: D) -> Result<BTreeMap<String, ChainCosts>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, ChainCosts>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(chain, costs)| (chain.to_lowercase(), costs))
        .collect())
}

impl GasTable {
    pub fn empty() -> Self {
        Self {
            chains: BTreeMap::new(),
            fallback: ChainCosts::fallback(),
        }
    }

    pub fn with_chain(mut self, chain: &str, costs: ChainCosts) -> Self {
        self.chains.insert(chain.to_lowercase(), costs);
        self
    }

    /// Costs for a chain and where they came from
    pub fn lookup(&self, chain: &str) -> (ChainCosts, CostSource) {
        match self.chains.get(&chain.to_lowercase()) {
            Some(costs) => (*costs, CostSource::Configured),
            None => {
                trace!("No gas entry for {}, using fallback", chain);
                (self.fallback, CostSource::Fallback)
            }
        }
    }

    pub fn costs(&self, chain: &str) -> ChainCosts {
        self.lookup(chain).0
    }

    pub fn gas_cost_usd(&self, chain: &str) -> f64 {
        self.costs(chain).gas_cost_usd
    }
}

impl Default for GasTable {
    fn default() -> Self {
        Self::empty()
            .with_chain("ethereum", ChainCosts::new(15.0, 15.0))
            .with_chain("arbitrum", ChainCosts::new(0.3, 2.0))
            .with_chain("optimism", ChainCosts::new(0.2, 2.0))
            .with_chain("base", ChainCosts::new(0.1, 2.0))
            .with_chain("polygon", ChainCosts::new(0.05, 5.0))
            .with_chain("bsc", ChainCosts::new(0.2, 3.0))
            .with_chain("avalanche", ChainCosts::new(0.3, 2.0))
            .with_chain("solana", ChainCosts::new(0.01, 1.0))
    }
}

// ============================================
// TESTS
// ============================================
