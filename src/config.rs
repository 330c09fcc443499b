//! Router Configuration
//!
//! All knobs the optimizer reads, plus the JSONL recommendation log used by
//! the CLI. Loaded from environment (.env supported) or a TOML file.

use eyre::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{RouteError, RouteResult};
use crate::gas::GasTable;

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

// ============================================
// MAIN CONFIGURATION
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    // ========== Limits ==========
    /// Maximum price impact any single route may reach, percent
    pub slippage_ceiling_pct: f64,

    /// Total gas the caller is willing to spend, USD (reported, not enforced)
    pub max_gas_budget_usd: f64,

    // ========== Optimizer ==========
    /// Volume added per greedy step, USD (converted with the request's
    /// input token price)
    pub allocation_step: f64,

    /// Hard cap on optimizer rounds
    pub max_iterations: usize,

    /// The loop stops once this little is left unallocated
    pub min_remaining_amount: f64,

    // ========== Diagnostics ==========
    /// TVL above which a balanced pool is labelled "good"
    pub healthy_tvl_floor_usd: f64,

    // ========== Logging ==========
    /// Append every recommendation to a JSONL file
    pub recommendation_log: bool,

    pub recommendation_log_path: String,

    // ========== Chains ==========
    /// Per-chain gas cost and execution time (kept last: TOML tables follow values)
    pub gas: GasTable,
}

impl RouterConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let config = Self {
            slippage_ceiling_pct: env_or("SLIPPAGE_CEILING_PCT", defaults.slippage_ceiling_pct),
            max_gas_budget_usd: env_or("MAX_GAS_BUDGET_USD", defaults.max_gas_budget_usd),
            allocation_step: env_or("ALLOCATION_STEP", defaults.allocation_step),
            max_iterations: env_or("MAX_ITERATIONS", defaults.max_iterations),
            min_remaining_amount: env_or("MIN_REMAINING_AMOUNT", defaults.min_remaining_amount),
            healthy_tvl_floor_usd: env_or("HEALTHY_TVL_FLOOR_USD", defaults.healthy_tvl_floor_usd),
            recommendation_log: env_or("RECOMMENDATION_LOG", defaults.recommendation_log),
            recommendation_log_path: env::var("RECOMMENDATION_LOG_PATH")
                .unwrap_or(defaults.recommendation_log_path),
            gas: defaults.gas,
        };

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the optimizer can't run with
    pub fn validate(&self) -> RouteResult<()> {
        if !(self.slippage_ceiling_pct > 0.0) || !self.slippage_ceiling_pct.is_finite() {
            return Err(RouteError::invalid(format!(
                "slippage ceiling must be positive (currently {})",
                self.slippage_ceiling_pct
            )));
        }
        if !(self.allocation_step > 0.0) || !self.allocation_step.is_finite() {
            return Err(RouteError::invalid(format!(
                "allocation step must be positive (currently {})",
                self.allocation_step
            )));
        }
        if self.max_iterations == 0 {
            return Err(RouteError::invalid("max_iterations must be at least 1"));
        }
        if self.min_remaining_amount < 0.0 || !self.min_remaining_amount.is_finite() {
            return Err(RouteError::invalid(format!(
                "min_remaining_amount must be >= 0 (currently {})",
                self.min_remaining_amount
            )));
        }
        let entries = self
            .gas
            .chains
            .iter()
            .map(|(chain, costs)| (chain.as_str(), costs))
            .chain(std::iter::once(("fallback", &self.gas.fallback)));
        for (chain, costs) in entries {
            let usable = |v: f64| v.is_finite() && v >= 0.0;
            if !usable(costs.gas_cost_usd) || !usable(costs.execution_time_secs) {
                return Err(RouteError::invalid(format!(
                    "gas entry for {} must be finite and >= 0 ({} USD, {} s)",
                    chain, costs.gas_cost_usd, costs.execution_time_secs
                )));
            }
        }
        Ok(())
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("╔════════════════════════════════════════════════════════════╗");
        println!("║              CROSSROUTE - CONFIGURATION                    ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ LIMITS                                                     ║");
        println!("║ • Slippage Ceiling: {:>37.2}% ║", self.slippage_ceiling_pct);
        println!("║ • Gas Budget:      ${:<38.2} ║", self.max_gas_budget_usd);
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ OPTIMIZER                                                  ║");
        println!("║ • Step Size:       ${:<38.2} ║", self.allocation_step);
        println!("║ • Max Iterations:  {:<39} ║", self.max_iterations);
        println!("║ • Healthy TVL:     ${:<38.0} ║", self.healthy_tvl_floor_usd);
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ CHAINS                                                     ║");
        for (chain, costs) in &self.gas.chains {
            println!(
                "║ • {:<16} gas ${:<10.2} time {:>10.1}s          ║",
                chain, costs.gas_cost_usd, costs.execution_time_secs
            );
        }
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ • Recommendation Log: {:^36} ║",
            if self.recommendation_log { "✓ Enabled" } else { "✗ Disabled" }
        );
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            slippage_ceiling_pct: 3.0,
            max_gas_budget_usd: 100.0,
            allocation_step: 1_000.0,
            max_iterations: 1_000,
            min_remaining_amount: 1e-9,
            healthy_tvl_floor_usd: 1_000_000.0,
            recommendation_log: false,
            recommendation_log_path: "./logs/recommendations.log".to_string(),
            gas: GasTable::default(),
        }
    }
}

// ============================================
// RECOMMENDATION LOGGER
// ============================================

use chrono::{DateTime, Utc};
use std::io::Write;

use crate::planner::SwapRecommendation;

/// One line of the recommendation log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationLog {
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub recommendation: SwapRecommendation,
}

impl RecommendationLog {
    pub fn new(source: &str, recommendation: SwapRecommendation) -> Self {
        Self {
            timestamp: Utc::now(),
            source: source.to_string(),
            recommendation,
        }
    }

    /// Append this log to a file
    pub fn append_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        // Create parent directories if needed
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        let json = serde_json::to_string(self)?;
        writeln!(file, "{}", json)?;

        Ok(())
    }
}

// ============================================
// TESTS
// ============================================
