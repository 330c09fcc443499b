//! Allocation Optimizer
//!
//! Greedy water-filling across chains:
//! 1. Every active chain bids its marginal cost for the next step
//! 2. The cheapest chain takes the step, unless that would push its price
//!    impact over the slippage ceiling, in which case it is evicted for good
//!    and its volume goes back into the pot
//! 3. Increments are capped at what remains, so every unit placed by the
//!    loop has passed the ceiling check
//! 4. Whatever the iteration cap leaves over is spread pro rata, then pulled
//!    back off any chain it pushed over the ceiling while another chain still
//!    has headroom
//!
//! An externally proposed allocation can seed the state; it is checked
//! against the ceiling and repaired by the same loop instead of trusted.

use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::marginal::{MarginalCost, MarginalCostEstimator};
use crate::cartographer::{ChainLane, SwapRequest};
use crate::config::RouterConfig;
use crate::error::{RouteError, RouteResult};
use crate::simulator::{max_input_within_impact, simulate_swap};

/// Final allocation handed to the planner
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationPlan {
    pub amount_in: f64,

    /// Chain -> amount, for every chain still active at the end
    pub allocations: BTreeMap<String, f64>,

    /// Active pool per chain (evicted chains included)
    pub lanes: BTreeMap<String, ChainLane>,

    /// Evicted chains, in eviction order
    pub evicted: Vec<String>,

    pub iterations: usize,

    /// Volume placed by the pro-rata remainder step
    pub remainder_distributed: f64,

    /// Volume moved off breaching chains after the remainder step
    pub rebalanced: f64,

    /// Started from a preferred allocation
    pub seeded: bool,

    /// Chains left above the ceiling by the remainder step (only when no
    /// other active chain had headroom)
    pub ceiling_breaches: Vec<String>,
}

impl AllocationPlan {
    pub fn total_allocated(&self) -> f64 {
        self.allocations.values().sum()
    }

    /// Chains carrying volume, with their lane
    pub fn funded(&self) -> impl Iterator<Item = (&ChainLane, f64)> + '_ {
        self.allocations
            .iter()
            .filter(|(_, amount)| **amount > 0.0)
            .filter_map(move |(chain, amount)| self.lanes.get(chain).map(|lane| (lane, *amount)))
    }
}

/// Mutable per-call state
struct AllocationState {
    allocations: BTreeMap<String, f64>,
    active: Vec<String>,
    evicted: Vec<String>,
    remaining: f64,
}

impl AllocationState {
    fn new(lanes: &BTreeMap<String, ChainLane>, amount: f64) -> Self {
        Self {
            allocations: lanes.keys().map(|chain| (chain.clone(), 0.0)).collect(),
            active: lanes.keys().cloned().collect(),
            evicted: Vec::new(),
            remaining: amount,
        }
    }

    fn allocated(&self, chain: &str) -> f64 {
        self.allocations.get(chain).copied().unwrap_or(0.0)
    }

    fn add(&mut self, chain: &str, amount: f64) {
        *self.allocations.entry(chain.to_string()).or_insert(0.0) += amount;
        self.remaining -= amount;
    }

    /// Drop a chain for good and return its volume to the pot
    fn evict(&mut self, chain: &str) {
        let returned = self.allocations.remove(chain).unwrap_or(0.0);
        self.remaining += returned;
        self.active.retain(|c| c != chain);
        self.evicted.push(chain.to_string());
    }
}

/// Fraction shaved off a chain's ceiling capacity when refilling it
const CAPACITY_MARGIN: f64 = 1e-9;

pub struct AllocationOptimizer<'a> {
    config: &'a RouterConfig,
}

impl<'a> AllocationOptimizer<'a> {
    pub fn new(config: &'a RouterConfig) -> Self {
        Self { config }
    }

    /// One lane per chain with a usable pool for the pair
    pub fn build_lanes(request: &SwapRequest) -> BTreeMap<String, ChainLane> {
        let mut lanes = BTreeMap::new();
        for (chain, pools) in &request.pools {
            match ChainLane::select(chain, pools, &request.token_in, &request.token_out) {
                Some(lane) => {
                    debug!(
                        "{}: active pool {} (TVL ${:.0}, fee {} bps)",
                        chain, lane.pool.address, lane.pool.tvl_usd, lane.pool.fee_bps
                    );
                    lanes.insert(chain.clone(), lane);
                }
                None => debug!("{}: no usable {}/{} pool", chain, request.token_in, request.token_out),
            }
        }
        lanes
    }

    pub fn optimize(&self, request: &SwapRequest) -> RouteResult<AllocationPlan> {
        self.config.validate()?;
        request.validate()?;

        let lanes = Self::build_lanes(request);
        if lanes.is_empty() {
            return Err(RouteError::no_route(format!(
                "no chain has a usable {}/{} pool",
                request.token_in, request.token_out
            )));
        }

        info!(
            "Routing {:.4} {} → {} across {} chain(s)",
            request.amount_in, request.token_in, request.token_out, lanes.len()
        );

        let mut state = AllocationState::new(&lanes, request.amount_in);

        let seeded = match &request.preferred_allocation {
            Some(preferred) => {
                self.apply_seed(&mut state, &lanes, preferred, request.amount_in);
                true
            }
            None => false,
        };

        let iterations = self.fill(&mut state, &lanes, request.token_in_usd);

        if state.active.is_empty() {
            return Err(RouteError::no_route(format!(
                "all {} chain(s) evicted by the {:.2}% slippage ceiling",
                state.evicted.len(),
                self.config.slippage_ceiling_pct
            )));
        }

        let remainder_distributed = Self::distribute_remainder(&mut state);
        let rebalanced = self.rebalance_breaches(&mut state, &lanes);
        let ceiling_breaches = self.find_ceiling_breaches(&state, &lanes);

        let plan = AllocationPlan {
            amount_in: request.amount_in,
            allocations: state.allocations,
            lanes,
            evicted: state.evicted,
            iterations,
            remainder_distributed,
            rebalanced,
            seeded,
            ceiling_breaches,
        };

        info!(
            "Allocation done in {} iteration(s): {} funded chain(s), {} evicted",
            plan.iterations,
            plan.funded().count(),
            plan.evicted.len()
        );

        Ok(plan)
    }

    /// Load a preferred allocation and evict any seeded chain over the ceiling
    fn apply_seed(
        &self,
        state: &mut AllocationState,
        lanes: &BTreeMap<String, ChainLane>,
        preferred: &BTreeMap<String, f64>,
        amount: f64,
    ) {
        let mut seeds = Vec::new();
        for (chain, seed) in preferred {
            if !seed.is_finite() || *seed <= 0.0 {
                warn!("Ignoring preferred allocation {} for {}", seed, chain);
                continue;
            }
            if !lanes.contains_key(chain) {
                warn!("Ignoring preferred allocation for {}: no usable pool", chain);
                continue;
            }
            seeds.push((chain.clone(), *seed));
        }

        let seed_total: f64 = seeds.iter().map(|(_, seed)| seed).sum();
        let scale = if seed_total > amount { amount / seed_total } else { 1.0 };
        if scale < 1.0 {
            warn!(
                "Preferred allocation totals {:.4}, more than {:.4}; scaling down",
                seed_total, amount
            );
        }

        for (chain, seed) in &seeds {
            state.add(chain, seed * scale);
        }
        state.remaining = state.remaining.max(0.0);

        for (chain, _) in &seeds {
            let Some(lane) = lanes.get(chain) else { continue };
            let allocated = state.allocated(chain);
            match simulate_swap(allocated, lane.reserve_in, lane.reserve_out, lane.fee) {
                Ok(result) if result.price_impact_percent <= self.config.slippage_ceiling_pct => {
                    debug!(
                        "Seed {} = {:.4} ok ({:.4}% impact)",
                        chain, allocated, result.price_impact_percent
                    );
                }
                Ok(result) => {
                    warn!(
                        "Seed {} = {:.4} breaches ceiling ({:.4}% > {:.2}%), evicting",
                        chain, allocated, result.price_impact_percent, self.config.slippage_ceiling_pct
                    );
                    state.evict(chain);
                }
                Err(e) => {
                    warn!("Seed {} failed to simulate: {}, evicting", chain, e);
                    state.evict(chain);
                }
            }
        }
    }

    /// The greedy loop. Returns the number of rounds run.
    fn fill(
        &self,
        state: &mut AllocationState,
        lanes: &BTreeMap<String, ChainLane>,
        token_in_usd: f64,
    ) -> usize {
        // Step is a USD chunk; the loop works in input-token units
        let step = self.config.allocation_step / token_in_usd;
        let ceiling = self.config.slippage_ceiling_pct;
        let estimator = MarginalCostEstimator::new(step, token_in_usd, &self.config.gas);
        let mut iterations = 0;

        while iterations < self.config.max_iterations
            && state.remaining > self.config.min_remaining_amount
            && !state.active.is_empty()
        {
            iterations += 1;

            // Cheapest bid wins; first chain in order wins ties
            let mut best: Option<(String, f64)> = None;
            for chain in &state.active {
                let Some(lane) = lanes.get(chain) else { continue };
                let cost = estimator.estimate(lane, state.allocated(chain));
                if let MarginalCost::Ineligible(e) = &cost {
                    debug!("{} sits out this round: {}", chain, e);
                }
                let value = cost.value();
                let better = match &best {
                    Some((_, best_cost)) => value < *best_cost,
                    None => value.is_finite(),
                };
                if better {
                    best = Some((chain.clone(), value));
                }
            }

            let Some((chain, cost)) = best else {
                warn!("No chain can take another step; {:.4} left", state.remaining);
                break;
            };
            let Some(lane) = lanes.get(&chain) else { break };

            let increment = step.min(state.remaining);
            let tentative = state.allocated(&chain) + increment;

            match simulate_swap(tentative, lane.reserve_in, lane.reserve_out, lane.fee) {
                Ok(result) if result.price_impact_percent <= ceiling => {
                    debug!(
                        "#{} {} +{:.4} (marginal {:.4}%, impact {:.4}%)",
                        iterations, chain, increment, cost, result.price_impact_percent
                    );
                    state.add(&chain, increment);
                }
                Ok(result) => {
                    warn!(
                        "Evicting {}: {:.4} would hit {:.4}% impact (ceiling {:.2}%), returning {:.4}",
                        chain, tentative, result.price_impact_percent, ceiling, state.allocated(&chain)
                    );
                    state.evict(&chain);
                }
                Err(e) => {
                    warn!("Evicting {}: {}", chain, e);
                    state.evict(&chain);
                }
            }
        }

        iterations
    }

    /// Spread what's left pro rata (evenly if nothing was allocated yet)
    fn distribute_remainder(state: &mut AllocationState) -> f64 {
        let remaining = state.remaining;
        if remaining <= 0.0 || state.active.is_empty() {
            state.remaining = remaining.max(0.0);
            return 0.0;
        }

        let active = state.active.clone();
        let allocated: f64 = active.iter().map(|chain| state.allocated(chain)).sum();

        for chain in &active {
            let share = if allocated > 0.0 {
                state.allocated(chain) / allocated
            } else {
                1.0 / active.len() as f64
            };
            *state.allocations.entry(chain.clone()).or_insert(0.0) += remaining * share;
        }
        state.remaining = 0.0;

        debug!("Distributed remainder {:.6} across {} chain(s)", remaining, active.len());
        remaining
    }

    /// Move volume off chains the remainder pushed over the ceiling onto
    /// active chains with headroom (empty ones included), in proportion to
    /// that headroom. A sole active chain keeps its breach.
    fn rebalance_breaches(
        &self,
        state: &mut AllocationState,
        lanes: &BTreeMap<String, ChainLane>,
    ) -> f64 {
        if state.active.len() < 2 {
            return 0.0;
        }

        let ceiling = self.config.slippage_ceiling_pct;
        let mut excess = 0.0;
        let mut headroom: Vec<(String, f64)> = Vec::new();

        for chain in &state.active {
            let Some(lane) = lanes.get(chain) else { continue };
            let amount = state.allocated(chain);
            // Shaved so float error can't land a refilled chain a hair over
            let capacity = max_input_within_impact(lane.reserve_in, lane.fee, ceiling)
                * (1.0 - CAPACITY_MARGIN);

            let breached = amount > 0.0
                && simulate_swap(amount, lane.reserve_in, lane.reserve_out, lane.fee)
                    .map(|r| r.price_impact_percent > ceiling)
                    .unwrap_or(false);

            if breached {
                excess += amount - capacity;
                state.allocations.insert(chain.clone(), capacity);
            } else if capacity > amount {
                headroom.push((chain.clone(), capacity - amount));
            }
        }

        if excess <= 0.0 {
            return 0.0;
        }

        let total_headroom: f64 = headroom.iter().map(|(_, room)| room).sum();
        let placed = excess.min(total_headroom);
        if total_headroom > 0.0 {
            for (chain, room) in &headroom {
                *state.allocations.entry(chain.clone()).or_insert(0.0) +=
                    placed * room / total_headroom;
            }
        }

        // Nowhere left to put it: spread back pro rata and let the breach show
        let unplaced = excess - placed;
        if unplaced > 0.0 {
            warn!("{:.6} exceeds every chain's headroom, spreading it back", unplaced);
            state.remaining += unplaced;
            Self::distribute_remainder(state);
        }

        debug!(
            "Rebalanced {:.6} off breaching chain(s) across {} chain(s) with headroom",
            placed,
            headroom.len()
        );
        placed
    }

    /// Report chains still above the ceiling after rebalancing
    fn find_ceiling_breaches(
        &self,
        state: &AllocationState,
        lanes: &BTreeMap<String, ChainLane>,
    ) -> Vec<String> {
        let mut breaches = Vec::new();
        for chain in &state.active {
            let amount = state.allocated(chain);
            let Some(lane) = lanes.get(chain) else { continue };
            if amount <= 0.0 {
                continue;
            }
            if let Ok(result) = simulate_swap(amount, lane.reserve_in, lane.reserve_out, lane.fee) {
                if result.price_impact_percent > self.config.slippage_ceiling_pct {
                    warn!(
                        "{} ends at {:.4}% impact, above the {:.2}% ceiling{}",
                        chain,
                        result.price_impact_percent,
                        self.config.slippage_ceiling_pct,
                        if state.active.len() == 1 { " (sole remaining chain)" } else { "" }
                    );
                    breaches.push(chain.clone());
                }
            }
        }
        breaches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartographer::PoolSnapshot;
    use crate::gas::{ChainCosts, GasTable};
    use proptest::prelude::*;

    fn pool(chain: &str, reserve: f64, fee_bps: u32) -> PoolSnapshot {
        PoolSnapshot::new(chain, &format!("0x{}", chain), "WETH", "USDC", fee_bps, reserve, reserve)
            .with_tvl(reserve * 2.0)
    }

    fn config(step: f64, gas_usd: f64) -> RouterConfig {
        RouterConfig {
            allocation_step: step,
            gas: GasTable {
                chains: BTreeMap::new(),
                fallback: ChainCosts::new(gas_usd, 2.0),
            },
            ..RouterConfig::default()
        }
    }

    fn optimize(request: &SwapRequest, config: &RouterConfig) -> RouteResult<AllocationPlan> {
        AllocationOptimizer::new(config).optimize(request)
    }

    #[test]
    fn test_zero_amount_is_invalid() {
        let request = SwapRequest::new(0.0, "ETH", "USDC").with_pool(pool("base", 1e7, 30));
        let err = optimize(&request, &config(1_000.0, 0.0)).unwrap_err();
        assert!(matches!(err, RouteError::InvalidInput(_)));
    }

    #[test]
    fn test_empty_snapshot_is_invalid() {
        let request = SwapRequest::new(10.0, "ETH", "USDC");
        let err = optimize(&request, &config(1_000.0, 0.0)).unwrap_err();
        assert!(matches!(err, RouteError::InvalidInput(_)));
    }

    #[test]
    fn test_single_deep_chain_takes_everything() {
        let request = SwapRequest::new(100_000.0, "ETH", "USDC").with_pool(pool("ethereum", 1e9, 5));
        let cfg = config(1_000.0, 15.0);
        let plan = optimize(&request, &cfg).unwrap();

        assert_eq!(plan.allocations.len(), 1);
        assert!((plan.allocations["ethereum"] - 100_000.0).abs() < 1e-6);
        let lane = &plan.lanes["ethereum"];
        let result = simulate_swap(100_000.0, lane.reserve_in, lane.reserve_out, lane.fee).unwrap();
        assert!(result.price_impact_percent < 0.1);
    }

    #[test]
    fn test_equal_chains_split_evenly() {
        let request = SwapRequest::new(300_000.0, "ETH", "USDC")
            .with_pool(pool("arbitrum", 1e7, 30))
            .with_pool(pool("base", 1e7, 30))
            .with_pool(pool("optimism", 1e7, 30));
        let cfg = config(10_000.0, 0.5);
        let plan = optimize(&request, &cfg).unwrap();

        for chain in ["arbitrum", "base", "optimism"] {
            let amount = plan.allocations[chain];
            assert!((amount - 100_000.0).abs() <= 10_000.0, "{} got {}", chain, amount);
        }
        assert!(plan.evicted.is_empty());
    }

    #[test]
    fn test_dry_chain_never_routed() {
        let mut dry = pool("polygon", 1e7, 30);
        dry.reserve1 = 0.0;
        let request = SwapRequest::new(50_000.0, "ETH", "USDC")
            .with_pool(dry)
            .with_pool(pool("arbitrum", 1e7, 30));
        let plan = optimize(&request, &config(1_000.0, 0.0)).unwrap();

        assert!(!plan.allocations.contains_key("polygon"));
        assert!(!plan.lanes.contains_key("polygon"));
        assert!((plan.total_allocated() - 50_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_only_dry_chain_is_no_route() {
        let mut dry = pool("polygon", 1e7, 30);
        dry.reserve1 = 0.0;
        let request = SwapRequest::new(50_000.0, "ETH", "USDC").with_pool(dry);
        let err = optimize(&request, &config(1_000.0, 0.0)).unwrap_err();
        assert!(matches!(err, RouteError::NoValidRoute(_)));
    }

    #[test]
    fn test_chain_over_ceiling_is_evicted() {
        // shallow: no fee but 3.125% impact on the first step
        let request = SwapRequest::new(200_000.0, "ETH", "USDC")
            .with_pool(pool("deep", 1e7, 30))
            .with_pool(pool("shallow", 3.2e6, 0));
        let plan = optimize(&request, &config(100_000.0, 0.0)).unwrap();

        assert_eq!(plan.evicted, vec!["shallow".to_string()]);
        assert!((plan.allocations["deep"] - 200_000.0).abs() < 1e-6);
        assert!(plan.ceiling_breaches.is_empty());
    }

    #[test]
    fn test_everything_evicted_is_no_route() {
        let request = SwapRequest::new(200_000.0, "ETH", "USDC").with_pool(pool("shallow", 3.2e6, 0));
        let err = optimize(&request, &config(100_000.0, 0.0)).unwrap_err();
        assert!(matches!(err, RouteError::NoValidRoute(_)));
    }

    #[test]
    fn test_partial_last_step_is_checked() {
        // two full steps fit (2.3% impact), a 90k third would reach ~3.2%
        let request = SwapRequest::new(290_000.0, "ETH", "USDC").with_pool(pool("solo", 1e7, 30));
        let err = optimize(&request, &config(100_000.0, 0.0)).unwrap_err();
        assert!(matches!(err, RouteError::NoValidRoute(_)));
    }

    #[test]
    fn test_remainder_can_breach_ceiling_on_sole_chain() {
        // the iteration cap stops after two steps, the 90k remainder has nowhere else to go
        let request = SwapRequest::new(290_000.0, "ETH", "USDC").with_pool(pool("solo", 1e7, 30));
        let cfg = RouterConfig { max_iterations: 2, ..config(100_000.0, 0.0) };
        let plan = optimize(&request, &cfg).unwrap();

        assert!((plan.allocations["solo"] - 290_000.0).abs() < 1e-6);
        assert!((plan.remainder_distributed - 90_000.0).abs() < 1e-6);
        assert_eq!(plan.ceiling_breaches, vec!["solo".to_string()]);
    }

    #[test]
    fn test_remainder_breach_moves_to_chain_with_headroom() {
        // "b" is free but shallow, "a" is deep but gas makes it lose every bid
        let request = SwapRequest::new(29.0, "ETH", "USDC")
            .with_pool(pool("a", 1e6, 0))
            .with_pool(pool("b", 1_000.0, 0));
        let cfg = RouterConfig {
            slippage_ceiling_pct: 2.5,
            max_iterations: 2,
            allocation_step: 10.0,
            gas: GasTable::empty()
                .with_chain("a", ChainCosts::new(50.0, 2.0))
                .with_chain("b", ChainCosts::new(0.0, 2.0)),
            ..RouterConfig::default()
        };
        let plan = optimize(&request, &cfg).unwrap();

        assert!((plan.remainder_distributed - 9.0).abs() < 1e-9);
        assert!((plan.rebalanced - 4.0).abs() < 1e-6, "{}", plan.rebalanced);
        assert!(plan.ceiling_breaches.is_empty());
        assert!((plan.allocations["b"] - 25.0).abs() < 1e-6);
        assert!((plan.allocations["a"] - 4.0).abs() < 1e-6);
        assert!((plan.total_allocated() - 29.0).abs() < 1e-9);

        let lane = &plan.lanes["b"];
        let result = simulate_swap(plan.allocations["b"], lane.reserve_in, lane.reserve_out, lane.fee).unwrap();
        assert!(result.price_impact_percent <= 2.5);
    }

    #[test]
    fn test_default_step_is_usd() {
        // 1000 USD steps are a third of an ETH, so 100 ETH still walks the greedy loop
        let request = SwapRequest::new(100.0, "ETH", "USDC")
            .with_pool(
                PoolSnapshot::new("ethereum", "0xeth", "WETH", "USDC", 30, 50_000.0, 150_000_000.0)
                    .with_tvl(3e8),
            )
            .with_pool(
                PoolSnapshot::new("base", "0xbase", "WETH", "USDC", 30, 500.0, 1_500_000.0)
                    .with_tvl(3e6),
            )
            .with_usd_prices(3_000.0, 1.0);
        let cfg = RouterConfig::default();
        let plan = optimize(&request, &cfg).unwrap();

        assert!(plan.iterations > 100, "{}", plan.iterations);
        assert!(plan.remainder_distributed < 1e-6);
        assert!(plan.ceiling_breaches.is_empty());
        assert!((plan.total_allocated() - 100.0).abs() < 1e-9);
        for (lane, amount) in plan.funded() {
            let result = simulate_swap(amount, lane.reserve_in, lane.reserve_out, lane.fee).unwrap();
            assert!(result.price_impact_percent <= cfg.slippage_ceiling_pct, "{} {}", lane.chain, amount);
        }
    }

    #[test]
    fn test_iteration_cap_hands_rest_to_remainder() {
        let request = SwapRequest::new(1_000_000.0, "ETH", "USDC").with_pool(pool("ethereum", 1e9, 5));
        let cfg = RouterConfig { max_iterations: 3, ..config(10_000.0, 0.0) };
        let plan = optimize(&request, &cfg).unwrap();

        assert_eq!(plan.iterations, 3);
        assert!((plan.remainder_distributed - 970_000.0).abs() < 1e-6);
        assert!((plan.total_allocated() - 1_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_ties_go_to_first_chain() {
        let request = SwapRequest::new(1_000.0, "ETH", "USDC")
            .with_pool(pool("alpha", 1e7, 30))
            .with_pool(pool("beta", 1e7, 30));
        let plan = optimize(&request, &config(1_000.0, 0.0)).unwrap();

        assert_eq!(plan.allocations["alpha"], 1_000.0);
        assert_eq!(plan.allocations["beta"], 0.0);
        assert_eq!(plan.funded().count(), 1);
    }

    #[test]
    fn test_allocations_sum_to_request() {
        let request = SwapRequest::new(123_456.789, "ETH", "USDC")
            .with_pool(pool("arbitrum", 4e6, 30))
            .with_pool(pool("base", 9e6, 5))
            .with_pool(pool("ethereum", 5e7, 30))
            .with_pool(pool("polygon", 1e6, 100));
        let mut cfg = config(2_500.0, 0.0);
        cfg.gas = GasTable::default();
        let plan = optimize(&request, &cfg).unwrap();

        let total = plan.total_allocated();
        assert!((total - 123_456.789).abs() < 1e-6 * 123_456.789, "{}", total);
        assert!(plan.ceiling_breaches.is_empty());
    }

    #[test]
    fn test_valid_seed_is_kept() {
        let preferred: BTreeMap<String, f64> =
            [("arbitrum".to_string(), 150_000.0), ("base".to_string(), 150_000.0)].into();
        let request = SwapRequest::new(300_000.0, "ETH", "USDC")
            .with_pool(pool("arbitrum", 1e7, 30))
            .with_pool(pool("base", 1e7, 30))
            .with_pool(pool("optimism", 1e7, 30))
            .with_preferred_allocation(preferred);
        let plan = optimize(&request, &config(10_000.0, 0.0)).unwrap();

        assert!(plan.seeded);
        assert_eq!(plan.iterations, 0);
        assert_eq!(plan.allocations["arbitrum"], 150_000.0);
        assert_eq!(plan.allocations["base"], 150_000.0);
        assert_eq!(plan.allocations["optimism"], 0.0);
    }

    #[test]
    fn test_breaching_seed_is_repaired() {
        let preferred: BTreeMap<String, f64> = [("shallow".to_string(), 200_000.0)].into();
        let request = SwapRequest::new(200_000.0, "ETH", "USDC")
            .with_pool(pool("deep", 1e7, 30))
            .with_pool(pool("shallow", 3.2e6, 0))
            .with_preferred_allocation(preferred);
        let plan = optimize(&request, &config(100_000.0, 0.0)).unwrap();

        assert_eq!(plan.evicted, vec!["shallow".to_string()]);
        assert!((plan.allocations["deep"] - 200_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_oversized_and_unknown_seeds() {
        let preferred: BTreeMap<String, f64> = [
            ("deep".to_string(), 400_000.0),
            ("nowhere".to_string(), 50_000.0),
            ("shallow".to_string(), f64::NAN),
        ]
        .into();
        let request = SwapRequest::new(200_000.0, "ETH", "USDC")
            .with_pool(pool("deep", 1e7, 30))
            .with_pool(pool("shallow", 3.2e6, 0))
            .with_preferred_allocation(preferred);
        let plan = optimize(&request, &config(100_000.0, 0.0)).unwrap();

        assert!((plan.allocations["deep"] - 200_000.0).abs() < 1e-6);
        assert!(!plan.allocations.contains_key("nowhere"));
        assert_eq!(plan.iterations, 0);
    }

    proptest! {
        #[test]
        fn routes_stay_under_ceiling(
            amount in 1_000.0f64..150_000.0,
            step in 500.0f64..10_000.0,
            max_iterations in 1usize..400,
        ) {
            let request = SwapRequest::new(amount, "ETH", "USDC")
                .with_pool(pool("arbitrum", 1e7, 30))
                .with_pool(pool("base", 3e6, 5))
                .with_pool(pool("optimism", 5e5, 0));
            let cfg = RouterConfig { max_iterations, ..config(step, 0.5) };
            let plan = optimize(&request, &cfg).unwrap();

            prop_assert!((plan.total_allocated() - amount).abs() < 1e-6 * amount);
            prop_assert!(plan.ceiling_breaches.is_empty());
            for (lane, allocated) in plan.funded() {
                let result = simulate_swap(allocated, lane.reserve_in, lane.reserve_out, lane.fee).unwrap();
                prop_assert!(
                    result.price_impact_percent <= cfg.slippage_ceiling_pct + 1e-9,
                    "{} at {:.4}%", lane.chain, result.price_impact_percent
                );
            }
        }
    }
}
