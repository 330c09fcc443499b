//! Marginal Cost Estimator
//!
//! Cost of pushing one more allocation step through a chain, in percent of
//! the step. Two parts:
//! - price impact cost: forward difference of `amount * impact%` over the step
//! - gas: the chain's swap cost spread over what the chain would carry

use tracing::trace;

use crate::cartographer::ChainLane;
use crate::error::RouteError;
use crate::gas::GasTable;
use crate::simulator::simulate_swap;

/// A chain's bid for the next step
#[derive(Debug, Clone, PartialEq)]
pub enum MarginalCost {
    Eligible(f64),
    /// The chain can't take the step this round (simulation failed)
    Ineligible(RouteError),
}

impl MarginalCost {
    /// Ineligible chains cost infinity, so they never win a comparison
    pub fn value(&self) -> f64 {
        match self {
            MarginalCost::Eligible(cost) => *cost,
            MarginalCost::Ineligible(_) => f64::INFINITY,
        }
    }

    pub fn is_eligible(&self) -> bool {
        matches!(self, MarginalCost::Eligible(_))
    }
}

pub struct MarginalCostEstimator<'a> {
    step: f64,
    token_in_usd: f64,
    gas: &'a GasTable,
}

impl<'a> MarginalCostEstimator<'a> {
    pub fn new(step: f64, token_in_usd: f64, gas: &'a GasTable) -> Self {
        Self { step, token_in_usd, gas }
    }

    /// `amount * impact%` for a lane, 0 for an empty allocation
    fn impact_cost(&self, lane: &ChainLane, amount: f64) -> Result<f64, RouteError> {
        if amount <= 0.0 {
            return Ok(0.0);
        }
        let result = simulate_swap(amount, lane.reserve_in, lane.reserve_out, lane.fee)?;
        Ok(amount * result.price_impact_percent)
    }

    /// Gas for one swap on the lane's chain, as a percent of the allocation
    pub fn gas_term(&self, lane: &ChainLane, allocation: f64) -> f64 {
        let notional_usd = allocation * self.token_in_usd;
        if notional_usd <= 0.0 {
            return f64::INFINITY;
        }
        self.gas.gas_cost_usd(&lane.chain) / notional_usd * 100.0
    }

    /// Marginal cost of growing `current` by one step
    pub fn estimate(&self, lane: &ChainLane, current: f64) -> MarginalCost {
        let next = current + self.step;

        let before = match self.impact_cost(lane, current) {
            Ok(cost) => cost,
            Err(e) => return MarginalCost::Ineligible(e),
        };
        let after = match self.impact_cost(lane, next) {
            Ok(cost) => cost,
            Err(e) => return MarginalCost::Ineligible(e),
        };

        let impact = (after - before) / self.step;
        let gas = self.gas_term(lane, next);
        let total = impact + gas;

        if !total.is_finite() {
            return MarginalCost::Ineligible(RouteError::Calculation(format!(
                "marginal cost on {} is not finite",
                lane.chain
            )));
        }

        trace!(
            "{} @ {:.4}: impact {:.6}% + gas {:.6}% = {:.6}%",
            lane.chain, current, impact, gas, total
        );

        MarginalCost::Eligible(total)
    }
}
