//! Recommendation Assembler
//!
//! Turns an allocation plan into the ranked, per-chain routes the caller
//! executes, plus totals and a plain-text summary.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::{info, warn};

use crate::brain::{AllocationOptimizer, AllocationPlan};
use crate::cartographer::SwapRequest;
use crate::config::RouterConfig;
use crate::error::{RouteError, RouteResult};
use crate::simulator::simulate_swap;

/// Routes under this impact get the high confidence score
const HIGH_CONFIDENCE_IMPACT_PCT: f64 = 2.0;
const HIGH_CONFIDENCE: f64 = 0.9;
const LOW_CONFIDENCE: f64 = 0.7;

const RECOMMENDATION_TYPE: &str = "swap_recommendation";

/// One chain's share of the swap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRecommendation {
    pub chain: String,
    pub amount_in: f64,
    pub amount_out: f64,
    pub price_impact_percent: f64,
    pub pool_address: String,
    pub gas_cost_usd: f64,
    pub execution_time_secs: f64,
    pub confidence: f64,
    pub description: String,
}

/// The full answer for one swap request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapRecommendation {
    #[serde(rename = "type")]
    pub kind: String,
    pub total_input: f64,
    pub token_in: String,
    pub total_output: f64,
    pub token_out: String,
    pub total_price_impact_percent: f64,
    pub total_gas_cost: f64,
    pub net_output: f64,
    pub efficiency_percent: f64,
    pub routes: Vec<RouteRecommendation>,
    pub recommendation_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SwapRecommendation {
    /// Well-formed empty answer carrying an error
    pub fn failed(token_in: &str, token_out: &str, error: &RouteError) -> Self {
        Self {
            kind: RECOMMENDATION_TYPE.to_string(),
            total_input: 0.0,
            token_in: token_in.to_string(),
            total_output: 0.0,
            token_out: token_out.to_string(),
            total_price_impact_percent: 0.0,
            total_gas_cost: 0.0,
            net_output: 0.0,
            efficiency_percent: 0.0,
            routes: Vec::new(),
            recommendation_text: format!("No route recommended: {}", error),
            error: Some(error.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

pub fn confidence_for(price_impact_percent: f64) -> f64 {
    if price_impact_percent < HIGH_CONFIDENCE_IMPACT_PCT {
        HIGH_CONFIDENCE
    } else {
        LOW_CONFIDENCE
    }
}

/// Build the recommendation for a finished plan
pub fn assemble(
    plan: &AllocationPlan,
    request: &SwapRequest,
    config: &RouterConfig,
) -> RouteResult<SwapRecommendation> {
    let mut routes = Vec::new();
    let mut reference: Option<(f64, f64)> = None; // (tvl, spot rate) of the deepest route pool

    for (lane, amount) in plan.funded() {
        let result = simulate_swap(amount, lane.reserve_in, lane.reserve_out, lane.fee)?;
        let costs = config.gas.costs(&lane.chain);

        match reference {
            Some((tvl, _)) if lane.pool.tvl_usd <= tvl => {}
            _ => reference = Some((lane.pool.tvl_usd, lane.spot_rate())),
        }

        routes.push(RouteRecommendation {
            chain: lane.chain.clone(),
            amount_in: amount,
            amount_out: result.amount_out,
            price_impact_percent: result.price_impact_percent,
            pool_address: lane.pool.address.clone(),
            gas_cost_usd: costs.gas_cost_usd,
            execution_time_secs: costs.execution_time_secs,
            confidence: confidence_for(result.price_impact_percent),
            description: format!(
                "swap {:.4} {} → {:.4} {} on {}",
                amount, request.token_in, result.amount_out, request.token_out, lane.chain
            ),
        });
    }

    if routes.is_empty() {
        return Err(RouteError::no_route("allocation left every chain empty"));
    }

    // Largest share first; chain id breaks ties
    routes.sort_by(|a, b| {
        b.amount_in
            .total_cmp(&a.amount_in)
            .then_with(|| a.chain.cmp(&b.chain))
    });

    let total_input: f64 = routes.iter().map(|r| r.amount_in).sum();
    let total_output: f64 = routes.iter().map(|r| r.amount_out).sum();
    let total_gas_cost: f64 = routes.iter().map(|r| r.gas_cost_usd).sum();
    let weighted_impact: f64 = routes
        .iter()
        .map(|r| r.price_impact_percent * r.amount_in)
        .sum::<f64>();
    let total_price_impact_percent = if total_input > 0.0 {
        weighted_impact / total_input
    } else {
        0.0
    };

    let net_output = total_output - total_gas_cost / request.token_out_usd;
    let reference_spot = reference.map(|(_, spot)| spot).unwrap_or(0.0);
    let naive_output = total_input * reference_spot;
    let efficiency_percent = if naive_output > 0.0 {
        net_output / naive_output * 100.0
    } else {
        0.0
    };

    let mut recommendation = SwapRecommendation {
        kind: RECOMMENDATION_TYPE.to_string(),
        total_input,
        token_in: request.token_in.clone(),
        total_output,
        token_out: request.token_out.clone(),
        total_price_impact_percent,
        total_gas_cost,
        net_output,
        efficiency_percent,
        routes,
        recommendation_text: String::new(),
        error: None,
    };
    recommendation.recommendation_text = summarize(&recommendation, plan, config);

    Ok(recommendation)
}

/// Multi-line summary of the routes
fn summarize(rec: &SwapRecommendation, plan: &AllocationPlan, config: &RouterConfig) -> String {
    let mut text = String::new();

    let _ = writeln!(
        text,
        "Split {:.4} {} across {} chain(s) for {:.4} {} (net {:.4} after ${:.2} gas, {:.2}% efficiency):",
        rec.total_input,
        rec.token_in,
        rec.routes.len(),
        rec.total_output,
        rec.token_out,
        rec.net_output,
        rec.total_gas_cost,
        rec.efficiency_percent
    );

    for (i, route) in rec.routes.iter().enumerate() {
        let share = if rec.total_input > 0.0 {
            route.amount_in / rec.total_input * 100.0
        } else {
            0.0
        };
        let _ = writeln!(
            text,
            "  {}. {}: {:.4} {} ({:.1}%) → {:.4} {}, impact {:.3}%, gas ${:.2}, ~{:.0}s",
            i + 1,
            route.chain,
            route.amount_in,
            rec.token_in,
            share,
            route.amount_out,
            rec.token_out,
            route.price_impact_percent,
            route.gas_cost_usd,
            route.execution_time_secs
        );
    }

    let _ = write!(
        text,
        "Weighted price impact {:.3}%.",
        rec.total_price_impact_percent
    );

    if !plan.evicted.is_empty() {
        let _ = write!(text, "\nExcluded by the {:.2}% slippage ceiling: {}.",
            config.slippage_ceiling_pct,
            plan.evicted.join(", ")
        );
    }
    if !plan.ceiling_breaches.is_empty() {
        let _ = write!(text, "\nWarning: {} above the slippage ceiling after remainder allocation.",
            plan.ceiling_breaches.join(", ")
        );
    }
    if rec.total_gas_cost > config.max_gas_budget_usd {
        let _ = write!(text, "\nNote: gas ${:.2} exceeds the ${:.2} budget.",
            rec.total_gas_cost, config.max_gas_budget_usd
        );
    }

    text
}

/// Optimize and assemble. Never fails: errors come back in `error`.
pub fn recommend(request: &SwapRequest, config: &RouterConfig) -> SwapRecommendation {
    let result = AllocationOptimizer::new(config)
        .optimize(request)
        .and_then(|plan| assemble(&plan, request, config));

    match result {
        Ok(recommendation) => {
            info!(
                "Recommended {} route(s): {:.4} {} → {:.4} {} ({:.3}% impact)",
                recommendation.routes.len(),
                recommendation.total_input,
                recommendation.token_in,
                recommendation.total_output,
                recommendation.token_out,
                recommendation.total_price_impact_percent
            );
            recommendation
        }
        Err(e) => {
            warn!("No recommendation for {} → {}: {}", request.token_in, request.token_out, e);
            SwapRecommendation::failed(&request.token_in, &request.token_out, &e)
        }
    }
}
