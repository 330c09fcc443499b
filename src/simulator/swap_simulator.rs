//! Swap Simulator - Constant Product Pools
//!
//! Prices a single swap against `x * y = k` reserves. Fees are taken from the
//! input before it reaches the curve, same as Uniswap V2.

use serde::{Deserialize, Serialize};

use crate::cartographer::PoolSnapshot;
use crate::error::{RouteError, RouteResult};

/// Result of a single swap simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceImpactResult {
    pub amount_in: f64,
    pub amount_out: f64,

    /// Input paid per unit of output
    pub effective_price: f64,

    /// reserve_in / reserve_out before the trade
    pub spot_price: f64,

    /// |effective - spot| / spot, in percent
    pub price_impact_percent: f64,

    /// Fee paid, in input-token units
    pub fee_cost: f64,
}

/// Simulate a swap of `amount_in` against constant-product reserves.
///
/// `fee` is a fraction (0.003 = 30 bps).
pub fn simulate_swap(
    amount_in: f64,
    reserve_in: f64,
    reserve_out: f64,
    fee: f64,
) -> RouteResult<PriceImpactResult> {
    if !(reserve_in > 0.0) || !(reserve_out > 0.0) {
        return Err(RouteError::InsufficientLiquidity { reserve_in, reserve_out });
    }
    if !amount_in.is_finite() || amount_in <= 0.0 {
        return Err(RouteError::invalid(format!(
            "swap amount must be positive, got {}",
            amount_in
        )));
    }
    if !(0.0..1.0).contains(&fee) {
        return Err(RouteError::invalid(format!("fee must be in [0, 1), got {}", fee)));
    }

    let effective_input = amount_in * (1.0 - fee);
    let amount_out = (reserve_out * effective_input) / (reserve_in + effective_input);

    if !(amount_out > 0.0) || !amount_out.is_finite() {
        return Err(RouteError::Calculation(format!(
            "swap of {} produced output {}",
            amount_in, amount_out
        )));
    }

    let effective_price = amount_in / amount_out;
    let spot_price = reserve_in / reserve_out;
    let price_impact_percent = if spot_price == 0.0 {
        0.0
    } else {
        (effective_price - spot_price).abs() / spot_price * 100.0
    };

    Ok(PriceImpactResult {
        amount_in,
        amount_out,
        effective_price,
        spot_price,
        price_impact_percent,
        fee_cost: amount_in * fee,
    })
}

/// Largest input whose price impact stays at or under `impact_pct`.
///
/// Impact on a constant-product pool is `(f / (1 - f) + a / reserve_in) * 100`,
/// linear in `a`, so the bound is closed-form. 0 when the fee alone is over it.
pub fn max_input_within_impact(reserve_in: f64, fee: f64, impact_pct: f64) -> f64 {
    if !(reserve_in > 0.0) || !(0.0..1.0).contains(&fee) || !impact_pct.is_finite() {
        return 0.0;
    }
    let fee_impact = fee / (1.0 - fee);
    (reserve_in * (impact_pct / 100.0 - fee_impact)).max(0.0)
}

/// Simulate against a snapshot, orienting its reserves to `token_in`
pub fn simulate_pool(
    pool: &PoolSnapshot,
    token_in: &str,
    amount_in: f64,
) -> RouteResult<PriceImpactResult> {
    let (reserve_in, reserve_out) = pool.oriented_reserves(token_in).ok_or_else(|| {
        RouteError::invalid(format!(
            "pool {} on {} does not trade {}",
            pool.address, pool.chain, token_in
        ))
    })?;
    simulate_swap(amount_in, reserve_in, reserve_out, pool.fee_fraction())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_constant_product_output() {
        // 1000 in, 1M/1M reserves, no fee: 1e6 * 1000 / 1_001_000
        let result = simulate_swap(1000.0, 1_000_000.0, 1_000_000.0, 0.0).unwrap();
        assert!((result.amount_out - 999.000999000999).abs() < 1e-6);
        assert_eq!(result.spot_price, 1.0);
        assert_eq!(result.fee_cost, 0.0);
        // impact = a / R exactly when fee is 0
        assert!((result.price_impact_percent - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_fee_is_taken_from_input() {
        let result = simulate_swap(1000.0, 1_000_000.0, 1_000_000.0, 0.003).unwrap();
        assert!((result.fee_cost - 3.0).abs() < 1e-12);
        let no_fee = simulate_swap(1000.0, 1_000_000.0, 1_000_000.0, 0.0).unwrap();
        assert!(result.amount_out < no_fee.amount_out);
        assert!(result.price_impact_percent > no_fee.price_impact_percent);
    }

    #[test]
    fn test_zero_reserve_rejected() {
        let err = simulate_swap(100.0, 1_000.0, 0.0, 0.003).unwrap_err();
        assert!(matches!(err, RouteError::InsufficientLiquidity { .. }));
        let err = simulate_swap(100.0, 0.0, 1_000.0, 0.003).unwrap_err();
        assert!(matches!(err, RouteError::InsufficientLiquidity { .. }));
    }

    #[test]
    fn test_invalid_amount_and_fee() {
        assert!(matches!(
            simulate_swap(0.0, 1_000.0, 1_000.0, 0.003),
            Err(RouteError::InvalidInput(_))
        ));
        assert!(matches!(
            simulate_swap(10.0, 1_000.0, 1_000.0, 1.0),
            Err(RouteError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_simulation_is_reproducible() {
        let a = simulate_swap(12_345.678, 9_876_543.21, 4_321_987.6, 0.0005).unwrap();
        let b = simulate_swap(12_345.678, 9_876_543.21, 4_321_987.6, 0.0005).unwrap();
        assert_eq!(a.amount_out.to_bits(), b.amount_out.to_bits());
        assert_eq!(a.price_impact_percent.to_bits(), b.price_impact_percent.to_bits());
    }

    #[test]
    fn test_simulate_pool_orients_reserves() {
        let pool = PoolSnapshot::new("arbitrum", "0xpool", "WETH", "USDC", 30, 1_000.0, 3_000_000.0);
        let sell_eth = simulate_pool(&pool, "ETH", 1.0).unwrap();
        assert!(sell_eth.amount_out > 2_900.0 && sell_eth.amount_out < 3_000.0);
        let buy_eth = simulate_pool(&pool, "USDC", 3_000.0).unwrap();
        assert!(buy_eth.amount_out > 0.99 && buy_eth.amount_out < 1.0);
        assert!(simulate_pool(&pool, "DAI", 1.0).is_err());
    }

    #[test]
    fn test_max_input_within_impact() {
        // no fee: 2.5% of a 1000 reserve
        assert!((max_input_within_impact(1_000.0, 0.0, 2.5) - 25.0).abs() < 1e-9);

        let cap = max_input_within_impact(1e7, 0.003, 3.0);
        let at_cap = simulate_swap(cap, 1e7, 1e7, 0.003).unwrap();
        assert!((at_cap.price_impact_percent - 3.0).abs() < 1e-9);

        // 1% fee can never fit under 0.5%
        assert_eq!(max_input_within_impact(1e7, 0.01, 0.5), 0.0);
        assert_eq!(max_input_within_impact(0.0, 0.0, 3.0), 0.0);
    }

    proptest! {
        #[test]
        fn price_impact_increases_with_amount(
            reserve_in in 1_000.0f64..1e9,
            reserve_out in 1_000.0f64..1e9,
            fee_bps in 0u32..1_000,
            amount in 1.0f64..1e6,
            bump in 1.01f64..10.0,
        ) {
            let fee = fee_bps as f64 / 10_000.0;
            let small = simulate_swap(amount, reserve_in, reserve_out, fee).unwrap();
            let large = simulate_swap(amount * bump, reserve_in, reserve_out, fee).unwrap();
            prop_assert!(large.price_impact_percent > small.price_impact_percent);
        }
    }
}
