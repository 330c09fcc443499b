//! Diagnostic tool - Check configuration and pool snapshots
//!
//! Run with: cargo run --bin diagnose [request.json]

use std::env;
use std::fs;

use crossroute::cartographer::ChainLane;
use crossroute::{RouterConfig, SwapRequest};

fn main() {
    println!("🔍 CROSSROUTE DIAGNOSTIC CHECK\n");

    // Load .env
    dotenvy::dotenv().ok();

    println!("═══════════════════════════════════════════════════");
    println!("                  CONFIGURATION                     ");
    println!("═══════════════════════════════════════════════════\n");

    let checks = [
        ("SLIPPAGE_CEILING_PCT", "3.0", "Max price impact per route"),
        ("MAX_GAS_BUDGET_USD", "100.0", "Gas budget (informational)"),
        ("ALLOCATION_STEP", "1000.0", "USD volume per optimizer step"),
        ("MAX_ITERATIONS", "1000", "Optimizer round cap"),
        ("HEALTHY_TVL_FLOOR_USD", "1000000.0", "TVL for a 'good' pool"),
        ("RECOMMENDATION_LOG", "false", "Log recommendations?"),
    ];

    for (key, default, desc) in checks {
        let value = env::var(key).unwrap_or_else(|_| default.to_string());
        let is_default = env::var(key).is_err();
        let marker = if is_default { "(default)" } else { "(from .env)" };
        println!("  {}: {} {}", key, value, marker);
        println!("    └─ {}\n", desc);
    }

    let config = match RouterConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            println!("  ❌ Failed to load configuration: {}", e);
            return;
        }
    };

    match config.validate() {
        Ok(()) => println!("  ✅ Configuration valid"),
        Err(e) => println!("  ❌ {}", e),
    }

    println!("\n═══════════════════════════════════════════════════");
    println!("                  CHAIN COST TABLE                  ");
    println!("═══════════════════════════════════════════════════\n");

    for (chain, costs) in &config.gas.chains {
        println!(
            "  {:<12} gas ${:<8.2} ~{:.0}s",
            chain, costs.gas_cost_usd, costs.execution_time_secs
        );
    }
    println!(
        "  {:<12} gas ${:<8.2} ~{:.0}s",
        "(fallback)", config.gas.fallback.gas_cost_usd, config.gas.fallback.execution_time_secs
    );

    let Some(path) = env::args().nth(1) else {
        println!("\n  Pass a request file to inspect its pools.");
        println!("\n✅ Diagnostic complete!\n");
        return;
    };

    let request: SwapRequest = match fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()))
    {
        Ok(request) => request,
        Err(e) => {
            println!("\n  ❌ Could not load {}: {}", path, e);
            return;
        }
    };

    println!("\n═══════════════════════════════════════════════════");
    println!("                   POOL HEALTH                      ");
    println!("═══════════════════════════════════════════════════\n");

    println!(
        "  Request: {} {} → {} ({} pools on {} chains)\n",
        request.amount_in,
        request.token_in,
        request.token_out,
        request.pool_count(),
        request.pools.len()
    );

    for (chain, pools) in &request.pools {
        let lane = ChainLane::select(chain, pools, &request.token_in, &request.token_out);
        let (costs, source) = config.gas.lookup(chain);
        println!(
            "  {}: gas ${:.2} ~{:.0}s ({})",
            chain, costs.gas_cost_usd, costs.execution_time_secs, source
        );

        for pool in pools {
            let health = pool.health(config.healthy_tvl_floor_usd);
            let active = lane
                .as_ref()
                .map(|l| l.pool.address == pool.address)
                .unwrap_or(false);
            println!(
                "    {} {} {}/{} fee {:.2}% | ratio {:.3} | depth {:.2} | TVL ${:.0} | {}",
                if active { "▶" } else { " " },
                pool.address,
                pool.token0,
                pool.token1,
                health.fee_percent,
                health.reserve_ratio,
                health.liquidity_depth,
                health.tvl_usd,
                health.health
            );

            if !pool.has_liquidity() {
                println!("      ⚠️  no usable liquidity");
            }

            match pool.decoded_price() {
                Some(Ok(price)) => println!(
                    "      sqrtPriceX96 → {:.6} {} per {} ({:.6} inverse){}",
                    price.token1_per_token0,
                    pool.token1,
                    pool.token0,
                    price.token0_per_token1,
                    if price.inverted { " [decimals flipped]" } else { "" }
                ),
                Some(Err(e)) => println!("      ❌ sqrtPriceX96: {}", e),
                None => {}
            }
        }

        if lane.is_none() {
            println!("    ❌ no usable pool, chain will be skipped");
        }
        println!();
    }

    println!("✅ Diagnostic complete!\n");
}
