//! crossroute - Multi-Chain Swap Router
//!
//! Run with: cargo run -- --config demos/router.toml demos/eth_usdc_four_chains.json
//!
//! Loads one or more swap requests (pool snapshot + amount), evaluates them
//! concurrently and prints the recommended split.

use clap::Parser;
use color_eyre::eyre::{eyre, Result, WrapErr};
use console::style;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crossroute::config::RecommendationLog;
use crossroute::{recommend, RouterConfig, SwapRecommendation, SwapRequest};

#[derive(Parser, Debug)]
#[command(name = "crossroute", version, about = "Split a large swap across chains")]
struct Cli {
    /// Router config (TOML). Falls back to environment / .env
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print raw JSON instead of the report
    #[arg(long)]
    json: bool,

    /// Print the configuration summary first
    #[arg(long)]
    show_config: bool,

    /// Write the effective configuration to this TOML file
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Swap request files (.json or .toml)
    #[arg(required = true)]
    requests: Vec<PathBuf>,
}

fn print_banner() {
    println!();
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!(
        "{}",
        style(" 🔀 CROSSROUTE - Multi-Chain Swap Router").cyan().bold()
    );
    println!(
        "{}",
        style("    Constant Product | Slippage Ceiling | Gas Aware").cyan()
    );
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!();
}

fn load_request(path: &Path) -> Result<SwapRequest> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("reading {}", path.display()))?;

    let request = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&content)
            .wrap_err_with(|| format!("parsing {}", path.display()))?,
        _ => serde_json::from_str(&content)
            .wrap_err_with(|| format!("parsing {}", path.display()))?,
    };

    Ok(request)
}

fn print_recommendation(source: &str, rec: &SwapRecommendation) {
    println!("{}", style(format!("═══ {} ═══", source)).blue().bold());

    if let Some(err) = &rec.error {
        println!("{} {}", style("✗").red(), style(err).red());
        println!();
        return;
    }

    println!(
        "{} {:.4} {} → {:.4} {} | impact {:.3}% | gas ${:.2} | efficiency {:.2}%",
        style("✓").green(),
        rec.total_input,
        rec.token_in,
        rec.total_output,
        rec.token_out,
        rec.total_price_impact_percent,
        rec.total_gas_cost,
        rec.efficiency_percent
    );

    for route in &rec.routes {
        let confidence = if route.confidence >= 0.9 {
            style(format!("{:.1}", route.confidence)).green()
        } else {
            style(format!("{:.1}", route.confidence)).yellow()
        };
        println!(
            "   {} [{}] pool {} | ~{:.0}s",
            route.description, confidence, route.pool_address, route.execution_time_secs
        );
    }

    println!();
    println!("{}", style(&rec.recommendation_text).dim());
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("crossroute=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => RouterConfig::from_file(path)
            .wrap_err_with(|| format!("loading config {}", path.display()))?,
        None => RouterConfig::from_env()?,
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        return Err(eyre!(e));
    }

    if let Some(path) = &cli.save_config {
        config
            .save_to_file(path)
            .wrap_err_with(|| format!("saving config {}", path.display()))?;
        info!("Saved effective configuration to {}", path.display());
    }

    if !cli.json {
        print_banner();
        if cli.show_config {
            config.print_summary();
            println!();
        }
    }

    let mut requests = Vec::new();
    for path in &cli.requests {
        requests.push((path.display().to_string(), load_request(path)?));
    }

    // Each call is independent; run them on the blocking pool side by side
    let start = Instant::now();
    let config = Arc::new(config);
    let handles: Vec<_> = requests
        .into_iter()
        .map(|(source, request)| {
            let config = Arc::clone(&config);
            tokio::task::spawn_blocking(move || {
                let rec = recommend(&request, &config);
                (source, rec)
            })
        })
        .collect();

    let results = futures::future::join_all(handles).await;
    info!("Evaluated {} request(s) in {:?}", results.len(), start.elapsed());

    let mut failures = 0;
    for joined in results {
        let (source, rec) = joined?;
        if rec.is_error() {
            failures += 1;
        }

        if cli.json {
            println!("{}", serde_json::to_string_pretty(&rec)?);
        } else {
            print_recommendation(&source, &rec);
        }

        if config.recommendation_log {
            RecommendationLog::new(&source, rec).append_to_file(&config.recommendation_log_path)?;
        }
    }

    if failures > 0 && !cli.json {
        println!(
            "{} {} request(s) had no valid route",
            style("⚠").yellow(),
            failures
        );
    }

    Ok(())
}
