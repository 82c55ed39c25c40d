//! Matchcast
//!
//! Multi-algorithm sporting-event forecasting from the command line.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use matchcast::{
    calibration::AlgorithmPerformanceWindow,
    config::Config,
    data::{AlgorithmStats, InMemoryStore},
    engine::ForecastEngine,
    types::{MatchInput, PredictionContext},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "matchcast")]
#[command(about = "Multi-algorithm sports forecasting with uncertainty bands")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "matchcast.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast matches from a JSON fixtures file
    Predict {
        /// Path to a JSON array of matches
        fixtures: String,
        /// Seed the Monte Carlo simulation for reproducible bands
        #[arg(long)]
        seed: Option<u64>,
        /// Also run the Monte Carlo uncertainty simulation
        #[arg(long)]
        monte_carlo: bool,
    },
    /// Show algorithm trust weights from recorded statistics
    Weights {
        /// Path to a JSON array of per-algorithm stats; omit for equal weights
        #[arg(short, long)]
        stats: Option<String>,
    },
    /// Recalibrate model weights from settled performance windows
    Calibrate {
        /// Path to a JSON array of per-algorithm performance windows
        windows: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Predict {
            fixtures,
            seed,
            monte_carlo,
        } => {
            if seed.is_some() {
                config.monte_carlo.seed = seed;
            }
            predict(config, &fixtures, monte_carlo).await
        }
        Commands::Weights { stats } => show_weights(config, stats.as_deref()).await,
        Commands::Calibrate { windows } => calibrate(config, &windows),
    }
}

async fn predict(config: Config, fixtures: &str, monte_carlo: bool) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(fixtures)?;
    let matches: Vec<MatchInput> = serde_json::from_str(&raw)?;
    tracing::info!("loaded {} fixtures from {}", matches.len(), fixtures);

    let store = Arc::new(InMemoryStore::new());
    let engine = ForecastEngine::new(config, store.clone(), store);
    let ctx = PredictionContext::default();

    for input in &matches {
        let report = engine.forecast(input, &ctx, monte_carlo).await?;

        println!(
            "\n🏟  {} vs {} ({})",
            input.home.name, input.away.name, input.league
        );
        println!("{}", "-".repeat(60));

        for p in &report.predictions {
            println!(
                "  {:<18} {:<5} conf {:>5.1}%  ev {:>6.2}%  stake {:>5} units",
                p.algorithm.to_string(),
                p.recommendation.to_string(),
                p.confidence,
                p.ev_percentage,
                p.kelly_stake_units
            );
        }

        let c = &report.consensus;
        println!(
            "\n  consensus: {} @ {:.0}% (agreement {:.0}%{})",
            c.recommendation,
            c.confidence,
            c.agreement * 100.0,
            if c.unanimous { ", unanimous" } else { "" }
        );
        println!(
            "  projected score: {:.1} - {:.1}",
            c.projected_home_score, c.projected_away_score
        );
        println!(
            "  stacked: {:.0}% (boost {:+.2}, pattern {:+.2}, diversity {:+.2}, calibration {:+.2})",
            report.ensemble.confidence,
            report.ensemble.layers.boosting,
            report.ensemble.layers.pattern,
            report.ensemble.layers.diversity,
            report.ensemble.layers.calibration
        );

        if let Some(mc) = &report.monte_carlo {
            println!(
                "  uncertainty: confidence {:.1}% [{:.1}, {:.1}] over {} samples",
                mc.confidence.point, mc.confidence.lower, mc.confidence.upper, mc.num_samples
            );
            println!(
                "  pick stability: {:.0}%  signal: {:?}",
                mc.pick_stability * 100.0,
                mc.signal
            );
        }
    }

    Ok(())
}

async fn show_weights(config: Config, stats_path: Option<&str>) -> anyhow::Result<()> {
    let store = Arc::new(InMemoryStore::new());
    if let Some(path) = stats_path {
        let raw = std::fs::read_to_string(path)?;
        let stats: Vec<AlgorithmStats> = serde_json::from_str(&raw)?;
        store.set_stats(stats);
    }

    let engine = ForecastEngine::new(config, store.clone(), store);
    let weights = engine.fetch_weights().await;

    println!("\n⚖️  Algorithm Trust Weights\n");
    println!(
        "{:<18} {:>8} {:>10} {:>8} {:>12}",
        "Algorithm", "Weight", "Win Rate", "Bets", "Reliability"
    );
    println!("{}", "-".repeat(60));
    for w in &weights {
        println!(
            "{:<18} {:>7.1}% {:>9.1}% {:>8} {:>11.0}%",
            w.algorithm.to_string(),
            w.weight * 100.0,
            w.win_rate,
            w.sample_count,
            w.reliability * 100.0
        );
    }

    Ok(())
}

fn calibrate(config: Config, windows_path: &str) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(windows_path)?;
    let windows: Vec<AlgorithmPerformanceWindow> = serde_json::from_str(&raw)?;

    let store = Arc::new(InMemoryStore::new());
    let engine = ForecastEngine::new(config, store.clone(), store);
    let report = engine.calculate_model_weights(&windows);

    println!("\n🎯 Calibration Report\n");
    println!(
        "{:<18} {:>8} {:>11} {:>10}",
        "Algorithm", "Weight", "Multiplier", "Threshold"
    );
    println!("{}", "-".repeat(52));
    for w in &report.weights {
        println!(
            "{:<18} {:>7.1}% {:>11.2} {:>9.1}%",
            w.algorithm.to_string(),
            w.weight * 100.0,
            w.confidence_multiplier,
            w.min_confidence_threshold
        );
    }

    if report.recommendations.is_empty() {
        println!("\nAll algorithms within tolerance.");
    } else {
        println!("\nRecommendations:");
        for r in &report.recommendations {
            println!("  • {}", r);
        }
    }

    Ok(())
}
