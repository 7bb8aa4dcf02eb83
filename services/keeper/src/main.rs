//! Vault keeper entry point
//!
//! Runs the upkeep loop against a simulated vault: every poll advances
//! simulated time, accrues strategy yield and performs whatever upkeep the
//! engine reports as due.

mod simulation;

use anyhow::{Context, Result};
use clap::Parser;
use router_config::VaultConfig;
use simulation::SimulatedVault;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vault_engine::log_error;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Environment overlay (development, production, ...)
    #[arg(short, long)]
    env: Option<String>,

    /// Poll interval in seconds, overrides keeper.poll_interval_secs
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Simulated seconds that pass per poll
    #[arg(long, default_value_t = 3_600)]
    sim_step_secs: u64,

    /// Stop after this many polls
    #[arg(long)]
    ticks: Option<u64>,

    /// Emit JSON logs, overrides logging.json
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = VaultConfig::load(args.config.as_deref(), args.env.as_deref())
        .context("Failed to load vault configuration")?;
    if let Some(secs) = args.interval_secs {
        config.keeper.poll_interval_secs = secs;
    }
    if args.json_logs {
        config.logging.json = true;
    }
    config.validate()?;

    init_tracing(&config);
    info!("Starting vault keeper");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut vault = SimulatedVault::bootstrap(&config)?;
    vault.report()?;

    let mut interval = tokio::time::interval(Duration::from_secs(config.keeper.poll_interval_secs));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // first tick completes immediately
    interval.tick().await;

    let mut polls = 0u64;
    let mut performed = 0usize;
    loop {
        if args.ticks.is_some_and(|limit| polls >= limit) {
            info!(polls, "Tick limit reached");
            break;
        }

        tokio::select! {
            _ = interval.tick() => {
                polls += 1;
                vault.advance(args.sim_step_secs);
                match vault.run_cycle() {
                    Ok(count) => performed += count,
                    Err(e) => log_error!("Keeper cycle failed: {:#}", e),
                }
                vault.report()?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!(
        polls,
        upkeeps = performed,
        fees = %vault.engine.total_fees_collected(),
        "Vault keeper stopped"
    );
    Ok(())
}

fn init_tracing(config: &VaultConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let json = config.logging.json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .init();
}
