#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that replays a scripted intrusion against a guarded level.

mod scenario;
mod simulation;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::scenario::Scenario;

/// Command-line arguments accepted by the `nightwatch` binary.
#[derive(Debug, Parser)]
#[command(name = "nightwatch")]
#[command(about = "Replays a scripted intrusion against a guarded level", version)]
struct Cli {
    /// Scenario file describing the level, its sentinels and the intruder script.
    #[arg(long, value_name = "FILE")]
    scenario: PathBuf,

    /// Number of fixed simulation steps to run.
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Length of one simulation step in milliseconds.
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u64).range(1..))]
    dt_ms: u64,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Entry point for the Nightwatch command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let scenario = Scenario::load(&cli.scenario)?;
    tracing::info!(
        scenario = %cli.scenario.display(),
        sentinels = scenario.sentinels.len(),
        ticks = cli.ticks,
        "starting replay"
    );

    let summary = simulation::run(&scenario, cli.ticks, Duration::from_millis(cli.dt_ms))?;
    println!("{summary}");
    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log filter `{level}`"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("failed to install tracing subscriber")
}
