//! Command-line runner for the Gridmarket energy market simulation.
//!
//! Reads an input document, runs the initial turn and every monthly turn,
//! and writes the final report.
//!
//! # Startup Sequence
//!
//! 1. Parse command-line arguments
//! 2. Load configuration (`gridmarket-config.yaml` unless `--config` is given)
//! 3. Initialize structured logging (tracing)
//! 4. Read the input document
//! 5. Build the market and run the simulation
//! 6. Write the report

mod error;
mod io;

use std::path::{Path, PathBuf};

use clap::Parser;
use gridmarket_core::{MarketState, NoOpCallback, SimulationConfig, build_report, run_simulation};
use gridmarket_types::{MarketReport, SimulationInput};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Config file read when `--config` is not given.
const DEFAULT_CONFIG_PATH: &str = "gridmarket-config.yaml";

#[derive(Parser, Debug)]
#[command(
    name = "gridmarket-engine",
    about = "Run an energy market simulation and write its final report"
)]
struct Args {
    /// Input document (JSON).
    input: PathBuf,

    /// Where to write the report (JSON).
    output: PathBuf,

    /// Configuration file (YAML).
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the configuration, the input document, the
/// simulation, or the report write fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 1. Load configuration. Logging is not up yet, so this step is silent.
    let config = SimulationConfig::load(args.config.as_deref(), Path::new(DEFAULT_CONFIG_PATH))?;
    let config_path = args
        .config
        .as_deref()
        .unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));

    // 2. Initialize structured logging. RUST_LOG wins over the config level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        config = %config_path.display(),
        log_level = config.logging.level,
        max_turns = config.simulation.max_turns,
        "gridmarket-engine starting"
    );

    // 3. Read the input document.
    let input = io::read_input(&args.input)?;
    info!(
        input = %args.input.display(),
        number_of_turns = input.number_of_turns,
        update_records = input.monthly_updates.len(),
        "Input loaded"
    );

    // 4. Run.
    let report = simulate(&input, &config)?;

    // 5. Write the report.
    write_output(&args.output, &report)?;
    Ok(())
}

/// Build the market from `input`, run every turn, and assemble the report.
fn simulate(
    input: &SimulationInput,
    config: &SimulationConfig,
) -> Result<MarketReport, EngineError> {
    let monthly_turns = config.simulation.effective_turns(input.number_of_turns);
    if monthly_turns < input.number_of_turns {
        info!(
            requested = input.number_of_turns,
            monthly_turns, "Run capped by simulation.max_turns"
        );
    }

    let market = config.market_config()?;
    let mut state = MarketState::from_initial_data(&input.initial_data, market, monthly_turns)?;
    let result = run_simulation(&mut state, &input.monthly_updates, &mut NoOpCallback)?;
    info!(total_turns = result.total_turns, "Run complete");

    Ok(build_report(&state))
}

fn write_output(path: &Path, report: &MarketReport) -> Result<(), EngineError> {
    io::write_report(path, report)?;
    info!(
        output = %path.display(),
        consumers = report.consumers.len(),
        distributors = report.distributors.len(),
        producers = report.energy_producers.len(),
        "Report written"
    );
    Ok(())
}
