//! Simulation loop runner.
//!
//! This module provides [`run_simulation`], which drives a whole run: the
//! initial turn, then one monthly turn per month on the state's clock. The
//! *k*-th update record (0-based) feeds month *k + 1*.
//!
//! The update list and the turn count come from the same document:
//!
//! - **Missing records**: the document is malformed and the run is refused
//!   before the initial turn.
//! - **Extra records**: records past the last month are ignored, with a
//!   `warn`. This is also how a run capped by `simulation.max_turns` ends.

use gridmarket_market::MarketError;
use gridmarket_types::MonthlyUpdate;
use tracing::{info, warn};

use crate::turn::{self, MarketState, TurnError, TurnSummary};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A turn execution failed.
    #[error("turn error: {source}")]
    Turn {
        /// The underlying turn error.
        #[from]
        source: TurnError,
    },

    /// The input document cannot drive the requested run.
    #[error("input error: {source}")]
    Input {
        /// The underlying market error.
        source: MarketError,
    },
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The last turn summary (the initial turn's if no monthly turn ran).
    pub final_summary: TurnSummary,
    /// Total number of turns executed, the initial turn included.
    pub total_turns: u64,
}

/// Callback invoked after each turn completes.
///
/// The callback receives the turn summary and the current market state.
pub trait TurnCallback {
    /// Called after a turn completes successfully.
    fn on_turn(&mut self, summary: &TurnSummary, state: &MarketState);
}

/// A no-op turn callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCallback;

impl TurnCallback for NoOpCallback {
    fn on_turn(&mut self, _summary: &TurnSummary, _state: &MarketState) {}
}

/// Run the initial turn and every monthly turn of `state`'s clock.
///
/// # Errors
///
/// Returns [`RunnerError::Input`] with [`MarketError::MalformedInput`] if
/// there are fewer update records than monthly turns; nothing runs in that
/// case. Returns [`RunnerError::Turn`] if any turn fails. Turns that
/// completed before the failure are not rolled back.
pub fn run_simulation(
    state: &mut MarketState,
    updates: &[MonthlyUpdate],
    callback: &mut dyn TurnCallback,
) -> Result<SimulationResult, RunnerError> {
    let monthly_turns = state.clock.last_month();
    info!(
        monthly_turns,
        update_records = updates.len(),
        consumers = state.consumers.len(),
        distributors = state.distributors.len(),
        producers = state.producers.len(),
        "Simulation starting"
    );

    let record_count = u64::try_from(updates.len()).unwrap_or(u64::MAX);
    if record_count < monthly_turns {
        return Err(RunnerError::Input {
            source: MarketError::MalformedInput {
                reason: format!(
                    "{record_count} monthly update records for {monthly_turns} monthly turns"
                ),
            },
        });
    }
    if record_count > monthly_turns {
        warn!(
            ignored = record_count.saturating_sub(monthly_turns),
            "Update records past the last month are ignored"
        );
    }

    let mut summary = turn::run_initial_turn(state)?;
    callback.on_turn(&summary, state);
    let mut total_turns: u64 = 1;

    for update in updates {
        if state.clock.is_finished() {
            break;
        }
        summary = turn::run_monthly_turn(state, update)?;
        callback.on_turn(&summary, state);
        total_turns = total_turns.saturating_add(1);
    }

    let result = SimulationResult {
        final_summary: summary,
        total_turns,
    };
    log_simulation_end(&result);
    Ok(result)
}

/// Log the end of a run.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        total_turns = result.total_turns,
        final_month = result.final_summary.month,
        active_consumers = result.final_summary.active_consumers,
        active_distributors = result.final_summary.active_distributors,
        "Simulation ended"
    );
}
