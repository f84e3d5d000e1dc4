//! Month clock, turn cycle, and orchestration for the Gridmarket simulation.
//!
//! This crate owns the turn cycle that drives the market: the initial turn
//! (allocate, price, bind, settle) and the monthly turn (deltas, price,
//! purge, settle, reconcile, archive).
//!
//! # Modules
//!
//! - [`clock`] -- Month clock with checked advancement and a run horizon.
//! - [`config`] -- Configuration loading from YAML into strongly-typed structs.
//! - [`report`] -- Final report assembly from the market registries.
//! - [`runner`] -- Whole-run loop with a per-turn [`TurnCallback`].
//! - [`turn`] -- The initial and monthly turn cycles over [`MarketState`].
//!
//! [`TurnCallback`]: runner::TurnCallback
//! [`MarketState`]: turn::MarketState

pub mod clock;
pub mod config;
pub mod report;
pub mod runner;
pub mod turn;

pub use clock::{ClockError, MonthClock};
pub use config::{ConfigError, SimulationConfig};
pub use report::build_report;
pub use runner::{NoOpCallback, RunnerError, SimulationResult, TurnCallback, run_simulation};
pub use turn::{MarketState, TurnError, TurnSummary, run_initial_turn, run_monthly_turn};
