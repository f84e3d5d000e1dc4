//! Shared type definitions for the Gridmarket energy market simulation.
//!
//! This crate is the single source of truth for the data that flows between
//! the market logic, the turn engine and the I/O boundary.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe `u64` wrappers for consumer, distributor and producer ids
//! - [`enums`] -- Energy types and producer-selection strategy kinds
//! - [`structs`] -- Core entity structs (consumers, contracts, distributors, producers)
//! - [`input`] -- Shapes of the input document (initial data and monthly updates)
//! - [`report`] -- Shapes of the final report

pub mod enums;
pub mod ids;
pub mod input;
pub mod report;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{EnergyType, StrategyKind};
pub use ids::{ConsumerId, DistributorId, ProducerId};
pub use input::{
    ConsumerRecord, DistributorRecord, InfrastructureChange, InitialData, MonthlyUpdate,
    OutputChange, ProducerRecord, SimulationInput,
};
pub use report::{
    ConsumerReport, ContractReport, DistributorReport, MarketReport, MonthlyStat, ProducerReport,
};
pub use structs::{Consumer, Contract, Distributor, Producer};
