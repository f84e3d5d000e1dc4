//! Market logic for the Gridmarket simulation.
//!
//! This crate holds everything that operates on market state without
//! touching I/O. It sits between `gridmarket-types` (the data structures)
//! and `gridmarket-core` (the turn engine that sequences these operations).
//!
//! # Modules
//!
//! - [`config`] -- Rate, debt and cost parameters ([`MarketConfig`])
//! - [`consumers`] -- Consumer registry and monthly consumer settlement
//! - [`distributors`] -- Distributor registry: allocation, rates, settlement, reallocation
//! - [`error`] -- Error types for all market operations ([`MarketError`])
//! - [`producers`] -- Producer registry, capacity and monthly archive
//! - [`strategy`] -- Producer ranking and greedy allocation (Green, Price, Quantity)

pub mod config;
pub mod consumers;
pub mod distributors;
pub mod error;
pub mod producers;
pub mod strategy;

// Re-export primary types at crate root for convenience.
pub use config::MarketConfig;
pub use consumers::ConsumerRegistry;
pub use distributors::DistributorRegistry;
pub use error::MarketError;
pub use producers::{ProducerChange, ProducerRegistry};
pub use strategy::{
    AllocationPlan, GreenRanking, PriceRanking, ProducerRanking, QuantityRanking,
    StrategyFactory, allocate, plan_allocation, rank_producers,
};
