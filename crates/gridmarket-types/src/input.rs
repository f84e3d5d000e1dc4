//! Input document shapes.
//!
//! The simulation is driven by a single JSON document: a turn count, the
//! initial market population, and one update record per monthly turn.
//! Field names follow the document's camelCase spelling. Every field is
//! required, arrays included: an empty array must be written as `[]`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::{EnergyType, StrategyKind};
use crate::ids::{ConsumerId, DistributorId, ProducerId};

/// The complete input document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationInput {
    /// Number of monthly turns to run after the initial turn.
    pub number_of_turns: u64,
    /// Market population at month 0.
    pub initial_data: InitialData,
    /// One record per monthly turn, in turn order.
    pub monthly_updates: Vec<MonthlyUpdate>,
}

/// The three initial-state arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialData {
    /// Consumers present from month 0.
    pub consumers: Vec<ConsumerRecord>,
    /// Distributors present from month 0.
    pub distributors: Vec<DistributorRecord>,
    /// Producers present from month 0.
    pub producers: Vec<ProducerRecord>,
}

/// A consumer as described in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerRecord {
    /// Consumer id.
    pub id: ConsumerId,
    /// Budget at creation.
    pub initial_budget: i64,
    /// Income received every month.
    pub monthly_income: i64,
}

/// A distributor as described in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributorRecord {
    /// Distributor id.
    pub id: DistributorId,
    /// Length in months of the contracts it signs.
    pub contract_length: i64,
    /// Budget at creation.
    pub initial_budget: i64,
    /// Infrastructure cost at creation.
    pub initial_infrastructure_cost: i64,
    /// Energy the distributor needs every month.
    #[serde(rename = "energyNeededKW")]
    pub energy_needed_kw: i64,
    /// Producer-selection strategy.
    pub producer_strategy: StrategyKind,
}

/// A producer as described in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProducerRecord {
    /// Producer id.
    pub id: ProducerId,
    /// Kind of energy generated.
    pub energy_type: EnergyType,
    /// Maximum number of distributors served concurrently.
    pub max_distributors: u64,
    /// Price per kW (a real number in the document).
    #[serde(rename = "priceKW", with = "rust_decimal::serde::float")]
    pub price_kw: Decimal,
    /// Energy delivered to each served distributor.
    pub energy_per_distributor: i64,
}

/// The deltas applied at the start of one monthly turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyUpdate {
    /// Consumers joining the market this month.
    pub new_consumers: Vec<ConsumerRecord>,
    /// Infrastructure cost overrides.
    pub distributor_changes: Vec<InfrastructureChange>,
    /// Output-per-distributor overrides.
    pub producer_changes: Vec<OutputChange>,
}

/// New infrastructure cost for a named distributor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureChange {
    /// The distributor to update.
    pub id: DistributorId,
    /// Its new infrastructure cost.
    pub infrastructure_cost: i64,
}

/// New output per distributor for a named producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputChange {
    /// The producer to update.
    pub id: ProducerId,
    /// Its new output per served distributor.
    pub energy_per_distributor: i64,
}
