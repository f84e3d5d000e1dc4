//! Final report shapes.
//!
//! The report lists every participant ever created, bankrupt ones included,
//! in registry order. Field names follow the report document's spelling.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::{EnergyType, StrategyKind};
use crate::ids::{ConsumerId, DistributorId, ProducerId};

/// The complete report written at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketReport {
    /// One entry per consumer.
    pub consumers: Vec<ConsumerReport>,
    /// One entry per distributor.
    pub distributors: Vec<DistributorReport>,
    /// One entry per producer.
    pub energy_producers: Vec<ProducerReport>,
}

/// Final state of a consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerReport {
    /// Consumer id.
    pub id: ConsumerId,
    /// Whether the consumer went bankrupt.
    pub is_bankrupt: bool,
    /// Final budget.
    pub budget: i64,
}

/// Final state of a distributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributorReport {
    /// Distributor id.
    pub id: DistributorId,
    /// Energy needed every month.
    #[serde(rename = "energyNeededKW")]
    pub energy_needed_kw: i64,
    /// Current monthly rate.
    pub contract_cost: i64,
    /// Final budget.
    pub budget: i64,
    /// Producer-selection strategy.
    pub producer_strategy: StrategyKind,
    /// Whether the distributor went bankrupt.
    pub is_bankrupt: bool,
    /// Current clients.
    pub contracts: Vec<ContractReport>,
}

/// One client line of a distributor report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractReport {
    /// The client.
    pub consumer_id: ConsumerId,
    /// The rate fixed in the client's contract.
    pub price: i64,
    /// Months left on the contract.
    pub remained_contract_months: i64,
}

/// Final state of a producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProducerReport {
    /// Producer id.
    pub id: ProducerId,
    /// Maximum number of distributors served concurrently.
    pub max_distributors: u64,
    /// Price per kW.
    #[serde(rename = "priceKW", with = "rust_decimal::serde::float")]
    pub price_kw: Decimal,
    /// Kind of energy generated.
    pub energy_type: EnergyType,
    /// Output per served distributor.
    pub energy_per_distributor: i64,
    /// Served distributors, month by month.
    pub monthly_stats: Vec<MonthlyStat>,
}

/// The distributors a producer served during one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStat {
    /// Month number (1 = first monthly turn).
    pub month: u64,
    /// Served distributors, ascending.
    pub distributors_ids: Vec<DistributorId>,
}
