//! Core entity structs for the energy market.
//!
//! Covers [`Consumer`], [`Contract`], [`Distributor`] and [`Producer`]. These
//! are plain data: the registries in `gridmarket-market` own them and are
//! the only code that mutates them during a turn.
//!
//! Cross references between entities (a distributor's clients, a producer's
//! served distributors, a contract's distributor) are stored as ids, never
//! as owning links.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;

use crate::enums::{EnergyType, StrategyKind};
use crate::ids::{ConsumerId, DistributorId, ProducerId};
use crate::input::{ConsumerRecord, DistributorRecord, ProducerRecord};

// ---------------------------------------------------------------------------
// Consumer
// ---------------------------------------------------------------------------

/// The binding between a consumer and a distributor.
///
/// The monthly rate is copied from the distributor when the contract is
/// signed, so later changes to the distributor's rate do not affect it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contract {
    /// The distributor the contract is signed with (`None` before the first signing).
    pub distributor: Option<DistributorId>,
    /// Rate paid every month, fixed at signing time.
    pub monthly_rate: i64,
    /// Months left to pay. Zero forces a renewal at the next settlement.
    pub length: i64,
    /// Outstanding debt from a missed payment (0 = no debt).
    pub debt: i64,
}

impl Contract {
    /// An empty contract, as held by a freshly created consumer.
    pub const fn unsigned() -> Self {
        Self {
            distributor: None,
            monthly_rate: 0,
            length: 0,
            debt: 0,
        }
    }

    /// Re-bind the contract to a distributor with its current terms.
    ///
    /// Any outstanding debt is carried over unchanged.
    pub const fn sign(&mut self, distributor: DistributorId, monthly_rate: i64, length: i64) {
        self.distributor = Some(distributor);
        self.monthly_rate = monthly_rate;
        self.length = length;
    }

    /// Whether the contract has run out and must be renewed.
    pub const fn is_expired(&self) -> bool {
        self.length <= 0
    }

    /// Whether the consumer owes money from a previous month.
    pub const fn has_debt(&self) -> bool {
        self.debt != 0
    }
}

/// A household that buys energy from one distributor at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumer {
    /// Unique consumer id.
    pub id: ConsumerId,
    /// Income received at the start of every month.
    pub monthly_income: i64,
    /// Current budget. May go negative transiently during settlement.
    pub budget: i64,
    /// Terminal flag: a bankrupt consumer is never settled again.
    pub bankrupt: bool,
    /// The consumer's current contract.
    pub contract: Contract,
}

impl Consumer {
    /// Create a solvent consumer with an unsigned contract.
    pub const fn new(id: ConsumerId, budget: i64, monthly_income: i64) -> Self {
        Self {
            id,
            monthly_income,
            budget,
            bankrupt: false,
            contract: Contract::unsigned(),
        }
    }

    /// Whether the consumer still takes part in the market.
    pub const fn is_active(&self) -> bool {
        !self.bankrupt
    }
}

impl From<&ConsumerRecord> for Consumer {
    fn from(record: &ConsumerRecord) -> Self {
        Self::new(record.id, record.initial_budget, record.monthly_income)
    }
}

// ---------------------------------------------------------------------------
// Distributor
// ---------------------------------------------------------------------------

/// A reseller that buys energy from producers and sells it to consumers.
///
/// `production_cost`, `monthly_rate`, `client_count` and `total_cost` are
/// derived values recomputed by the distributor registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distributor {
    /// Unique distributor id.
    pub id: DistributorId,
    /// Length in months of every contract this distributor signs.
    pub contract_length: i64,
    /// Fixed monthly infrastructure cost. May be overridden by a monthly update.
    pub infrastructure_cost: i64,
    /// Monthly cost of the energy bought from the current suppliers.
    pub production_cost: i64,
    /// Rate offered to new clients.
    pub monthly_rate: i64,
    /// Number of clients currently billed.
    pub client_count: i64,
    /// Total cost of the last settlement.
    pub total_cost: i64,
    /// Current budget.
    pub budget: i64,
    /// Terminal flag: a bankrupt distributor is frozen but still reported.
    pub bankrupt: bool,
    /// Energy (kW) the distributor must buy every month.
    pub energy_needed_kw: i64,
    /// How the distributor picks its suppliers.
    pub strategy: StrategyKind,
    /// Producers currently supplying this distributor, in selection order.
    pub suppliers: Vec<ProducerId>,
    /// Set when a supplier changed its output; cleared by reallocation.
    pub needs_reallocation: bool,
    /// Consumers currently under contract, in signing order.
    pub clients: Vec<ConsumerId>,
}

impl Distributor {
    /// Whether the distributor still takes part in the market.
    pub const fn is_active(&self) -> bool {
        !self.bankrupt
    }

    /// Whether the given producer is one of this distributor's suppliers.
    pub fn is_supplied_by(&self, producer: ProducerId) -> bool {
        self.suppliers.contains(&producer)
    }
}

impl From<&DistributorRecord> for Distributor {
    fn from(record: &DistributorRecord) -> Self {
        Self {
            id: record.id,
            contract_length: record.contract_length,
            infrastructure_cost: record.initial_infrastructure_cost,
            production_cost: 0,
            monthly_rate: 0,
            client_count: 0,
            total_cost: 0,
            budget: record.initial_budget,
            bankrupt: false,
            energy_needed_kw: record.energy_needed_kw,
            strategy: record.producer_strategy,
            suppliers: Vec::new(),
            needs_reallocation: false,
            clients: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Producer
// ---------------------------------------------------------------------------

/// A power plant selling a fixed amount of energy to each distributor it serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Producer {
    /// Unique producer id.
    pub id: ProducerId,
    /// Maximum number of distributors served at the same time.
    pub max_distributors: u64,
    /// The kind of energy generated.
    pub energy_type: EnergyType,
    /// Energy (kW) delivered to each served distributor.
    pub energy_per_distributor: i64,
    /// Price per kW.
    pub price_kw: Decimal,
    /// Distributors served right now.
    pub serving: BTreeSet<DistributorId>,
    /// Month number -> distributors served that month, ascending.
    pub monthly_history: BTreeMap<u64, Vec<DistributorId>>,
}

impl Producer {
    /// Whether the producer already serves as many distributors as allowed.
    pub fn is_at_capacity(&self) -> bool {
        u64::try_from(self.serving.len()).map_or(true, |served| served >= self.max_distributors)
    }
}

impl From<&ProducerRecord> for Producer {
    fn from(record: &ProducerRecord) -> Self {
        Self {
            id: record.id,
            max_distributors: record.max_distributors,
            energy_type: record.energy_type,
            energy_per_distributor: record.energy_per_distributor,
            price_kw: record.price_kw,
            serving: BTreeSet::new(),
            monthly_history: BTreeMap::new(),
        }
    }
}
