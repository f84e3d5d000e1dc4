//! The distributor registry.
//!
//! [`DistributorRegistry`] owns every distributor and runs the monthly
//! pipeline on them: supplier allocation, rate computation, contract
//! purging, settlement and reallocation after producer output changes.
//!
//! Unless stated otherwise, every operation skips bankrupt distributors. A
//! bankrupt distributor keeps its last budget, rate and suppliers for the
//! final report and is never recomputed.

use std::collections::BTreeMap;

use gridmarket_types::{ConsumerId, Distributor, DistributorId, ProducerId};
use tracing::{debug, info};

use crate::config::MarketConfig;
use crate::consumers::ConsumerRegistry;
use crate::error::MarketError;
use crate::producers::ProducerRegistry;
use crate::strategy::{self, StrategyFactory};

/// Owns all distributors, in input order.
#[derive(Debug, Default)]
pub struct DistributorRegistry {
    /// Distributors in input order.
    distributors: Vec<Distributor>,
    /// Distributor id -> position in `distributors`.
    index: BTreeMap<DistributorId, usize>,
    /// Rate and cost parameters.
    config: MarketConfig,
}

impl DistributorRegistry {
    /// Build a registry from the initial distributors.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::MalformedInput`] if two distributors share an id.
    pub fn new(distributors: Vec<Distributor>, config: MarketConfig) -> Result<Self, MarketError> {
        let mut index = BTreeMap::new();
        for (position, distributor) in distributors.iter().enumerate() {
            if index.insert(distributor.id, position).is_some() {
                return Err(MarketError::MalformedInput {
                    reason: format!("duplicate distributor id {}", distributor.id),
                });
            }
        }
        Ok(Self {
            distributors,
            index,
            config,
        })
    }

    /// The market parameters used by this registry.
    pub const fn config(&self) -> &MarketConfig {
        &self.config
    }

    /// Number of distributors, bankrupt ones included.
    pub const fn len(&self) -> usize {
        self.distributors.len()
    }

    /// Whether the registry holds no distributors.
    pub const fn is_empty(&self) -> bool {
        self.distributors.is_empty()
    }

    /// Look up a distributor by id.
    pub fn get(&self, id: DistributorId) -> Option<&Distributor> {
        self.index
            .get(&id)
            .and_then(|&position| self.distributors.get(position))
    }

    fn get_mut(&mut self, id: DistributorId) -> Result<&mut Distributor, MarketError> {
        self.index
            .get(&id)
            .and_then(|&position| self.distributors.get_mut(position))
            .ok_or(MarketError::DistributorNotFound(id))
    }

    /// Iterate over distributors in input order.
    pub fn iter(&self) -> impl Iterator<Item = &Distributor> {
        self.distributors.iter()
    }

    /// Number of distributors that are not bankrupt.
    pub fn active_count(&self) -> usize {
        self.distributors.iter().filter(|d| d.is_active()).count()
    }

    /// Run every distributor's strategy once and price the chosen suppliers.
    ///
    /// # Errors
    ///
    /// Propagates [`MarketError::UnresolvableAllocation`] from the first
    /// distributor whose need cannot be covered.
    pub fn initialize_allocations(
        &mut self,
        factory: StrategyFactory,
        producers: &mut ProducerRegistry,
    ) -> Result<(), MarketError> {
        let config = self.config;
        for distributor in self.distributors.iter_mut().filter(|d| d.is_active()) {
            distributor.suppliers = strategy::allocate(
                factory,
                distributor.strategy,
                distributor.id,
                distributor.energy_needed_kw,
                producers,
            )?;
            distributor.production_cost =
                config.production_cost(producers.supply_cost(&distributor.suppliers)?)?;
        }
        Ok(())
    }

    /// Set the rate offered before any client is signed.
    ///
    /// `rate = infrastructure + production + profit`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ArithmeticOverflow`] on overflow.
    pub fn compute_initial_rates(&mut self) -> Result<(), MarketError> {
        let config = self.config;
        for distributor in self.distributors.iter_mut().filter(|d| d.is_active()) {
            distributor.monthly_rate = rate(&config, distributor, distributor.infrastructure_cost)?;
        }
        Ok(())
    }

    /// Recompute every rate from the current client base.
    ///
    /// A clientless distributor charges the full infrastructure cost; with
    /// clients, the infrastructure cost is split between them (floored).
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ArithmeticOverflow`] on overflow.
    pub fn compute_monthly_rates(&mut self) -> Result<(), MarketError> {
        let config = self.config;
        for distributor in self.distributors.iter_mut().filter(|d| d.is_active()) {
            let infrastructure_share = if distributor.client_count == 0 {
                distributor.infrastructure_cost
            } else {
                distributor
                    .infrastructure_cost
                    .checked_div_euclid(distributor.client_count)
                    .ok_or(MarketError::overflow("infrastructure share"))?
            };
            distributor.monthly_rate = rate(&config, distributor, infrastructure_share)?;
        }
        Ok(())
    }

    /// Drop clients whose contract has run out, and ids that are unknown.
    ///
    /// The dropped consumers re-sign during their own settlement.
    pub fn purge_expired_contracts(&mut self, consumers: &ConsumerRegistry) {
        for distributor in self.distributors.iter_mut().filter(|d| d.is_active()) {
            distributor.clients.retain(|&client| {
                consumers
                    .get(client)
                    .is_some_and(|consumer| !consumer.contract.is_expired())
            });
            distributor.client_count = count(&distributor.clients);
        }
    }

    /// Settle every distributor's month.
    ///
    /// `budget' = budget - (infrastructure + clients * production) + paid`,
    /// where `paid` sums the rates of clients without debt. A negative
    /// budget makes the distributor bankrupt; it then releases its clients,
    /// who re-sign elsewhere at their next settlement, so its final report
    /// lists no contracts. Bankrupt clients are purged either way.
    ///
    /// Returns the distributors that went bankrupt in this call.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ArithmeticOverflow`] on overflow.
    pub fn settle_month(
        &mut self,
        consumers: &ConsumerRegistry,
    ) -> Result<Vec<DistributorId>, MarketError> {
        let mut newly_bankrupt = Vec::new();

        for distributor in self.distributors.iter_mut().filter(|d| d.is_active()) {
            distributor.client_count = count(&distributor.clients);
            distributor.total_cost = distributor
                .client_count
                .checked_mul(distributor.production_cost)
                .and_then(|energy| energy.checked_add(distributor.infrastructure_cost))
                .ok_or(MarketError::overflow("distributor total cost"))?;

            let paid = distributor
                .clients
                .iter()
                .filter_map(|&client| consumers.get(client))
                .filter(|consumer| !consumer.contract.has_debt())
                .try_fold(0_i64, |total, consumer| {
                    total.checked_add(consumer.contract.monthly_rate)
                })
                .ok_or(MarketError::overflow("distributor revenue"))?;

            let budget = distributor
                .budget
                .checked_sub(distributor.total_cost)
                .and_then(|b| b.checked_add(paid))
                .ok_or(MarketError::overflow("distributor budget"))?;
            distributor.budget = budget;

            if budget < 0 {
                distributor.bankrupt = true;
                info!(
                    distributor = %distributor.id,
                    budget,
                    clients = distributor.clients.len(),
                    "Distributor went bankrupt"
                );
                distributor.clients.clear();
                newly_bankrupt.push(distributor.id);
            } else {
                distributor.clients.retain(|&client| {
                    consumers
                        .get(client)
                        .is_some_and(|consumer| consumer.is_active())
                });
            }
            distributor.client_count = count(&distributor.clients);
        }

        Ok(newly_bankrupt)
    }

    /// The active distributor with the strictly smallest rate.
    ///
    /// Ties go to the one that comes first in input order. Returns `None`
    /// when every distributor is bankrupt.
    pub fn cheapest_active(&self) -> Option<&Distributor> {
        self.distributors
            .iter()
            .filter(|d| d.is_active())
            .fold(None, |best: Option<&Distributor>, candidate| match best {
                Some(current) if current.monthly_rate <= candidate.monthly_rate => Some(current),
                _ => Some(candidate),
            })
    }

    /// Flag every active distributor supplied by `producer` for reallocation.
    ///
    /// Returns how many distributors were flagged.
    pub fn flag_producer_change(&mut self, producer: ProducerId) -> usize {
        let mut flagged: usize = 0;
        for distributor in self
            .distributors
            .iter_mut()
            .filter(|d| d.is_active() && d.is_supplied_by(producer))
        {
            distributor.needs_reallocation = true;
            flagged = flagged.saturating_add(1);
        }
        flagged
    }

    /// Re-run the strategy of every flagged distributor.
    ///
    /// Each flagged distributor is detached from all of its suppliers before
    /// its strategy runs again, so it may pick the same producers. Returns
    /// the reallocated distributors in input order.
    ///
    /// # Errors
    ///
    /// Propagates [`MarketError::UnresolvableAllocation`] from the first
    /// distributor whose need cannot be covered.
    pub fn reconcile_producer_changes(
        &mut self,
        factory: StrategyFactory,
        producers: &mut ProducerRegistry,
    ) -> Result<Vec<DistributorId>, MarketError> {
        let config = self.config;
        let mut reallocated = Vec::new();

        for distributor in self
            .distributors
            .iter_mut()
            .filter(|d| d.is_active() && d.needs_reallocation)
        {
            for &supplier in &distributor.suppliers {
                producers.unbind(supplier, distributor.id)?;
            }
            distributor.suppliers = strategy::allocate(
                factory,
                distributor.strategy,
                distributor.id,
                distributor.energy_needed_kw,
                producers,
            )?;
            distributor.needs_reallocation = false;
            distributor.production_cost =
                config.production_cost(producers.supply_cost(&distributor.suppliers)?)?;

            debug!(
                distributor = %distributor.id,
                production_cost = distributor.production_cost,
                "Distributor reallocated"
            );
            reallocated.push(distributor.id);
        }

        Ok(reallocated)
    }

    /// Override a distributor's infrastructure cost.
    ///
    /// A bankrupt distributor stays frozen; the override is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::DistributorNotFound`] for an unknown id.
    pub fn set_infrastructure_cost(
        &mut self,
        id: DistributorId,
        infrastructure_cost: i64,
    ) -> Result<(), MarketError> {
        let distributor = self.get_mut(id)?;
        if distributor.bankrupt {
            debug!(distributor = %id, "Infrastructure change ignored for bankrupt distributor");
            return Ok(());
        }
        distributor.infrastructure_cost = infrastructure_cost;
        Ok(())
    }

    /// Add a consumer to a distributor's clients. Enrolling twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::DistributorNotFound`] for an unknown id.
    pub fn enroll_client(
        &mut self,
        id: DistributorId,
        consumer: ConsumerId,
    ) -> Result<(), MarketError> {
        let distributor = self.get_mut(id)?;
        if !distributor.clients.contains(&consumer) {
            distributor.clients.push(consumer);
        }
        distributor.client_count = count(&distributor.clients);
        Ok(())
    }

    /// Record the initial turn's binding of every consumer to `preferred`.
    ///
    /// `preferred` takes all consumers as clients and pays for their energy;
    /// every other distributor starts with its infrastructure cost only.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::DistributorNotFound`] if `preferred` is
    /// unknown, or [`MarketError::ArithmeticOverflow`] on overflow.
    pub fn mirror_initial_binding(
        &mut self,
        preferred: DistributorId,
        consumers: &[ConsumerId],
    ) -> Result<(), MarketError> {
        if self.get(preferred).is_none() {
            return Err(MarketError::DistributorNotFound(preferred));
        }
        for distributor in &mut self.distributors {
            if distributor.id == preferred {
                distributor.clients = consumers.to_vec();
                distributor.client_count = count(&distributor.clients);
                distributor.total_cost = distributor
                    .production_cost
                    .checked_mul(distributor.client_count)
                    .and_then(|energy| energy.checked_add(distributor.infrastructure_cost))
                    .ok_or(MarketError::overflow("initial total cost"))?;
            } else {
                distributor.total_cost = distributor.infrastructure_cost;
            }
        }
        Ok(())
    }
}

/// `infrastructure_share + production + profit(production)`.
fn rate(
    config: &MarketConfig,
    distributor: &Distributor,
    infrastructure_share: i64,
) -> Result<i64, MarketError> {
    let profit = config.profit(distributor.production_cost)?;
    infrastructure_share
        .checked_add(distributor.production_cost)
        .and_then(|r| r.checked_add(profit))
        .ok_or(MarketError::overflow("monthly rate"))
}

fn count(clients: &[ConsumerId]) -> i64 {
    i64::try_from(clients.len()).unwrap_or(i64::MAX)
}
