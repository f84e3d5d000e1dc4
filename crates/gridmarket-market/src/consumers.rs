//! The consumer registry.
//!
//! [`ConsumerRegistry`] owns every consumer and settles their monthly
//! payments. Contract renewal happens here: a consumer whose contract ran
//! out, whose distributor went bankrupt, or who never signed picks the
//! cheapest active distributor and enrolls as its client.
//!
//! Bankrupt consumers are skipped by every operation.

use std::collections::BTreeMap;

use gridmarket_types::{Consumer, ConsumerId, Distributor};
use tracing::{debug, info, warn};

use crate::distributors::DistributorRegistry;
use crate::error::MarketError;

/// Owns all consumers, in arrival order.
#[derive(Debug, Default)]
pub struct ConsumerRegistry {
    /// Consumers in arrival order.
    consumers: Vec<Consumer>,
    /// Consumer id -> position in `consumers`.
    index: BTreeMap<ConsumerId, usize>,
}

impl ConsumerRegistry {
    /// Build a registry from the initial consumers.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::MalformedInput`] if two consumers share an id.
    pub fn new(consumers: Vec<Consumer>) -> Result<Self, MarketError> {
        let mut registry = Self::default();
        for consumer in consumers {
            registry.add(consumer)?;
        }
        Ok(registry)
    }

    /// Append a consumer that joins the market.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::MalformedInput`] if the id is already taken.
    pub fn add(&mut self, consumer: Consumer) -> Result<(), MarketError> {
        if self.index.contains_key(&consumer.id) {
            return Err(MarketError::MalformedInput {
                reason: format!("duplicate consumer id {}", consumer.id),
            });
        }
        self.index.insert(consumer.id, self.consumers.len());
        self.consumers.push(consumer);
        Ok(())
    }

    /// Number of consumers, bankrupt ones included.
    pub const fn len(&self) -> usize {
        self.consumers.len()
    }

    /// Whether the registry holds no consumers.
    pub const fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }

    /// Look up a consumer by id.
    pub fn get(&self, id: ConsumerId) -> Option<&Consumer> {
        self.index
            .get(&id)
            .and_then(|&position| self.consumers.get(position))
    }

    /// Iterate over consumers in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &Consumer> {
        self.consumers.iter()
    }

    /// Ids of every consumer, in arrival order.
    pub fn ids(&self) -> Vec<ConsumerId> {
        self.consumers.iter().map(|c| c.id).collect()
    }

    /// Number of consumers that are not bankrupt.
    pub fn active_count(&self) -> usize {
        self.consumers.iter().filter(|c| c.is_active()).count()
    }

    /// Sign every active consumer with `preferred`. Used by the initial turn.
    pub fn bind_all(&mut self, preferred: &Distributor) {
        for consumer in self.consumers.iter_mut().filter(|c| c.is_active()) {
            consumer
                .contract
                .sign(preferred.id, preferred.monthly_rate, preferred.contract_length);
        }
    }

    /// Settle every active consumer's month.
    ///
    /// For each consumer, in arrival order:
    ///
    /// 1. Renew the contract with the cheapest active distributor if it ran
    ///    out, its distributor is bankrupt, or it was never signed.
    /// 2. Without debt: pay the rate. If that would leave the budget
    ///    negative, skip the payment and record a debt of
    ///    `floor(debt_rate * rate)` instead; the contract length is kept.
    /// 3. With debt: pay the rate and the debt. If the budget would not stay
    ///    strictly positive, the consumer goes bankrupt and keeps only its
    ///    income; otherwise the debt is cleared.
    ///
    /// A consumer that cannot find an active distributor only receives its
    /// income this month.
    ///
    /// Returns the consumers that went bankrupt in this call.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ArithmeticOverflow`] on overflow.
    pub fn settle_month(
        &mut self,
        distributors: &mut DistributorRegistry,
    ) -> Result<Vec<ConsumerId>, MarketError> {
        let config = *distributors.config();
        let mut newly_bankrupt = Vec::new();

        for consumer in self.consumers.iter_mut().filter(|c| c.is_active()) {
            let distributor_gone = consumer
                .contract
                .distributor
                .and_then(|id| distributors.get(id))
                .is_none_or(|d| !d.is_active());

            if consumer.contract.is_expired() || distributor_gone {
                let Some(preferred) = distributors.cheapest_active() else {
                    warn!(consumer = %consumer.id, "No active distributor to sign with");
                    consumer.budget = consumer
                        .budget
                        .checked_add(consumer.monthly_income)
                        .ok_or(MarketError::overflow("consumer budget"))?;
                    continue;
                };
                let (id, rate, length) =
                    (preferred.id, preferred.monthly_rate, preferred.contract_length);
                consumer.contract.sign(id, rate, length);
                distributors.enroll_client(id, consumer.id)?;
                debug!(consumer = %consumer.id, distributor = %id, rate, "Contract signed");
            }

            let rate = consumer.contract.monthly_rate;
            let tentative = consumer
                .budget
                .checked_add(consumer.monthly_income)
                .and_then(|b| b.checked_sub(rate))
                .ok_or(MarketError::overflow("consumer budget"))?;

            if consumer.contract.has_debt() {
                let remaining = tentative
                    .checked_sub(consumer.contract.debt)
                    .ok_or(MarketError::overflow("consumer budget"))?;
                if remaining <= 0 {
                    consumer.bankrupt = true;
                    consumer.budget = consumer
                        .budget
                        .checked_add(consumer.monthly_income)
                        .ok_or(MarketError::overflow("consumer budget"))?;
                    info!(
                        consumer = %consumer.id,
                        budget = consumer.budget,
                        debt = consumer.contract.debt,
                        "Consumer went bankrupt"
                    );
                    newly_bankrupt.push(consumer.id);
                } else {
                    consumer.budget = remaining;
                    consumer.contract.debt = 0;
                    consumer.contract.length = consumer.contract.length.saturating_sub(1);
                }
            } else if tentative < 0 {
                consumer.budget = tentative
                    .checked_add(rate)
                    .ok_or(MarketError::overflow("consumer budget"))?;
                consumer.contract.debt = config.debt_for(rate)?;
                debug!(consumer = %consumer.id, debt = consumer.contract.debt, "Payment deferred");
            } else {
                consumer.budget = tentative;
                consumer.contract.length = consumer.contract.length.saturating_sub(1);
            }
        }

        Ok(newly_bankrupt)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gridmarket_types::{DistributorId, StrategyKind};

    use super::*;
    use crate::config::MarketConfig;

    fn distributor(id: u64, rate: i64, contract_length: i64) -> Distributor {
        Distributor {
            id: DistributorId::new(id),
            contract_length,
            infrastructure_cost: 0,
            production_cost: 0,
            monthly_rate: rate,
            client_count: 0,
            total_cost: 0,
            budget: 1_000_000,
            bankrupt: false,
            energy_needed_kw: 0,
            strategy: StrategyKind::Price,
            suppliers: Vec::new(),
            needs_reallocation: false,
            clients: Vec::new(),
        }
    }

    fn distributors(list: Vec<Distributor>) -> DistributorRegistry {
        DistributorRegistry::new(list, MarketConfig::default()).unwrap()
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut registry =
            ConsumerRegistry::new(vec![Consumer::new(ConsumerId::new(0), 10, 10)]).unwrap();
        let result = registry.add(Consumer::new(ConsumerId::new(0), 5, 5));
        assert!(matches!(result, Err(MarketError::MalformedInput { .. })));
        assert!(registry.add(Consumer::new(ConsumerId::new(1), 5, 5)).is_ok());
        assert_eq!(registry.ids(), vec![ConsumerId::new(0), ConsumerId::new(1)]);
    }

    #[test]
    fn bind_all_signs_with_preferred_terms() {
        let mut registry = ConsumerRegistry::new(vec![
            Consumer::new(ConsumerId::new(0), 10, 10),
            Consumer::new(ConsumerId::new(1), 10, 10),
        ])
        .unwrap();
        registry.bind_all(&distributor(4, 120, 6));
        for consumer in registry.iter() {
            assert_eq!(consumer.contract.distributor, Some(DistributorId::new(4)));
            assert_eq!(consumer.contract.monthly_rate, 120);
            assert_eq!(consumer.contract.length, 6);
        }
    }

    #[test]
    fn paying_consumer_decrements_contract() {
        let mut distributors = distributors(vec![distributor(0, 30, 3)]);
        let mut registry =
            ConsumerRegistry::new(vec![Consumer::new(ConsumerId::new(0), 100, 50)]).unwrap();
        registry.bind_all(distributors.get(DistributorId::new(0)).unwrap());

        registry.settle_month(&mut distributors).unwrap();
        let consumer = registry.get(ConsumerId::new(0)).unwrap();
        assert_eq!(consumer.budget, 120);
        assert_eq!(consumer.contract.length, 2);
        assert!(!consumer.contract.has_debt());
    }

    #[test]
    fn missed_payment_becomes_debt_then_bankruptcy() {
        let mut distributors = distributors(vec![distributor(0, 200, 3)]);
        let mut registry =
            ConsumerRegistry::new(vec![Consumer::new(ConsumerId::new(0), 100, 50)]).unwrap();
        registry.bind_all(distributors.get(DistributorId::new(0)).unwrap());

        let bankrupt = registry.settle_month(&mut distributors).unwrap();
        assert!(bankrupt.is_empty());
        let consumer = registry.get(ConsumerId::new(0)).unwrap();
        assert_eq!(consumer.budget, 150);
        assert_eq!(consumer.contract.debt, 240);
        assert_eq!(consumer.contract.length, 3);

        // 150 + 50 - 200 - 240 = -240
        let bankrupt = registry.settle_month(&mut distributors).unwrap();
        assert_eq!(bankrupt, vec![ConsumerId::new(0)]);
        let consumer = registry.get(ConsumerId::new(0)).unwrap().clone();
        assert!(consumer.bankrupt);
        assert_eq!(consumer.budget, 200);

        // Bankrupt consumers are never touched again.
        assert!(registry.settle_month(&mut distributors).unwrap().is_empty());
        assert_eq!(registry.get(ConsumerId::new(0)).unwrap(), &consumer);
    }

    #[test]
    fn settled_debt_is_cleared() {
        let mut distributors = distributors(vec![distributor(0, 100, 3)]);
        let mut consumer = Consumer::new(ConsumerId::new(0), 500, 50);
        consumer.contract.sign(DistributorId::new(0), 100, 3);
        consumer.contract.debt = 120;
        let mut registry = ConsumerRegistry::new(vec![consumer]).unwrap();

        registry.settle_month(&mut distributors).unwrap();
        let consumer = registry.get(ConsumerId::new(0)).unwrap();
        assert!(!consumer.bankrupt);
        assert_eq!(consumer.budget, 500 + 50 - 100 - 120);
        assert_eq!(consumer.contract.debt, 0);
        assert_eq!(consumer.contract.length, 2);
    }

    #[test]
    fn expired_contract_renews_with_cheapest() {
        let mut distributors = distributors(vec![distributor(0, 90, 2), distributor(1, 40, 5)]);
        let mut consumer = Consumer::new(ConsumerId::new(0), 500, 50);
        consumer.contract.sign(DistributorId::new(0), 90, 0);
        let mut registry = ConsumerRegistry::new(vec![consumer]).unwrap();

        registry.settle_month(&mut distributors).unwrap();
        let consumer = registry.get(ConsumerId::new(0)).unwrap();
        assert_eq!(consumer.contract.distributor, Some(DistributorId::new(1)));
        assert_eq!(consumer.contract.length, 4);
        assert_eq!(consumer.budget, 510);
        let cheapest = distributors.get(DistributorId::new(1)).unwrap();
        assert_eq!(cheapest.clients, vec![ConsumerId::new(0)]);
        assert_eq!(cheapest.client_count, 1);
    }

    #[test]
    fn new_consumer_signs_on_first_settlement() {
        let mut distributors = distributors(vec![distributor(0, 10, 2)]);
        let mut registry = ConsumerRegistry::default();
        registry.add(Consumer::new(ConsumerId::new(7), 0, 20)).unwrap();

        registry.settle_month(&mut distributors).unwrap();
        let consumer = registry.get(ConsumerId::new(7)).unwrap();
        assert_eq!(consumer.contract.distributor, Some(DistributorId::new(0)));
        assert_eq!(consumer.budget, 10);
    }

    #[test]
    fn bankrupt_distributor_forces_renewal() {
        let mut broke = distributor(0, 10, 5);
        broke.bankrupt = true;
        let mut distributors = distributors(vec![broke, distributor(1, 20, 5)]);
        let mut consumer = Consumer::new(ConsumerId::new(0), 100, 0);
        consumer.contract.sign(DistributorId::new(0), 10, 3);
        let mut registry = ConsumerRegistry::new(vec![consumer]).unwrap();

        registry.settle_month(&mut distributors).unwrap();
        let consumer = registry.get(ConsumerId::new(0)).unwrap();
        assert_eq!(consumer.contract.distributor, Some(DistributorId::new(1)));
        assert_eq!(consumer.budget, 80);
    }

    #[test]
    fn no_active_distributor_only_pays_income() {
        let mut broke = distributor(0, 10, 5);
        broke.bankrupt = true;
        let mut distributors = distributors(vec![broke]);
        let mut registry =
            ConsumerRegistry::new(vec![Consumer::new(ConsumerId::new(0), 100, 25)]).unwrap();

        registry.settle_month(&mut distributors).unwrap();
        let consumer = registry.get(ConsumerId::new(0)).unwrap();
        assert_eq!(consumer.budget, 125);
        assert!(consumer.contract.distributor.is_none());
    }

    #[test]
    fn debt_follows_consumer_to_new_distributor() {
        let mut broke = distributor(0, 10, 5);
        broke.bankrupt = true;
        let mut distributors = distributors(vec![broke, distributor(1, 50, 5)]);

        let mut cannot_pay = Consumer::new(ConsumerId::new(0), 100, 0);
        cannot_pay.contract.sign(DistributorId::new(0), 10, 3);
        cannot_pay.contract.debt = 120;
        let mut can_pay = Consumer::new(ConsumerId::new(1), 500, 50);
        can_pay.contract.sign(DistributorId::new(0), 10, 3);
        can_pay.contract.debt = 12;
        let mut registry = ConsumerRegistry::new(vec![cannot_pay, can_pay]).unwrap();

        // 100 - 50 - 120 <= 0: the old debt is still owed under the new contract.
        let bankrupt = registry.settle_month(&mut distributors).unwrap();
        assert_eq!(bankrupt, vec![ConsumerId::new(0)]);
        let first = registry.get(ConsumerId::new(0)).unwrap();
        assert_eq!(first.contract.distributor, Some(DistributorId::new(1)));
        assert_eq!(first.contract.debt, 120);
        assert_eq!(first.budget, 100);

        // 500 + 50 - 50 - 12
        let second = registry.get(ConsumerId::new(1)).unwrap();
        assert_eq!(second.budget, 488);
        assert_eq!(second.contract.debt, 0);
        assert_eq!(second.contract.length, 4);

        // Only the consumer that paid this month is collected from.
        distributors.settle_month(&registry).unwrap();
        let new_home = distributors.get(DistributorId::new(1)).unwrap();
        assert_eq!(new_home.budget, 1_000_000 + 50);
        assert_eq!(new_home.clients, vec![ConsumerId::new(1)]);
        assert_eq!(new_home.client_count, 1);
    }
}
