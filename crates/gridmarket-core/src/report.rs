//! Final report assembly.
//!
//! [`build_report`] reads the three registries and produces a
//! [`MarketReport`] listing every entity ever created, bankrupt ones
//! included, in registry order.

use gridmarket_types::{
    ConsumerReport, ContractReport, DistributorReport, MarketReport, MonthlyStat, ProducerReport,
};

use crate::turn::MarketState;

/// Build the final report from the market state.
///
/// A distributor's contracts are read from its current clients; clients
/// that are no longer known are left out.
pub fn build_report(state: &MarketState) -> MarketReport {
    let consumers = state
        .consumers
        .iter()
        .map(|consumer| ConsumerReport {
            id: consumer.id,
            is_bankrupt: consumer.bankrupt,
            budget: consumer.budget,
        })
        .collect();

    let distributors = state
        .distributors
        .iter()
        .map(|distributor| DistributorReport {
            id: distributor.id,
            energy_needed_kw: distributor.energy_needed_kw,
            contract_cost: distributor.monthly_rate,
            budget: distributor.budget,
            producer_strategy: distributor.strategy,
            is_bankrupt: distributor.bankrupt,
            contracts: distributor
                .clients
                .iter()
                .filter_map(|&client| state.consumers.get(client))
                .map(|consumer| ContractReport {
                    consumer_id: consumer.id,
                    price: consumer.contract.monthly_rate,
                    remained_contract_months: consumer.contract.length,
                })
                .collect(),
        })
        .collect();

    let energy_producers = state
        .producers
        .iter()
        .map(|producer| ProducerReport {
            id: producer.id,
            max_distributors: producer.max_distributors,
            price_kw: producer.price_kw,
            energy_type: producer.energy_type,
            energy_per_distributor: producer.energy_per_distributor,
            monthly_stats: producer
                .monthly_history
                .iter()
                .map(|(&month, served)| MonthlyStat {
                    month,
                    distributors_ids: served.clone(),
                })
                .collect(),
        })
        .collect();

    MarketReport {
        consumers,
        distributors,
        energy_producers,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gridmarket_market::MarketConfig;
    use gridmarket_types::{
        ConsumerRecord, DistributorId, DistributorRecord, EnergyType, InitialData, MonthlyUpdate,
        ProducerId, ProducerRecord, StrategyKind,
    };
    use rust_decimal::Decimal;

    use super::*;
    use crate::turn::{run_initial_turn, run_monthly_turn};

    #[test]
    fn report_lists_every_entity_in_order() {
        let data = InitialData {
            consumers: vec![
                ConsumerRecord {
                    id: gridmarket_types::ConsumerId::new(0),
                    initial_budget: 10,
                    monthly_income: 5,
                },
                ConsumerRecord {
                    id: gridmarket_types::ConsumerId::new(1),
                    initial_budget: 1000,
                    monthly_income: 500,
                },
            ],
            distributors: vec![DistributorRecord {
                id: DistributorId::new(0),
                contract_length: 3,
                initial_budget: 100,
                initial_infrastructure_cost: 20,
                energy_needed_kw: 50,
                producer_strategy: StrategyKind::Green,
            }],
            producers: vec![ProducerRecord {
                id: ProducerId::new(0),
                energy_type: EnergyType::Solar,
                max_distributors: 1,
                price_kw: Decimal::new(2, 0),
                energy_per_distributor: 50,
            }],
        };
        let mut state =
            crate::turn::MarketState::from_initial_data(&data, MarketConfig::default(), 2).unwrap();
        run_initial_turn(&mut state).unwrap();
        run_monthly_turn(&mut state, &MonthlyUpdate::default()).unwrap();
        run_monthly_turn(&mut state, &MonthlyUpdate::default()).unwrap();

        let report = build_report(&state);
        assert_eq!(report.consumers.len(), 2);
        assert_eq!(report.distributors.len(), 1);

        let distributor = report.distributors.first().unwrap();
        assert_eq!(distributor.producer_strategy, StrategyKind::Green);
        assert_eq!(distributor.energy_needed_kw, 50);
        let contract_ids: Vec<_> = distributor.contracts.iter().map(|c| c.consumer_id).collect();
        let live = state.distributors.get(DistributorId::new(0)).unwrap();
        assert_eq!(contract_ids, live.clients);

        let producer = report.energy_producers.first().unwrap();
        let months: Vec<u64> = producer.monthly_stats.iter().map(|s| s.month).collect();
        assert_eq!(months, vec![1, 2]);
        assert_eq!(
            producer.monthly_stats.first().unwrap().distributors_ids,
            vec![DistributorId::new(0)]
        );
    }
}
