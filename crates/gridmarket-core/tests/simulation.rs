//! Integration tests for whole simulation runs.
//!
//! Each test parses an input document, runs it through the runner, and
//! checks the resulting state or report. Per-turn invariants are checked
//! from a [`TurnCallback`] so they hold after every turn, not just at the
//! end.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::collections::BTreeMap;

use gridmarket_core::{
    MarketState, NoOpCallback, RunnerError, TurnCallback, TurnSummary, build_report,
    run_simulation,
};
use gridmarket_market::{MarketConfig, MarketError};
use gridmarket_types::{
    ConsumerId, Distributor, DistributorId, MarketReport, ProducerId, SimulationInput,
};

fn parse(document: &str) -> SimulationInput {
    serde_json::from_str(document).unwrap()
}

fn run(input: &SimulationInput, callback: &mut dyn TurnCallback) -> MarketState {
    let mut state = MarketState::from_initial_data(
        &input.initial_data,
        MarketConfig::default(),
        input.number_of_turns,
    )
    .unwrap();
    run_simulation(&mut state, &input.monthly_updates, callback).unwrap();
    state
}

/// One consumer who cannot afford its distributor.
const DEBT_SCENARIO: &str = r#"{
  "numberOfTurns": 2,
  "initialData": {
    "consumers": [
      { "id": 0, "initialBudget": 100, "monthlyIncome": 50 }
    ],
    "distributors": [
      { "id": 0, "contractLength": 3, "initialBudget": 1000,
        "initialInfrastructureCost": 200, "energyNeededKW": 10,
        "producerStrategy": "PRICE" }
    ],
    "producers": [
      { "id": 0, "energyType": "COAL", "maxDistributors": 1,
        "priceKW": 0.0, "energyPerDistributor": 10 }
    ]
  },
  "monthlyUpdates": [
    { "newConsumers": [], "distributorChanges": [], "producerChanges": [] },
    { "newConsumers": [], "distributorChanges": [], "producerChanges": [] }
  ]
}"#;

/// Two distributors; the cheaper one is priced out of the market in month 1.
const BANKRUPTCY_SCENARIO: &str = r#"{
  "numberOfTurns": 3,
  "initialData": {
    "consumers": [
      { "id": 0, "initialBudget": 10000, "monthlyIncome": 1000 },
      { "id": 1, "initialBudget": 10000, "monthlyIncome": 1000 }
    ],
    "distributors": [
      { "id": 0, "contractLength": 5, "initialBudget": 10,
        "initialInfrastructureCost": 100, "energyNeededKW": 10,
        "producerStrategy": "QUANTITY" },
      { "id": 1, "contractLength": 5, "initialBudget": 10000,
        "initialInfrastructureCost": 150, "energyNeededKW": 10,
        "producerStrategy": "GREEN" }
    ],
    "producers": [
      { "id": 0, "energyType": "NUCLEAR", "maxDistributors": 2,
        "priceKW": 1.0, "energyPerDistributor": 10 }
    ]
  },
  "monthlyUpdates": [
    { "newConsumers": [], "producerChanges": [],
      "distributorChanges": [ { "id": 0, "infrastructureCost": 100000 } ] },
    { "newConsumers": [], "distributorChanges": [], "producerChanges": [] },
    { "newConsumers": [], "distributorChanges": [], "producerChanges": [] }
  ]
}"#;

/// A mixed market with output changes and newcomers.
const MIXED_SCENARIO: &str = r#"{
  "numberOfTurns": 4,
  "initialData": {
    "consumers": [
      { "id": 0, "initialBudget": 300, "monthlyIncome": 120 },
      { "id": 1, "initialBudget": 40, "monthlyIncome": 30 },
      { "id": 2, "initialBudget": 900, "monthlyIncome": 200 }
    ],
    "distributors": [
      { "id": 0, "contractLength": 2, "initialBudget": 500,
        "initialInfrastructureCost": 60, "energyNeededKW": 2000,
        "producerStrategy": "GREEN" },
      { "id": 1, "contractLength": 3, "initialBudget": 800,
        "initialInfrastructureCost": 45, "energyNeededKW": 1500,
        "producerStrategy": "PRICE" },
      { "id": 2, "contractLength": 1, "initialBudget": 200,
        "initialInfrastructureCost": 80, "energyNeededKW": 1000,
        "producerStrategy": "QUANTITY" }
    ],
    "producers": [
      { "id": 0, "energyType": "WIND", "maxDistributors": 2,
        "priceKW": 0.02, "energyPerDistributor": 1200 },
      { "id": 1, "energyType": "COAL", "maxDistributors": 3,
        "priceKW": 0.01, "energyPerDistributor": 1800 },
      { "id": 2, "energyType": "SOLAR", "maxDistributors": 2,
        "priceKW": 0.03, "energyPerDistributor": 900 },
      { "id": 3, "energyType": "HYDRO", "maxDistributors": 1,
        "priceKW": 0.015, "energyPerDistributor": 700 }
    ]
  },
  "monthlyUpdates": [
    { "newConsumers": [], "distributorChanges": [],
      "producerChanges": [ { "id": 1, "energyPerDistributor": 600 } ] },
    { "newConsumers": [ { "id": 3, "initialBudget": 50, "monthlyIncome": 400 } ],
      "distributorChanges": [], "producerChanges": [] },
    { "newConsumers": [],
      "distributorChanges": [ { "id": 2, "infrastructureCost": 10 } ],
      "producerChanges": [ { "id": 0, "energyPerDistributor": 2500 } ] },
    { "newConsumers": [], "distributorChanges": [], "producerChanges": [] }
  ]
}"#;

/// Checks per-turn invariants and snapshots bankrupt entities.
#[derive(Default)]
struct InvariantChecker {
    turns: u64,
    frozen_distributors: BTreeMap<DistributorId, Distributor>,
    frozen_consumers: BTreeMap<ConsumerId, i64>,
}

impl TurnCallback for InvariantChecker {
    fn on_turn(&mut self, summary: &TurnSummary, state: &MarketState) {
        self.turns = self.turns.saturating_add(1);
        assert_eq!(summary.month, state.month());

        for distributor in state.distributors.iter() {
            assert_eq!(
                distributor.client_count,
                i64::try_from(distributor.clients.len()).unwrap(),
                "stale client count for distributor {}",
                distributor.id
            );
            assert!(!distributor.needs_reallocation || distributor.bankrupt);
            if let Some(frozen) = self.frozen_distributors.get(&distributor.id) {
                assert_eq!(distributor, frozen, "bankrupt distributor mutated");
            } else if distributor.bankrupt {
                self.frozen_distributors
                    .insert(distributor.id, distributor.clone());
            }
        }

        for consumer in state.consumers.iter() {
            if let Some(&budget) = self.frozen_consumers.get(&consumer.id) {
                assert!(consumer.bankrupt);
                assert_eq!(consumer.budget, budget, "bankrupt consumer mutated");
            } else if consumer.bankrupt {
                self.frozen_consumers.insert(consumer.id, consumer.budget);
            }
        }

        for producer in state.producers.iter() {
            assert!(u64::try_from(producer.serving.len()).unwrap() <= producer.max_distributors);
        }
    }
}

#[test]
fn debt_then_bankruptcy_end_to_end() {
    let input = parse(DEBT_SCENARIO);
    let mut checker = InvariantChecker::default();
    let state = run(&input, &mut checker);
    assert_eq!(checker.turns, 3);

    let report = build_report(&state);
    let consumer = &report.consumers[0];
    assert!(consumer.is_bankrupt);
    // Month 0: 100 + 50 - 200 < 0, so the payment becomes a debt of 240.
    // Month 1: 150 + 50 - 200 - 240 <= 0, bankrupt with 150 + 50.
    assert_eq!(consumer.budget, 200);

    let distributor = &report.distributors[0];
    assert!(!distributor.is_bankrupt);
    // Three months of infrastructure cost, no payment ever collected.
    assert_eq!(distributor.budget, 400);
    assert_eq!(distributor.contract_cost, 200);
    assert!(distributor.contracts.is_empty());

    let stats = &report.energy_producers[0].monthly_stats;
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0].month, 1);
    assert_eq!(stats[1].distributors_ids, vec![DistributorId::new(0)]);
}

#[test]
fn bankrupt_distributor_loses_its_clients() {
    let input = parse(BANKRUPTCY_SCENARIO);
    let mut checker = InvariantChecker::default();
    let state = run(&input, &mut checker);

    let broke = state.distributors.get(DistributorId::new(0)).unwrap();
    assert!(broke.bankrupt);
    assert!(broke.clients.is_empty());
    assert!(checker.frozen_distributors.contains_key(&DistributorId::new(0)));

    let survivor = state.distributors.get(DistributorId::new(1)).unwrap();
    assert!(!survivor.bankrupt);
    for consumer in state.consumers.iter() {
        assert_eq!(consumer.contract.distributor, Some(DistributorId::new(1)));
        assert!(survivor.clients.contains(&consumer.id));
    }

    // The bankrupt distributor keeps its supplier for reporting.
    let producer = state.producers.get(ProducerId::new(0)).unwrap();
    assert!(producer.serving.contains(&DistributorId::new(0)));
}

#[test]
fn mixed_market_keeps_invariants() {
    let input = parse(MIXED_SCENARIO);
    let mut checker = InvariantChecker::default();
    let state = run(&input, &mut checker);
    assert_eq!(checker.turns, 5);

    let report = build_report(&state);
    assert_eq!(report.consumers.len(), 4);
    assert_eq!(report.distributors.len(), 3);
    for producer in &report.energy_producers {
        let months: Vec<u64> = producer.monthly_stats.iter().map(|s| s.month).collect();
        assert_eq!(months, vec![1, 2, 3, 4]);
        for stat in &producer.monthly_stats {
            assert!(stat.distributors_ids.windows(2).all(|w| w[0] < w[1]));
        }
    }
    for distributor in report.distributors.iter().filter(|d| !d.is_bankrupt) {
        for contract in &distributor.contracts {
            let consumer = state.consumers.get(contract.consumer_id).unwrap();
            assert_eq!(consumer.contract.distributor, Some(distributor.id));
            assert!(!consumer.bankrupt);
        }
    }
}

#[test]
fn identical_input_gives_identical_report() {
    let input = parse(MIXED_SCENARIO);
    let first: MarketReport = build_report(&run(&input, &mut NoOpCallback));
    let second: MarketReport = build_report(&run(&input, &mut NoOpCallback));
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn short_update_list_is_malformed() {
    let mut input = parse(DEBT_SCENARIO);
    input.number_of_turns = 5;
    let mut state = MarketState::from_initial_data(
        &input.initial_data,
        MarketConfig::default(),
        input.number_of_turns,
    )
    .unwrap();
    let mut checker = InvariantChecker::default();
    let result = run_simulation(&mut state, &input.monthly_updates, &mut checker);
    assert!(matches!(
        result,
        Err(RunnerError::Input {
            source: MarketError::MalformedInput { .. }
        })
    ));
    assert_eq!(checker.turns, 0);
    assert_eq!(state.month(), 0);
}

#[test]
fn update_record_without_its_arrays_is_rejected() {
    let document = DEBT_SCENARIO.replacen(
        r#"{ "newConsumers": [], "distributorChanges": [], "producerChanges": [] }"#,
        "{}",
        1,
    );
    assert!(serde_json::from_str::<SimulationInput>(&document).is_err());
}

#[test]
fn unresolvable_allocation_aborts_the_run() {
    let mut input = parse(DEBT_SCENARIO);
    input.initial_data.distributors[0].energy_needed_kw = 11;
    let mut state = MarketState::from_initial_data(
        &input.initial_data,
        MarketConfig::default(),
        input.number_of_turns,
    )
    .unwrap();
    let result = run_simulation(&mut state, &input.monthly_updates, &mut NoOpCallback);
    assert!(result.is_err());
    assert!(state.producers.get(ProducerId::new(0)).unwrap().serving.is_empty());
}
