//! Producer selection strategies.
//!
//! A distributor buys its monthly energy from a subset of producers chosen
//! by one of three strategies. All three share one shape:
//!
//! 1. **Filter**: producers already serving their maximum number of
//!    distributors are not eligible.
//! 2. **Rank**: the eligible producers are sorted by a strategy-specific
//!    comparator that always ends in an ascending-id tie-break, so the order
//!    is total and deterministic.
//! 3. **Take**: producers are taken from the front of the ranking until their
//!    summed output per distributor covers the distributor's energy need.
//! 4. **Bind**: each chosen producer registers the distributor as served.
//!
//! The orderings are:
//!
//! | Strategy | Sort keys |
//! |----------|-----------|
//! | Green | renewable first, price asc, output desc, id asc |
//! | Price | price asc, output desc, id asc |
//! | Quantity | output desc, id asc |
//!
//! If the eligible producers cannot cover the need, the allocation fails
//! with [`MarketError::UnresolvableAllocation`] and no producer is bound.

use core::cmp::Ordering;

use gridmarket_types::{DistributorId, Producer, ProducerId, StrategyKind};
use tracing::debug;

use crate::error::MarketError;
use crate::producers::ProducerRegistry;

/// A total order over producers, most preferred first.
pub trait ProducerRanking: core::fmt::Debug + Sync {
    /// The strategy this ranking implements.
    fn kind(&self) -> StrategyKind;

    /// Compare two producers; `Ordering::Less` means `a` is preferred.
    fn compare(&self, a: &Producer, b: &Producer) -> Ordering;
}

/// Renewable producers first, then cheapest, then largest output.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreenRanking;

impl ProducerRanking for GreenRanking {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Green
    }

    fn compare(&self, a: &Producer, b: &Producer) -> Ordering {
        b.energy_type
            .is_renewable()
            .cmp(&a.energy_type.is_renewable())
            .then_with(|| a.price_kw.cmp(&b.price_kw))
            .then_with(|| b.energy_per_distributor.cmp(&a.energy_per_distributor))
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// Cheapest producers first, then largest output.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceRanking;

impl ProducerRanking for PriceRanking {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Price
    }

    fn compare(&self, a: &Producer, b: &Producer) -> Ordering {
        a.price_kw
            .cmp(&b.price_kw)
            .then_with(|| b.energy_per_distributor.cmp(&a.energy_per_distributor))
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// Largest output first.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuantityRanking;

impl ProducerRanking for QuantityRanking {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Quantity
    }

    fn compare(&self, a: &Producer, b: &Producer) -> Ordering {
        b.energy_per_distributor
            .cmp(&a.energy_per_distributor)
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// Stateless factory mapping a [`StrategyKind`] to its ranking.
///
/// Passed explicitly through the turn engine; there is no global instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategyFactory;

impl StrategyFactory {
    /// Create a factory.
    pub const fn new() -> Self {
        Self
    }

    /// The ranking implementing `kind`.
    pub const fn create(self, kind: StrategyKind) -> &'static dyn ProducerRanking {
        match kind {
            StrategyKind::Green => &GreenRanking,
            StrategyKind::Price => &PriceRanking,
            StrategyKind::Quantity => &QuantityRanking,
        }
    }
}

/// The producers chosen for one distributor, before binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationPlan {
    /// Chosen producers, in ranking order.
    pub suppliers: Vec<ProducerId>,
    /// Their summed output per distributor.
    pub supplied_kw: i64,
}

/// Eligible producers (not at capacity), sorted by `ranking`.
pub fn rank_producers<'a>(
    ranking: &dyn ProducerRanking,
    producers: impl IntoIterator<Item = &'a Producer>,
) -> Vec<&'a Producer> {
    let mut eligible: Vec<&Producer> = producers
        .into_iter()
        .filter(|producer| !producer.is_at_capacity())
        .collect();
    eligible.sort_by(|a, b| ranking.compare(a, b));
    eligible
}

/// Choose producers for a distributor without mutating anything.
///
/// A need of zero or less yields an empty plan.
///
/// # Errors
///
/// Returns [`MarketError::UnresolvableAllocation`] if every eligible
/// producer together cannot cover `energy_needed`.
pub fn plan_allocation(
    ranking: &dyn ProducerRanking,
    distributor: DistributorId,
    energy_needed: i64,
    producers: &ProducerRegistry,
) -> Result<AllocationPlan, MarketError> {
    let mut plan = AllocationPlan {
        suppliers: Vec::new(),
        supplied_kw: 0,
    };

    for producer in rank_producers(ranking, producers.iter()) {
        if plan.supplied_kw >= energy_needed {
            break;
        }
        plan.suppliers.push(producer.id);
        plan.supplied_kw = plan
            .supplied_kw
            .checked_add(producer.energy_per_distributor)
            .ok_or(MarketError::overflow("allocated energy"))?;
    }

    if plan.supplied_kw < energy_needed {
        return Err(MarketError::UnresolvableAllocation {
            distributor,
            needed: energy_needed,
            available: plan.supplied_kw,
        });
    }

    Ok(plan)
}

/// Run `kind`'s strategy for a distributor and bind every chosen producer.
///
/// Returns the chosen producers in ranking order.
///
/// # Errors
///
/// Returns [`MarketError::UnresolvableAllocation`] if the need cannot be
/// covered; in that case no producer is bound.
pub fn allocate(
    factory: StrategyFactory,
    kind: StrategyKind,
    distributor: DistributorId,
    energy_needed: i64,
    producers: &mut ProducerRegistry,
) -> Result<Vec<ProducerId>, MarketError> {
    let ranking = factory.create(kind);
    let plan = plan_allocation(ranking, distributor, energy_needed, producers)?;

    for &producer in &plan.suppliers {
        producers.bind(producer, distributor)?;
    }

    debug!(
        %distributor,
        strategy = %ranking.kind(),
        needed = energy_needed,
        supplied = plan.supplied_kw,
        suppliers = ?plan.suppliers,
        "Producers allocated"
    );

    Ok(plan.suppliers)
}
