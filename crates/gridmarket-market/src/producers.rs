//! The producer registry.
//!
//! [`ProducerRegistry`] owns every producer, keeps each producer's set of
//! currently served distributors within its capacity, and archives that set
//! once per month for reporting.
//!
//! Output changes are not pushed to distributors directly. They are queued
//! as [`ProducerChange`] events that the turn engine drains and hands to the
//! distributor registry, which flags the affected distributors. Reallocation
//! itself is deferred to a later step of the same turn.

use std::collections::BTreeMap;

use gridmarket_types::{DistributorId, Producer, ProducerId};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::MarketError;

/// A producer changed its output per distributor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProducerChange {
    /// The producer whose output changed.
    pub producer: ProducerId,
    /// The new output per served distributor.
    pub energy_per_distributor: i64,
}

/// Owns all producers, in input order.
#[derive(Debug, Default)]
pub struct ProducerRegistry {
    /// Producers in input order.
    producers: Vec<Producer>,
    /// Producer id -> position in `producers`.
    index: BTreeMap<ProducerId, usize>,
    /// Output changes not yet drained by the turn engine.
    pending_changes: Vec<ProducerChange>,
}

impl ProducerRegistry {
    /// Build a registry from the initial producers.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::MalformedInput`] if two producers share an id.
    pub fn new(producers: Vec<Producer>) -> Result<Self, MarketError> {
        let mut index = BTreeMap::new();
        for (position, producer) in producers.iter().enumerate() {
            if index.insert(producer.id, position).is_some() {
                return Err(MarketError::MalformedInput {
                    reason: format!("duplicate producer id {}", producer.id),
                });
            }
        }
        Ok(Self {
            producers,
            index,
            pending_changes: Vec::new(),
        })
    }

    /// Number of producers.
    pub const fn len(&self) -> usize {
        self.producers.len()
    }

    /// Whether the registry holds no producers.
    pub const fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }

    /// Look up a producer by id.
    pub fn get(&self, id: ProducerId) -> Option<&Producer> {
        self.index
            .get(&id)
            .and_then(|&position| self.producers.get(position))
    }

    fn get_mut(&mut self, id: ProducerId) -> Result<&mut Producer, MarketError> {
        self.index
            .get(&id)
            .and_then(|&position| self.producers.get_mut(position))
            .ok_or(MarketError::ProducerNotFound(id))
    }

    /// Iterate over producers in input order.
    pub fn iter(&self) -> impl Iterator<Item = &Producer> {
        self.producers.iter()
    }

    /// Register `distributor` as served by `producer`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ProducerNotFound`] for an unknown id, or
    /// [`MarketError::ProducerAtCapacity`] if the producer is already full.
    pub fn bind(
        &mut self,
        producer: ProducerId,
        distributor: DistributorId,
    ) -> Result<(), MarketError> {
        let entry = self.get_mut(producer)?;
        if entry.serving.contains(&distributor) {
            return Ok(());
        }
        if entry.is_at_capacity() {
            return Err(MarketError::ProducerAtCapacity {
                producer,
                capacity: entry.max_distributors,
            });
        }
        entry.serving.insert(distributor);
        Ok(())
    }

    /// Stop serving `distributor`. Returns `true` if it was being served.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ProducerNotFound`] for an unknown id.
    pub fn unbind(
        &mut self,
        producer: ProducerId,
        distributor: DistributorId,
    ) -> Result<bool, MarketError> {
        Ok(self.get_mut(producer)?.serving.remove(&distributor))
    }

    /// Change a producer's output per distributor and queue a change event.
    ///
    /// Allocations are left untouched; the distributors supplied by this
    /// producer are flagged when the turn engine forwards the event.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ProducerNotFound`] for an unknown id.
    pub fn apply_output_change(
        &mut self,
        producer: ProducerId,
        energy_per_distributor: i64,
    ) -> Result<(), MarketError> {
        let entry = self.get_mut(producer)?;
        debug!(
            %producer,
            old = entry.energy_per_distributor,
            new = energy_per_distributor,
            "Producer output changed"
        );
        entry.energy_per_distributor = energy_per_distributor;
        self.pending_changes.push(ProducerChange {
            producer,
            energy_per_distributor,
        });
        Ok(())
    }

    /// Take every queued output change, oldest first.
    pub fn drain_changes(&mut self) -> Vec<ProducerChange> {
        core::mem::take(&mut self.pending_changes)
    }

    /// Snapshot every producer's served distributors under `month`.
    ///
    /// The snapshot is an independent copy, sorted ascending. Archiving the
    /// same month twice replaces the earlier snapshot.
    pub fn archive_month(&mut self, month: u64) {
        for producer in &mut self.producers {
            let served: Vec<DistributorId> = producer.serving.iter().copied().collect();
            producer.monthly_history.insert(month, served);
        }
    }

    /// Sum of `output * price` over the given producers.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ProducerNotFound`] for an unknown id, or
    /// [`MarketError::ArithmeticOverflow`] if the sum overflows.
    pub fn supply_cost(&self, suppliers: &[ProducerId]) -> Result<Decimal, MarketError> {
        suppliers.iter().try_fold(Decimal::ZERO, |total, &id| {
            let producer = self.get(id).ok_or(MarketError::ProducerNotFound(id))?;
            let cost = Decimal::from(producer.energy_per_distributor)
                .checked_mul(producer.price_kw)
                .ok_or(MarketError::overflow("supplier cost"))?;
            total
                .checked_add(cost)
                .ok_or(MarketError::overflow("supplier cost"))
        })
    }
}
