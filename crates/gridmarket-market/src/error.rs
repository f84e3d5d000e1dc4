//! Error types for the gridmarket-market crate.
//!
//! All operations that can fail return typed errors rather than panicking.
//! None of these is recoverable inside a turn: the simulation is a batch
//! transform, so an error means the input or the engine is inconsistent.
//! Bankruptcy is a modeled state transition and never shows up here.

use gridmarket_types::{ConsumerId, DistributorId, ProducerId};

/// Errors that can occur while operating on the market registries.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    /// An input record is structurally valid but semantically unusable
    /// (duplicate id, invalid parameter).
    #[error("malformed input: {reason}")]
    MalformedInput {
        /// Description of what is wrong with the input.
        reason: String,
    },

    /// The eligible producers cannot cover a distributor's energy need.
    #[error(
        "cannot allocate producers for distributor {distributor}: needs {needed} kW, \
         eligible producers offer {available} kW"
    )]
    UnresolvableAllocation {
        /// The distributor being supplied.
        distributor: DistributorId,
        /// Energy the distributor needs.
        needed: i64,
        /// Total output of every eligible producer.
        available: i64,
    },

    /// A consumer id was not found in the registry.
    #[error("consumer not found: {0}")]
    ConsumerNotFound(ConsumerId),

    /// A distributor id was not found in the registry.
    #[error("distributor not found: {0}")]
    DistributorNotFound(DistributorId),

    /// A producer id was not found in the registry.
    #[error("producer not found: {0}")]
    ProducerNotFound(ProducerId),

    /// A producer cannot serve another distributor.
    #[error("producer {producer} already serves its maximum of {capacity} distributors")]
    ProducerAtCapacity {
        /// The full producer.
        producer: ProducerId,
        /// Its maximum number of served distributors.
        capacity: u64,
    },

    /// Every distributor is bankrupt when one is needed to sign contracts.
    #[error("no active distributor is available")]
    NoActiveDistributor,

    /// Arithmetic overflow during a checked money or energy computation.
    #[error("arithmetic overflow in market calculation: {context}")]
    ArithmeticOverflow {
        /// Description of what was being computed.
        context: &'static str,
    },
}

impl MarketError {
    /// Shorthand for an [`MarketError::ArithmeticOverflow`] with the given context.
    pub const fn overflow(context: &'static str) -> Self {
        Self::ArithmeticOverflow { context }
    }

    /// Whether the error names an entity that does not exist.
    pub const fn is_reference_not_found(&self) -> bool {
        matches!(
            self,
            Self::ConsumerNotFound(_) | Self::DistributorNotFound(_) | Self::ProducerNotFound(_)
        )
    }
}
