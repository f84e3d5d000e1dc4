//! Turn cycle: the fixed phase sequence that drives the market.
//!
//! A run is one **initial turn** (month 0) followed by one **monthly turn**
//! per update record.
//!
//! Initial turn:
//!
//! 1. **Allocate** -- every distributor picks its suppliers.
//! 2. **Price** -- initial rates (full infrastructure cost).
//! 3. **Bind** -- every consumer signs with the cheapest distributor, which
//!    takes them all as clients.
//! 4. **Settle** -- consumers, then distributors.
//!
//! Monthly turn:
//!
//! 1. **Deltas** -- advance the clock, add new consumers, apply
//!    infrastructure and producer output overrides. Output changes flag the
//!    affected distributors; nothing is reallocated yet.
//! 2. **Price** -- monthly rates from the current client base.
//! 3. **Purge** -- drop expired contracts.
//! 4. **Settle** -- consumers, then distributors.
//! 5. **Reconcile** -- flagged distributors pick new suppliers.
//! 6. **Archive** -- producers record whom they served this month.
//!
//! Rates and settlements therefore still use the old allocation in the
//! month a producer changes its output. The cycle is deterministic.

use gridmarket_market::{
    ConsumerRegistry, DistributorRegistry, MarketConfig, MarketError, ProducerRegistry,
    StrategyFactory,
};
use gridmarket_types::{
    Consumer, ConsumerId, Distributor, DistributorId, InitialData, MonthlyUpdate, Producer,
};
use tracing::{debug, info};

use crate::clock::{ClockError, MonthClock};

/// Errors that can occur during turn execution.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// A market operation failed.
    #[error("market error in month {month}: {source}")]
    Market {
        /// The month being executed.
        month: u64,
        /// The underlying market error.
        source: MarketError,
    },

    /// The initial turn was requested twice.
    #[error("the initial turn has already run")]
    AlreadyInitialized,

    /// A monthly turn was requested before the initial turn.
    #[error("a monthly turn cannot run before the initial turn")]
    NotInitialized,
}

/// Summary of a single turn's execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnSummary {
    /// The month that was executed (0 = initial turn).
    pub month: u64,
    /// Consumers not bankrupt at the end of the turn.
    pub active_consumers: usize,
    /// Distributors not bankrupt at the end of the turn.
    pub active_distributors: usize,
    /// Consumers that went bankrupt during this turn.
    pub new_bankrupt_consumers: Vec<ConsumerId>,
    /// Distributors that went bankrupt during this turn.
    pub new_bankrupt_distributors: Vec<DistributorId>,
    /// Distributors that picked new suppliers during this turn.
    pub reallocated: Vec<DistributorId>,
}

/// The complete market state passed through the turn cycle.
#[derive(Debug)]
pub struct MarketState {
    /// The month clock.
    pub clock: MonthClock,
    /// All consumers.
    pub consumers: ConsumerRegistry,
    /// All distributors.
    pub distributors: DistributorRegistry,
    /// All producers.
    pub producers: ProducerRegistry,
    /// Maps strategy kinds to rankings.
    pub factory: StrategyFactory,
    /// Whether the initial turn has run.
    initialized: bool,
}

impl MarketState {
    /// Build the state from the three initial entity lists.
    ///
    /// `monthly_turns` is the number of monthly turns the run will execute.
    ///
    /// # Errors
    ///
    /// Returns [`TurnError::Market`] with [`MarketError::MalformedInput`] if
    /// ids are duplicated within a kind.
    pub fn new(
        consumers: Vec<Consumer>,
        distributors: Vec<Distributor>,
        producers: Vec<Producer>,
        config: MarketConfig,
        monthly_turns: u64,
    ) -> Result<Self, TurnError> {
        let at_start = |source| TurnError::Market { month: 0, source };
        Ok(Self {
            clock: MonthClock::new(monthly_turns),
            consumers: ConsumerRegistry::new(consumers).map_err(at_start)?,
            distributors: DistributorRegistry::new(distributors, config).map_err(at_start)?,
            producers: ProducerRegistry::new(producers).map_err(at_start)?,
            factory: StrategyFactory::new(),
            initialized: false,
        })
    }

    /// Build the state from the initial section of an input document.
    ///
    /// # Errors
    ///
    /// Same as [`MarketState::new`].
    pub fn from_initial_data(
        data: &InitialData,
        config: MarketConfig,
        monthly_turns: u64,
    ) -> Result<Self, TurnError> {
        Self::new(
            data.consumers.iter().map(Consumer::from).collect(),
            data.distributors.iter().map(Distributor::from).collect(),
            data.producers.iter().map(Producer::from).collect(),
            config,
            monthly_turns,
        )
    }

    /// The current month.
    pub const fn month(&self) -> u64 {
        self.clock.month()
    }

    /// Whether the initial turn has run.
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn summary(
        &self,
        new_bankrupt_consumers: Vec<ConsumerId>,
        new_bankrupt_distributors: Vec<DistributorId>,
        reallocated: Vec<DistributorId>,
    ) -> TurnSummary {
        TurnSummary {
            month: self.clock.month(),
            active_consumers: self.consumers.active_count(),
            active_distributors: self.distributors.active_count(),
            new_bankrupt_consumers,
            new_bankrupt_distributors,
            reallocated,
        }
    }
}

/// Execute the initial turn (month 0).
///
/// # Errors
///
/// Returns [`TurnError::AlreadyInitialized`] if called twice, or
/// [`TurnError::Market`] if an allocation cannot be met or no distributor
/// is active to sign the first contracts.
pub fn run_initial_turn(state: &mut MarketState) -> Result<TurnSummary, TurnError> {
    if state.initialized {
        return Err(TurnError::AlreadyInitialized);
    }
    let month = state.clock.month();
    let market = |source| TurnError::Market { month, source };
    info!(month, "Initial turn started");

    // --- Phase 1: Allocate ---
    state
        .distributors
        .initialize_allocations(state.factory, &mut state.producers)
        .map_err(market)?;

    // --- Phase 2: Price ---
    state.distributors.compute_initial_rates().map_err(market)?;

    // --- Phase 3: Bind ---
    let preferred = state
        .distributors
        .cheapest_active()
        .ok_or(MarketError::NoActiveDistributor)
        .map_err(market)?;
    let preferred_id = preferred.id;
    state.consumers.bind_all(preferred);
    state
        .distributors
        .mirror_initial_binding(preferred_id, &state.consumers.ids())
        .map_err(market)?;
    debug!(month, distributor = %preferred_id, "Initial contracts signed");

    // --- Phase 4: Settle ---
    let new_bankrupt_consumers = state
        .consumers
        .settle_month(&mut state.distributors)
        .map_err(market)?;
    let new_bankrupt_distributors = state
        .distributors
        .settle_month(&state.consumers)
        .map_err(market)?;

    state.initialized = true;
    let summary = state.summary(new_bankrupt_consumers, new_bankrupt_distributors, Vec::new());
    info!(
        month,
        active_consumers = summary.active_consumers,
        active_distributors = summary.active_distributors,
        "Initial turn completed"
    );
    Ok(summary)
}

/// Execute one monthly turn driven by `update`.
///
/// # Errors
///
/// Returns [`TurnError::NotInitialized`] before the initial turn,
/// [`TurnError::Clock`] past the last month, or [`TurnError::Market`] if
/// the update names an unknown entity or an allocation cannot be met.
pub fn run_monthly_turn(
    state: &mut MarketState,
    update: &MonthlyUpdate,
) -> Result<TurnSummary, TurnError> {
    if !state.initialized {
        return Err(TurnError::NotInitialized);
    }

    // --- Phase 1: Deltas ---
    let month = state.clock.advance()?;
    let market = |source| TurnError::Market { month, source };
    info!(
        month,
        new_consumers = update.new_consumers.len(),
        distributor_changes = update.distributor_changes.len(),
        producer_changes = update.producer_changes.len(),
        "Monthly turn started"
    );
    apply_update(state, update).map_err(market)?;

    // --- Phase 2: Price ---
    state.distributors.compute_monthly_rates().map_err(market)?;

    // --- Phase 3: Purge ---
    state.distributors.purge_expired_contracts(&state.consumers);

    // --- Phase 4: Settle ---
    let new_bankrupt_consumers = state
        .consumers
        .settle_month(&mut state.distributors)
        .map_err(market)?;
    let new_bankrupt_distributors = state
        .distributors
        .settle_month(&state.consumers)
        .map_err(market)?;

    // --- Phase 5: Reconcile ---
    let reallocated = state
        .distributors
        .reconcile_producer_changes(state.factory, &mut state.producers)
        .map_err(market)?;

    // --- Phase 6: Archive ---
    state.producers.archive_month(month);

    let summary = state.summary(new_bankrupt_consumers, new_bankrupt_distributors, reallocated);
    info!(
        month,
        active_consumers = summary.active_consumers,
        active_distributors = summary.active_distributors,
        bankruptcies = summary
            .new_bankrupt_consumers
            .len()
            .saturating_add(summary.new_bankrupt_distributors.len()),
        reallocated = summary.reallocated.len(),
        "Monthly turn completed"
    );
    Ok(summary)
}

/// Apply one update record's deltas, in record order.
fn apply_update(state: &mut MarketState, update: &MonthlyUpdate) -> Result<(), MarketError> {
    for record in &update.new_consumers {
        state.consumers.add(Consumer::from(record))?;
    }
    for change in &update.distributor_changes {
        state
            .distributors
            .set_infrastructure_cost(change.id, change.infrastructure_cost)?;
    }
    for change in &update.producer_changes {
        state
            .producers
            .apply_output_change(change.id, change.energy_per_distributor)?;
    }
    for change in state.producers.drain_changes() {
        let flagged = state.distributors.flag_producer_change(change.producer);
        debug!(
            producer = %change.producer,
            energy_per_distributor = change.energy_per_distributor,
            flagged,
            "Producer change forwarded"
        );
    }
    Ok(())
}
