//! Month clock for the Gridmarket simulation.
//!
//! The clock is the single source of truth for the current month. Month 0
//! is the initial turn; every monthly update advances the clock by one, so
//! the *k*-th update record (0-based) runs as month *k + 1*. That month
//! number is also the key under which producer allocations are archived.
//!
//! All advancement uses checked arithmetic. The clock also knows the last
//! month of the run and refuses to move past it.

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Month counter would overflow.
    #[error("month counter overflow: cannot advance beyond u64::MAX")]
    MonthOverflow,

    /// The run has already reached its last month.
    #[error("cannot advance past the last month ({last_month})")]
    PastHorizon {
        /// The last month of the run.
        last_month: u64,
    },

    /// Invalid clock parameters.
    #[error("invalid clock parameters: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong.
        reason: String,
    },
}

/// Tracks the current month of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthClock {
    /// Current month (0 = initial turn).
    month: u64,

    /// Last month the run will reach (equal to the number of monthly turns).
    last_month: u64,
}

impl MonthClock {
    /// Create a clock at month 0 for a run of `monthly_turns` monthly turns.
    pub const fn new(monthly_turns: u64) -> Self {
        Self {
            month: 0,
            last_month: monthly_turns,
        }
    }

    /// Create a clock from explicit parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `month` is past `last_month`.
    pub fn from_parts(month: u64, last_month: u64) -> Result<Self, ClockError> {
        if month > last_month {
            return Err(ClockError::InvalidConfig {
                reason: format!("month {month} is past the last month {last_month}"),
            });
        }
        Ok(Self { month, last_month })
    }

    /// Advance to the next month. Returns the new month number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::PastHorizon`] if the run already reached its
    /// last month, or [`ClockError::MonthOverflow`] on counter overflow.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        if self.month >= self.last_month {
            return Err(ClockError::PastHorizon {
                last_month: self.last_month,
            });
        }
        self.month = self.month.checked_add(1).ok_or(ClockError::MonthOverflow)?;
        Ok(self.month)
    }

    /// The current month.
    pub const fn month(&self) -> u64 {
        self.month
    }

    /// The last month of the run.
    pub const fn last_month(&self) -> u64 {
        self.last_month
    }

    /// Whether every monthly turn has run.
    pub const fn is_finished(&self) -> bool {
        self.month >= self.last_month
    }
}
