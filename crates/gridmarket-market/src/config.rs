//! Market constants and the integer rounding rules built on them.
//!
//! These values correspond to the `market` section of the simulation
//! config. The [`MarketConfig`] struct bundles every tunable so that
//! callers (turn engine, tests) can override defaults. All results are
//! floored to whole currency units.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::MarketError;

/// Ratios and divisors used by the rate, debt and cost formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketConfig {
    /// Share of the production cost a distributor adds as profit (default: 0.2).
    pub profit_rate: Decimal,

    /// Multiplier applied to a missed monthly rate to form the debt (default: 1.2).
    pub debt_rate: Decimal,

    /// Divisor applied to the summed supplier cost (default: 10).
    pub production_cost_divisor: i64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            profit_rate: Decimal::new(2, 1),
            debt_rate: Decimal::new(12, 1),
            production_cost_divisor: 10,
        }
    }
}

impl MarketConfig {
    /// Build a validated config.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::MalformedInput`] if a rate is negative or the
    /// divisor is not strictly positive.
    pub fn new(
        profit_rate: Decimal,
        debt_rate: Decimal,
        production_cost_divisor: i64,
    ) -> Result<Self, MarketError> {
        if profit_rate.is_sign_negative() {
            return Err(MarketError::MalformedInput {
                reason: format!("profit_rate must not be negative, got {profit_rate}"),
            });
        }
        if debt_rate.is_sign_negative() {
            return Err(MarketError::MalformedInput {
                reason: format!("debt_rate must not be negative, got {debt_rate}"),
            });
        }
        if production_cost_divisor <= 0 {
            return Err(MarketError::MalformedInput {
                reason: format!(
                    "production_cost_divisor must be positive, got {production_cost_divisor}"
                ),
            });
        }
        Ok(Self {
            profit_rate,
            debt_rate,
            production_cost_divisor,
        })
    }

    /// `floor(profit_rate * production_cost)`.
    pub fn profit(&self, production_cost: i64) -> Result<i64, MarketError> {
        let raw = self
            .profit_rate
            .checked_mul(Decimal::from(production_cost))
            .ok_or(MarketError::overflow("profit"))?;
        floor_to_i64(raw, "profit")
    }

    /// `floor(debt_rate * monthly_rate)`.
    pub fn debt_for(&self, monthly_rate: i64) -> Result<i64, MarketError> {
        let raw = self
            .debt_rate
            .checked_mul(Decimal::from(monthly_rate))
            .ok_or(MarketError::overflow("debt"))?;
        floor_to_i64(raw, "debt")
    }

    /// `floor(supply_total / production_cost_divisor)`.
    pub fn production_cost(&self, supply_total: Decimal) -> Result<i64, MarketError> {
        let raw = supply_total
            .checked_div(Decimal::from(self.production_cost_divisor))
            .ok_or(MarketError::overflow("production cost"))?;
        floor_to_i64(raw, "production cost")
    }
}

/// Round toward negative infinity and convert to a whole amount.
fn floor_to_i64(value: Decimal, context: &'static str) -> Result<i64, MarketError> {
    value
        .floor()
        .to_i64()
        .ok_or(MarketError::overflow(context))
}
