//! Enumeration types for the energy market.
//!
//! The serialized names match the upper-case spellings used by the input
//! and report documents (`"WIND"`, `"GREEN"`, ...).

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Energy sources
// ---------------------------------------------------------------------------

/// The kind of energy a producer generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnergyType {
    /// Wind turbines.
    Wind,
    /// Photovoltaic panels.
    Solar,
    /// Hydroelectric dams.
    Hydro,
    /// Coal-fired plants.
    Coal,
    /// Nuclear reactors.
    Nuclear,
}

impl EnergyType {
    /// Whether this source counts as renewable for the green strategy.
    pub const fn is_renewable(self) -> bool {
        matches!(self, Self::Wind | Self::Solar | Self::Hydro)
    }

    /// The upper-case name used in input and report documents.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wind => "WIND",
            Self::Solar => "SOLAR",
            Self::Hydro => "HYDRO",
            Self::Coal => "COAL",
            Self::Nuclear => "NUCLEAR",
        }
    }
}

impl core::fmt::Display for EnergyType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Producer selection
// ---------------------------------------------------------------------------

/// The producer-selection strategy a distributor is configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyKind {
    /// Renewable producers first, then cheapest, then largest output.
    Green,
    /// Cheapest producers first, then largest output.
    Price,
    /// Largest output first.
    Quantity,
}

impl StrategyKind {
    /// The upper-case name used in input and report documents.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Green => "GREEN",
            Self::Price => "PRICE",
            Self::Quantity => "QUANTITY",
        }
    }
}

impl core::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
