//! Configuration loading and typed config structures for the Gridmarket simulation.
//!
//! The configuration is an optional YAML file. Every section and field has a
//! default, so an empty document (or no file at all) yields the standard
//! market rules.
//!
//! ```yaml
//! market:
//!   profit_rate: 0.2
//!   debt_rate: 1.2
//!   production_cost_divisor: 10
//! logging:
//!   level: info
//! simulation:
//!   max_turns: 0
//! ```

use std::path::Path;

use gridmarket_market::{MarketConfig, MarketError};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Environment variable overriding `logging.level`.
pub const LOG_LEVEL_ENV: &str = "GRIDMARKET_LOG_LEVEL";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is not usable.
    #[error("invalid config value: {source}")]
    Invalid {
        /// The validation failure.
        #[from]
        source: MarketError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Rate, debt and cost parameters.
    #[serde(default)]
    pub market: MarketSection,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Run boundary parameters.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `GRIDMARKET_LOG_LEVEL` overrides `logging.level` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load configuration for a run.
    ///
    /// An `explicit` path must exist. Without one, `fallback` is read if it
    /// exists and defaults are used otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if `explicit` cannot be read. Otherwise
    /// the same as [`SimulationConfig::from_file`] for whichever file is read.
    pub fn load(explicit: Option<&Path>, fallback: &Path) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if fallback.exists() => Self::from_file(fallback),
            None => {
                let mut config = Self::default();
                config.logging.apply_env_overrides();
                Ok(config)
            }
        }
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yml reads an empty document as null, not as an empty map.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.logging.apply_env_overrides();
        Ok(config)
    }

    /// The validated market parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a rate is negative or the
    /// divisor is not positive.
    pub fn market_config(&self) -> Result<MarketConfig, ConfigError> {
        Ok(MarketConfig::new(
            self.market.profit_rate,
            self.market.debt_rate,
            self.market.production_cost_divisor,
        )?)
    }
}

/// Market rule parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MarketSection {
    /// Share of the production cost added as profit.
    #[serde(default = "default_profit_rate", with = "rust_decimal::serde::float")]
    pub profit_rate: Decimal,

    /// Multiplier applied to a missed rate to form the debt.
    #[serde(default = "default_debt_rate", with = "rust_decimal::serde::float")]
    pub debt_rate: Decimal,

    /// Divisor applied to the summed supplier cost.
    #[serde(default = "default_production_cost_divisor")]
    pub production_cost_divisor: i64,
}

impl Default for MarketSection {
    fn default() -> Self {
        Self {
            profit_rate: default_profit_rate(),
            debt_rate: default_debt_rate(),
            production_cost_divisor: default_production_cost_divisor(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    /// Override the level with `GRIDMARKET_LOG_LEVEL` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(LOG_LEVEL_ENV) {
            self.level = val;
        }
    }
}

/// Run boundary parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Upper bound on the number of monthly turns (0 = no bound).
    #[serde(default)]
    pub max_turns: u64,
}

impl SimulationBoundsConfig {
    /// The number of monthly turns to run for a document asking for `requested`.
    pub fn effective_turns(&self, requested: u64) -> u64 {
        if self.max_turns == 0 {
            requested
        } else {
            requested.min(self.max_turns)
        }
    }
}

const fn default_profit_rate() -> Decimal {
    Decimal::from_parts(2, 0, 0, false, 1)
}

const fn default_debt_rate() -> Decimal {
    Decimal::from_parts(12, 0, 0, false, 1)
}

const fn default_production_cost_divisor() -> i64 {
    10
}

fn default_log_level() -> String {
    "info".to_owned()
}
