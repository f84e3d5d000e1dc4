//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes from reading the input document to writing the report.

use std::path::PathBuf;

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: gridmarket_core::config::ConfigError,
    },

    /// The input document could not be read.
    #[error("failed to read input {}: {source}", path.display())]
    InputIo {
        /// The input path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The input document is not a valid simulation document.
    #[error("malformed input document: {source}")]
    InputJson {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// The initial market could not be built.
    #[error("setup error: {source}")]
    Setup {
        /// The underlying turn error.
        #[from]
        source: gridmarket_core::turn::TurnError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: gridmarket_core::runner::RunnerError,
    },

    /// The report could not be written.
    #[error("failed to write report {}: {source}", path.display())]
    Output {
        /// The output path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
