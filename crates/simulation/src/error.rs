//! Error types for the simulation driver

use std::path::PathBuf;
use thiserror::Error;

/// Simulation error type
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Invalid configuration `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Input raster `{name}` not found at {}", path.display())]
    MissingInput { name: &'static str, path: PathBuf },

    #[error("Iteration {iteration}: step `{step}` failed")]
    Step {
        iteration: usize,
        step: &'static str,
        #[source]
        source: stochvuln_core::Error,
    },

    #[error("Toolbox error: {0}")]
    Toolbox(#[from] stochvuln_core::Error),

    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimulationError {
    pub(crate) fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type alias for simulation operations
pub type Result<T> = std::result::Result<T, SimulationError>;
