//! Error types for the drift engine.
//!
//! Every failure is fatal for the axis being computed. The engine never substitutes a default
//! value for a sample it could not compute, and nothing is retried since the computation is
//! fully deterministic.

use crate::Axis;
use crate::quadrature::IntegrationError;
use thiserror::Error;

/// Errors raised while configuring or running an uncertainty simulation.
#[derive(Error, Debug)]
pub enum DriftError {
    /// Nonsensical input rejected before any integration runs.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// Adaptive quadrature failed for a sample.
    #[error("integration failed: {0}")]
    Integration(#[from] IntegrationError),
    /// The accumulated uncertainty decreased between two consecutive samples.
    #[error(
        "{axis} uncertainty decreased at sample {index}: {previous} -> {current}"
    )]
    InvariantViolation {
        axis: Axis,
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DriftError>;

impl DriftError {
    /// Shorthand for building a [`DriftError::Configuration`].
    pub fn config(message: impl Into<String>) -> Self {
        DriftError::Configuration(message.into())
    }
}
