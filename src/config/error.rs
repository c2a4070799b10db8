//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Tolerance {name} must be positive and finite, got {value}")]
    InvalidTolerance { name: &'static str, value: f64 },

    #[error("Consistency threshold must lie in (0, 1], got {0}")]
    InvalidConsistencyThreshold(f64),

    #[error("Monte Carlo sample bounds are inconsistent: min {min}, default {samples}, max {max}")]
    InvalidSampleBounds {
        min: usize,
        samples: usize,
        max: usize,
    },

    #[error("Monte Carlo worker count must be between 1 and {max}, got {actual}")]
    InvalidWorkerCount { actual: usize, max: usize },

    #[error("Breakeven grid needs at least one step")]
    InvalidGridSteps,
}
