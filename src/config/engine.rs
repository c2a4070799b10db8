//! Numeric engine configuration

use serde::Deserialize;

use crate::domain::foundation::Percentage;
use crate::domain::trade_study::{
    BreakevenConfig, MonteCarloConfig, SensitivityConfig, CONSISTENCY_THRESHOLD,
    DEFAULT_TORNADO_SWING, WEIGHT_TOLERANCE,
};

use super::error::ValidationError;

/// Upper bound on Monte Carlo worker threads.
const MAX_WORKERS: usize = 64;

/// Defaults for every tunable the pipeline exposes
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Allowed deviation of a weight vector's sum from 1
    #[serde(default = "default_weight_tolerance")]
    pub weight_tolerance: f64,

    /// AHP consistency ratio above which a warning is raised
    #[serde(default = "default_consistency_threshold")]
    pub consistency_threshold: f64,

    /// Relative tornado perturbation
    #[serde(default = "default_tornado_swing")]
    pub tornado_swing: Percentage,

    #[serde(default = "default_monte_carlo_samples")]
    pub monte_carlo_samples: usize,

    #[serde(default = "default_monte_carlo_min_samples")]
    pub monte_carlo_min_samples: usize,

    /// Iteration cap; larger requests are clamped
    #[serde(default = "default_monte_carlo_max_samples")]
    pub monte_carlo_max_samples: usize,

    #[serde(default = "default_monte_carlo_seed")]
    pub monte_carlo_seed: u64,

    #[serde(default = "default_monte_carlo_workers")]
    pub monte_carlo_workers: usize,

    #[serde(default = "default_breakeven_grid_steps")]
    pub breakeven_grid_steps: usize,

    #[serde(default = "default_breakeven_tolerance")]
    pub breakeven_tolerance: f64,
}

impl EngineConfig {
    /// Sensitivity parameters derived from this configuration
    pub fn sensitivity_config(&self) -> SensitivityConfig {
        SensitivityConfig {
            tornado_swing: self.tornado_swing,
            monte_carlo: MonteCarloConfig {
                samples: self.monte_carlo_samples,
                min_samples: self.monte_carlo_min_samples,
                max_samples: self.monte_carlo_max_samples,
                seed: self.monte_carlo_seed,
                workers: self.monte_carlo_workers,
                ..MonteCarloConfig::default()
            },
            breakeven: BreakevenConfig {
                grid_steps: self.breakeven_grid_steps,
                tolerance: self.breakeven_tolerance,
            },
        }
    }

    /// Validate engine configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, value) in [
            ("weight_tolerance", self.weight_tolerance),
            ("breakeven_tolerance", self.breakeven_tolerance),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ValidationError::InvalidTolerance { name, value });
            }
        }
        if !(self.consistency_threshold > 0.0 && self.consistency_threshold <= 1.0) {
            return Err(ValidationError::InvalidConsistencyThreshold(
                self.consistency_threshold,
            ));
        }
        if self.monte_carlo_min_samples > self.monte_carlo_samples
            || self.monte_carlo_samples > self.monte_carlo_max_samples
            || self.monte_carlo_max_samples == 0
        {
            return Err(ValidationError::InvalidSampleBounds {
                min: self.monte_carlo_min_samples,
                samples: self.monte_carlo_samples,
                max: self.monte_carlo_max_samples,
            });
        }
        if self.monte_carlo_workers == 0 || self.monte_carlo_workers > MAX_WORKERS {
            return Err(ValidationError::InvalidWorkerCount {
                actual: self.monte_carlo_workers,
                max: MAX_WORKERS,
            });
        }
        if self.breakeven_grid_steps == 0 {
            return Err(ValidationError::InvalidGridSteps);
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weight_tolerance: default_weight_tolerance(),
            consistency_threshold: default_consistency_threshold(),
            tornado_swing: default_tornado_swing(),
            monte_carlo_samples: default_monte_carlo_samples(),
            monte_carlo_min_samples: default_monte_carlo_min_samples(),
            monte_carlo_max_samples: default_monte_carlo_max_samples(),
            monte_carlo_seed: default_monte_carlo_seed(),
            monte_carlo_workers: default_monte_carlo_workers(),
            breakeven_grid_steps: default_breakeven_grid_steps(),
            breakeven_tolerance: default_breakeven_tolerance(),
        }
    }
}

fn default_weight_tolerance() -> f64 {
    WEIGHT_TOLERANCE
}

fn default_consistency_threshold() -> f64 {
    CONSISTENCY_THRESHOLD
}

fn default_tornado_swing() -> Percentage {
    Percentage::new(DEFAULT_TORNADO_SWING)
}

fn default_monte_carlo_samples() -> usize {
    1000
}

fn default_monte_carlo_min_samples() -> usize {
    100
}

fn default_monte_carlo_max_samples() -> usize {
    100_000
}

fn default_monte_carlo_seed() -> u64 {
    42
}

fn default_monte_carlo_workers() -> usize {
    1
}

fn default_breakeven_grid_steps() -> usize {
    100
}

fn default_breakeven_tolerance() -> f64 {
    1e-9
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.consistency_threshold, 0.10);
        assert_eq!(config.tornado_swing.value(), 20);
        assert_eq!(config.monte_carlo_samples, 1000);
        assert_eq!(config.monte_carlo_seed, 42);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sensitivity_config_mirrors_engine_values() {
        let config = EngineConfig {
            monte_carlo_samples: 250,
            monte_carlo_seed: 7,
            monte_carlo_workers: 4,
            breakeven_grid_steps: 40,
            ..Default::default()
        };
        let sensitivity = config.sensitivity_config();

        assert_eq!(sensitivity.monte_carlo.samples, 250);
        assert_eq!(sensitivity.monte_carlo.seed, 7);
        assert_eq!(sensitivity.monte_carlo.workers, 4);
        assert_eq!(sensitivity.breakeven.grid_steps, 40);
        assert_eq!(sensitivity.tornado_swing, Percentage::new(20));
    }

    #[test]
    fn test_validate_rejects_inverted_sample_bounds() {
        let config = EngineConfig {
            monte_carlo_min_samples: 500,
            monte_carlo_samples: 200,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidSampleBounds { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_threshold_and_workers() {
        let config = EngineConfig {
            consistency_threshold: 0.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidConsistencyThreshold(0.0))
        );

        let config = EngineConfig {
            monte_carlo_workers: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidWorkerCount { actual: 0, .. })
        ));
    }

    #[test]
    fn test_engine_config_deserialization() {
        let json = r#"{
            "tornado_swing": 35,
            "monte_carlo_seed": 9
        }"#;

        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.tornado_swing.value(), 35);
        assert_eq!(config.monte_carlo_seed, 9);
        assert_eq!(config.monte_carlo_samples, 1000);
    }
}
