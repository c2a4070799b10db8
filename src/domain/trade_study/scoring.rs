//! Scoring Function - Reshapes normalized values through utility curves.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::domain::foundation::{CriterionId, ValidationError};

use super::{NormalizedMatrix, ScoredMatrix, ScoringError};

/// One step of a step function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepThreshold {
    pub threshold: f64,
    pub score: f64,
}

/// One control point of a piecewise-linear curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub x: f64,
    pub y: f64,
}

/// Utility curve applied to one criterion's normalized values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScoringFunctionSpec {
    /// Identity.
    #[default]
    Linear,
    /// Score of the highest threshold not exceeding the value; 0 below all thresholds.
    Step { steps: Vec<StepThreshold> },
    /// `base^x / max(base, 1)`: peaks at 1 on [0, 1] for any positive base.
    Exponential { base: f64 },
    /// `1 / (1 + e^(−k·(x − midpoint)))`
    Sigmoid { steepness: f64, midpoint: f64 },
    /// Linear interpolation between control points, clamped outside the domain.
    PiecewiseLinear { points: Vec<ControlPoint> },
}

impl ScoringFunctionSpec {
    /// Checks that the parameters define a usable function.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            ScoringFunctionSpec::Linear => Ok(()),
            ScoringFunctionSpec::Step { steps } => {
                if steps.is_empty() {
                    return Err(ValidationError::empty_field("steps"));
                }
                if steps
                    .iter()
                    .any(|s| !s.threshold.is_finite() || !s.score.is_finite())
                {
                    return Err(ValidationError::non_finite("steps"));
                }
                let mut thresholds: Vec<f64> = steps.iter().map(|s| s.threshold).collect();
                thresholds.sort_by(f64::total_cmp);
                if thresholds.windows(2).any(|w| w[0] == w[1]) {
                    return Err(ValidationError::invalid_parameter(
                        "steps",
                        "thresholds must be distinct",
                    ));
                }
                Ok(())
            }
            ScoringFunctionSpec::Exponential { base } => {
                if !base.is_finite() || *base <= 0.0 {
                    return Err(ValidationError::invalid_parameter(
                        "base",
                        format!("must be positive and finite, got {}", base),
                    ));
                }
                Ok(())
            }
            ScoringFunctionSpec::Sigmoid {
                steepness,
                midpoint,
            } => {
                if !steepness.is_finite() {
                    return Err(ValidationError::non_finite("steepness"));
                }
                if !midpoint.is_finite() {
                    return Err(ValidationError::non_finite("midpoint"));
                }
                Ok(())
            }
            ScoringFunctionSpec::PiecewiseLinear { points } => {
                if points.is_empty() {
                    return Err(ValidationError::empty_field("points"));
                }
                if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
                    return Err(ValidationError::non_finite("points"));
                }
                if points.windows(2).any(|w| w[0].x >= w[1].x) {
                    return Err(ValidationError::invalid_parameter(
                        "points",
                        "x breakpoints must be strictly increasing",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Evaluates the function at `x`. Assumes `validate` passed.
    pub fn evaluate(&self, x: f64) -> f64 {
        match self {
            ScoringFunctionSpec::Linear => x,
            ScoringFunctionSpec::Step { steps } => steps
                .iter()
                .filter(|s| s.threshold <= x)
                .max_by(|a, b| a.threshold.total_cmp(&b.threshold))
                .map(|s| s.score)
                .unwrap_or(0.0),
            ScoringFunctionSpec::Exponential { base } => base.powf(x) / base.max(1.0),
            ScoringFunctionSpec::Sigmoid {
                steepness,
                midpoint,
            } => 1.0 / (1.0 + (-steepness * (x - midpoint)).exp()),
            ScoringFunctionSpec::PiecewiseLinear { points } => piecewise(points, x),
        }
    }
}

/// Piecewise-linear interpolation. Values outside the breakpoints clamp to
/// the nearest endpoint.
fn piecewise(points: &[ControlPoint], x: f64) -> f64 {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return 0.0,
    };
    if x <= first.x {
        return first.y;
    }
    if x >= last.x {
        return last.y;
    }
    for w in points.windows(2) {
        if x <= w[1].x {
            let frac = (x - w[0].x) / (w[1].x - w[0].x);
            return w[0].y + frac * (w[1].y - w[0].y);
        }
    }
    last.y
}

/// Scoring functions applied across a normalized matrix.
pub struct ScoringFunction;

impl ScoringFunction {
    /// Applies each criterion's function. Criteria without one pass through unchanged.
    ///
    /// # Errors
    /// - `UnknownCriterion` if a function is keyed by a criterion not in the matrix
    /// - `InvalidFunction` if a spec fails validation
    pub fn score(
        normalized: &NormalizedMatrix,
        functions: &HashMap<CriterionId, ScoringFunctionSpec>,
    ) -> Result<ScoredMatrix, ScoringError> {
        let table = normalized.table();

        let mut unknown: Vec<&CriterionId> = functions
            .keys()
            .filter(|id| table.criterion_index(id).is_none())
            .collect();
        unknown.sort();
        if let Some(id) = unknown.first() {
            return Err(ScoringError::UnknownCriterion((*id).clone()));
        }

        let mut rows = Vec::with_capacity(table.criterion_count());
        for (index, criterion_id) in table.criterion_ids().iter().enumerate() {
            let row = table.row(index);
            let scored = match functions.get(criterion_id) {
                None | Some(ScoringFunctionSpec::Linear) => row.to_vec(),
                Some(spec) => {
                    spec.validate()
                        .map_err(|source| ScoringError::InvalidFunction {
                            criterion_id: criterion_id.clone(),
                            source,
                        })?;
                    row.iter().map(|x| spec.evaluate(*x)).collect()
                }
            };
            rows.push(scored);
        }

        debug!(
            criteria = table.criterion_count(),
            shaped = functions
                .values()
                .filter(|f| !matches!(f, ScoringFunctionSpec::Linear))
                .count(),
            "Applied scoring functions"
        );

        Ok(ScoredMatrix::new(table.with_rows(rows)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    fn steps() -> ScoringFunctionSpec {
        ScoringFunctionSpec::Step {
            steps: vec![
                StepThreshold {
                    threshold: 0.5,
                    score: 0.6,
                },
                StepThreshold {
                    threshold: 0.2,
                    score: 0.3,
                },
                StepThreshold {
                    threshold: 0.9,
                    score: 1.0,
                },
            ],
        }
    }

    #[test]
    fn linear_is_identity() {
        assert_close(ScoringFunctionSpec::Linear.evaluate(0.37), 0.37);
    }

    #[test]
    fn step_uses_highest_threshold_not_exceeding_value() {
        let f = steps();
        assert_close(f.evaluate(0.1), 0.0);
        assert_close(f.evaluate(0.2), 0.3);
        assert_close(f.evaluate(0.7), 0.6);
        assert_close(f.evaluate(0.95), 1.0);
    }

    #[test]
    fn step_rejects_duplicate_thresholds() {
        let f = ScoringFunctionSpec::Step {
            steps: vec![
                StepThreshold {
                    threshold: 0.5,
                    score: 0.1,
                },
                StepThreshold {
                    threshold: 0.5,
                    score: 0.9,
                },
            ],
        };
        assert!(f.validate().is_err());
    }

    #[test]
    fn exponential_is_bounded_by_one_at_one() {
        let f = ScoringFunctionSpec::Exponential { base: 10.0 };
        assert_close(f.evaluate(1.0), 1.0);
        assert_close(f.evaluate(0.0), 0.1);
        assert_close(f.evaluate(0.5), 10f64.sqrt() / 10.0);
    }

    #[test]
    fn exponential_with_fractional_base_stays_in_unit_interval() {
        let f = ScoringFunctionSpec::Exponential { base: 0.5 };
        assert!(f.validate().is_ok());
        assert_close(f.evaluate(0.0), 1.0);
        assert_close(f.evaluate(1.0), 0.5);
        for i in 0..=10 {
            let v = f.evaluate(i as f64 / 10.0);
            assert!((0.0..=1.0).contains(&v), "value {} out of range", v);
        }
    }

    #[test]
    fn exponential_rejects_non_positive_base() {
        assert!(ScoringFunctionSpec::Exponential { base: 0.0 }.validate().is_err());
        assert!(ScoringFunctionSpec::Exponential { base: -2.0 }.validate().is_err());
    }

    #[test]
    fn sigmoid_is_half_at_midpoint() {
        let f = ScoringFunctionSpec::Sigmoid {
            steepness: 10.0,
            midpoint: 0.4,
        };
        assert_close(f.evaluate(0.4), 0.5);
        assert!(f.evaluate(0.9) > 0.99);
        assert!(f.evaluate(0.0) < 0.02);
    }

    #[test]
    fn piecewise_interpolates_and_clamps() {
        let f = ScoringFunctionSpec::PiecewiseLinear {
            points: vec![
                ControlPoint { x: 0.2, y: 0.0 },
                ControlPoint { x: 0.6, y: 0.8 },
                ControlPoint { x: 1.0, y: 1.0 },
            ],
        };
        assert_close(f.evaluate(0.0), 0.0);
        assert_close(f.evaluate(0.4), 0.4);
        assert_close(f.evaluate(0.8), 0.9);
        assert_close(f.evaluate(1.5), 1.0);
    }

    #[test]
    fn piecewise_rejects_unsorted_points() {
        let f = ScoringFunctionSpec::PiecewiseLinear {
            points: vec![ControlPoint { x: 0.6, y: 0.8 }, ControlPoint { x: 0.2, y: 0.0 }],
        };
        assert!(f.validate().is_err());
    }

    fn normalized() -> NormalizedMatrix {
        NormalizedMatrix::from_rows(
            vec!["cost".into(), "perf".into()],
            vec!["a".into(), "b".into()],
            vec![vec![1.0, 0.0], vec![0.25, 0.75]],
        )
        .unwrap()
    }

    #[test]
    fn score_defaults_to_linear() {
        let scored = ScoringFunction::score(&normalized(), &HashMap::new()).unwrap();
        assert_eq!(scored.table().rows(), normalized().table().rows());
    }

    #[test]
    fn score_applies_functions_per_criterion() {
        let mut functions = HashMap::new();
        functions.insert(CriterionId::from("perf"), steps());

        let scored = ScoringFunction::score(&normalized(), &functions).unwrap();
        assert_eq!(scored.table().row(0), &[1.0, 0.0]);
        assert_eq!(scored.table().row(1), &[0.3, 0.6]);
    }

    #[test]
    fn score_rejects_unknown_criterion() {
        let mut functions = HashMap::new();
        functions.insert(CriterionId::from("ghost"), ScoringFunctionSpec::Linear);
        assert_eq!(
            ScoringFunction::score(&normalized(), &functions).unwrap_err(),
            ScoringError::UnknownCriterion("ghost".into())
        );
    }

    #[test]
    fn score_reports_invalid_spec_with_criterion() {
        let mut functions = HashMap::new();
        functions.insert(
            CriterionId::from("cost"),
            ScoringFunctionSpec::Exponential { base: -1.0 },
        );
        let err = ScoringFunction::score(&normalized(), &functions).unwrap_err();
        assert!(matches!(
            err,
            ScoringError::InvalidFunction { ref criterion_id, .. } if criterion_id.as_str() == "cost"
        ));
    }

    #[test]
    fn spec_deserializes_from_tagged_json() {
        let spec: ScoringFunctionSpec =
            serde_json::from_str(r#"{"type": "sigmoid", "steepness": 8.0, "midpoint": 0.5}"#)
                .unwrap();
        assert_eq!(
            spec,
            ScoringFunctionSpec::Sigmoid {
                steepness: 8.0,
                midpoint: 0.5,
            }
        );

        let spec: ScoringFunctionSpec = serde_json::from_str(r#"{"type": "linear"}"#).unwrap();
        assert_eq!(spec, ScoringFunctionSpec::Linear);
    }
}
