//! Normalizer - Rescales each criterion's raw values onto a comparable scale.
//!
//! After rescaling, minimized criteria are inverted so that a higher normalized
//! value always means "better": `1 − v` for bounded methods, `−v` for z-score.
//!
//! # Zero-variance policy
//! A row whose values are all equal carries no information. Instead of
//! dividing by zero, min-max maps every value to 0.5 and z-score maps every
//! value to 0. This is the only place the engine substitutes a value rather
//! than failing.
//!
//! # Logarithmic domain
//! `ln(x) / ln(max)` stays in [0, 1] only when every value is at least 1.
//! Rows with a value in (0, 1) are rejected with `LogValueBelowOne` rather
//! than producing negative scores that would leave the unit interval.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::domain::foundation::{Alternative, Criterion, CriterionId};

use super::{DecisionMatrix, NormalizationError, NormalizedMatrix, ScoreTable};

/// Min-max result for a zero-variance row.
pub const MIN_MAX_ZERO_VARIANCE: f64 = 0.5;

/// Z-score result for a zero-variance row.
pub const Z_SCORE_ZERO_VARIANCE: f64 = 0.0;

/// Normalization method for a criterion row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMethod {
    /// `(x − min) / (max − min)`
    #[default]
    MinMax,
    /// `(x − mean) / stddev`, unbounded
    ZScore,
    /// `ln(x) / ln(max)`, requires positive values
    Logarithmic,
    /// Mid-rank / N
    PercentileRank,
}

impl NormalizationMethod {
    /// Returns false for methods whose output is not confined to [0, 1].
    pub fn is_bounded(&self) -> bool {
        !matches!(self, NormalizationMethod::ZScore)
    }
}

/// Per-criterion normalization choice with a default for unlisted criteria.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizationPlan {
    #[serde(default)]
    pub default: NormalizationMethod,
    #[serde(default)]
    pub overrides: HashMap<CriterionId, NormalizationMethod>,
}

impl NormalizationPlan {
    /// Uses one method for every criterion.
    pub fn uniform(method: NormalizationMethod) -> Self {
        Self {
            default: method,
            overrides: HashMap::new(),
        }
    }

    /// Overrides the method for one criterion.
    pub fn with_override(mut self, criterion_id: impl Into<CriterionId>, method: NormalizationMethod) -> Self {
        self.overrides.insert(criterion_id.into(), method);
        self
    }

    pub fn method_for(&self, criterion_id: &CriterionId) -> NormalizationMethod {
        self.overrides
            .get(criterion_id)
            .copied()
            .unwrap_or(self.default)
    }
}

/// Normalization functions.
pub struct Normalizer;

impl Normalizer {
    /// Normalizes every criterion with the same method.
    ///
    /// # Errors
    /// - `NonPositiveValue` for logarithmic rows containing values ≤ 0
    /// - `DegenerateLogScale` for logarithmic rows whose maximum is ≤ 1
    /// - `LogValueBelowOne` for logarithmic rows with a value in (0, 1)
    pub fn normalize(
        matrix: &DecisionMatrix,
        method: NormalizationMethod,
    ) -> Result<NormalizedMatrix, NormalizationError> {
        Self::normalize_with_plan(matrix, &NormalizationPlan::uniform(method))
    }

    /// Normalizes each criterion with the method the plan assigns to it.
    pub fn normalize_with_plan(
        matrix: &DecisionMatrix,
        plan: &NormalizationPlan,
    ) -> Result<NormalizedMatrix, NormalizationError> {
        let mut unknown: Vec<&CriterionId> = plan
            .overrides
            .keys()
            .filter(|id| !matrix.criteria().iter().any(|c| &c.id == *id))
            .collect();
        unknown.sort();
        if let Some(id) = unknown.first() {
            return Err(NormalizationError::UnknownCriterion((*id).clone()));
        }

        let mut rows = Vec::with_capacity(matrix.criterion_count());
        let mut unbounded = Vec::new();

        for (index, criterion) in matrix.criteria().iter().enumerate() {
            let method = plan.method_for(&criterion.id);
            let row = Self::normalize_row(criterion, matrix.alternatives(), matrix.row(index), method)?;
            if !method.is_bounded() {
                unbounded.push(criterion.id.clone());
            }
            rows.push(row);
        }

        debug!(
            criteria = matrix.criterion_count(),
            alternatives = matrix.alternative_count(),
            unbounded = unbounded.len(),
            "Normalized decision matrix"
        );

        Ok(NormalizedMatrix::new(
            ScoreTable::with_shape_of(matrix, rows),
            unbounded,
        ))
    }

    /// Rescales one row and orients it so higher is better.
    fn normalize_row(
        criterion: &Criterion,
        alternatives: &[Alternative],
        values: &[f64],
        method: NormalizationMethod,
    ) -> Result<Vec<f64>, NormalizationError> {
        let scaled = match method {
            NormalizationMethod::MinMax => Self::min_max(values),
            NormalizationMethod::ZScore => Self::z_score(values),
            NormalizationMethod::Logarithmic => Self::logarithmic(criterion, alternatives, values)?,
            NormalizationMethod::PercentileRank => Self::percentile_rank(values),
        };

        if !criterion.direction.is_minimize() {
            return Ok(scaled);
        }
        let inverted = if method.is_bounded() {
            scaled.into_iter().map(|v| 1.0 - v).collect()
        } else {
            scaled.into_iter().map(|v| -v).collect()
        };
        Ok(inverted)
    }

    /// `(x − min) / (max − min)`; a zero-variance row maps to 0.5.
    pub fn min_max(values: &[f64]) -> Vec<f64> {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;

        if range == 0.0 {
            return vec![MIN_MAX_ZERO_VARIANCE; values.len()];
        }
        values.iter().map(|x| (x - min) / range).collect()
    }

    /// `(x − mean) / σ` with the population standard deviation; a zero-variance row maps to 0.
    pub fn z_score(values: &[f64]) -> Vec<f64> {
        if values.is_empty() {
            return Vec::new();
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        if std_dev == 0.0 {
            return vec![Z_SCORE_ZERO_VARIANCE; values.len()];
        }
        values.iter().map(|x| (x - mean) / std_dev).collect()
    }

    /// Ascending 1-indexed rank divided by N. Ties share the average rank.
    pub fn percentile_rank(values: &[f64]) -> Vec<f64> {
        let n = values.len() as f64;
        values
            .iter()
            .map(|x| {
                let below = values.iter().filter(|v| *v < x).count() as f64;
                let equal = values.iter().filter(|v| *v == x).count() as f64;
                let mid_rank = below + (equal + 1.0) / 2.0;
                mid_rank / n
            })
            .collect()
    }

    /// `ln(x) / ln(max)`, defined here for rows with every value ≥ 1.
    fn logarithmic(
        criterion: &Criterion,
        alternatives: &[Alternative],
        values: &[f64],
    ) -> Result<Vec<f64>, NormalizationError> {
        if let Some((alternative, value)) = alternatives
            .iter()
            .zip(values)
            .find(|(_, v)| **v <= 0.0)
        {
            return Err(NormalizationError::NonPositiveValue {
                criterion_id: criterion.id.clone(),
                alternative_id: alternative.id.clone(),
                value: *value,
            });
        }

        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if max <= 1.0 {
            return Err(NormalizationError::DegenerateLogScale {
                criterion_id: criterion.id.clone(),
                max,
            });
        }
        if let Some((alternative, value)) = alternatives
            .iter()
            .zip(values)
            .find(|(_, v)| **v < 1.0)
        {
            return Err(NormalizationError::LogValueBelowOne {
                criterion_id: criterion.id.clone(),
                alternative_id: alternative.id.clone(),
                value: *value,
            });
        }

        let log_max = max.ln();
        Ok(values.iter().map(|x| x.ln() / log_max).collect())
    }
}
