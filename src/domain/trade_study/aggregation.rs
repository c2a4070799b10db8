//! Aggregator - Combines weighted criterion scores into a ranked result.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::domain::foundation::{AlternativeId, CriterionId};

use super::{AggregationError, ScoreTable, ScoredMatrix, WeightVector};

/// Aggregation method chosen at runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMethod {
    /// Σ weight · score. Fully compensatory.
    #[default]
    WeightedSum,
    /// Π score ^ weight. Requires strictly positive scores.
    WeightedProduct,
    /// Closeness to the ideal alternative.
    Topsis,
}

impl fmt::Display for AggregationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AggregationMethod::WeightedSum => "weighted_sum",
            AggregationMethod::WeightedProduct => "weighted_product",
            AggregationMethod::Topsis => "topsis",
        };
        write!(f, "{}", name)
    }
}

/// Aggregate score and 1-based rank of one alternative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeScore {
    pub alternative_id: AlternativeId,
    pub score: f64,
    pub rank: usize,
}

/// Ranked aggregation output, best first.
///
/// Ties are broken by alternative ID so the ranking is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    pub method: AggregationMethod,
    pub scores: Vec<AlternativeScore>,
}

impl AggregatedResult {
    /// Sorts raw scores into a ranked result.
    pub fn ranked(method: AggregationMethod, scores: Vec<(AlternativeId, f64)>) -> Self {
        let mut scores = scores;
        scores.sort_by(|(a_id, a), (b_id, b)| b.total_cmp(a).then_with(|| a_id.cmp(b_id)));

        let scores = scores
            .into_iter()
            .enumerate()
            .map(|(i, (alternative_id, score))| AlternativeScore {
                alternative_id,
                score,
                rank: i + 1,
            })
            .collect();

        Self { method, scores }
    }

    /// The top-ranked alternative.
    pub fn winner(&self) -> Option<&AlternativeScore> {
        self.scores.first()
    }

    /// The second-ranked alternative.
    pub fn runner_up(&self) -> Option<&AlternativeScore> {
        self.scores.get(1)
    }

    pub fn score_of(&self, alternative_id: &AlternativeId) -> Option<f64> {
        self.find(alternative_id).map(|s| s.score)
    }

    pub fn rank_of(&self, alternative_id: &AlternativeId) -> Option<usize> {
        self.find(alternative_id).map(|s| s.rank)
    }

    /// Alternative IDs in rank order.
    pub fn ranking(&self) -> Vec<&AlternativeId> {
        self.scores.iter().map(|s| &s.alternative_id).collect()
    }

    fn find(&self, alternative_id: &AlternativeId) -> Option<&AlternativeScore> {
        self.scores
            .iter()
            .find(|s| &s.alternative_id == alternative_id)
    }
}

/// Aggregation functions.
pub struct Aggregator;

impl Aggregator {
    /// Aggregates a scored matrix under the given weights.
    ///
    /// # Algorithm
    /// - Weighted sum: `Σ_c w_c · s_c`
    /// - Weighted product: `Π_c s_c ^ w_c`
    /// - TOPSIS: `D⁻ / (D* + D⁻)` over the weighted matrix `v = w · s`,
    ///   with the ideal and anti-ideal taken per criterion as max and min of `v`
    ///
    /// # Edge Cases
    /// - TOPSIS scores 1.0 when both distances are 0 (every alternative identical)
    /// - Weighted product checks every score, including zero-weight criteria
    ///
    /// # Errors
    /// - `WeightMismatch` if weights and matrix cover different criteria
    /// - `ZeroScore` / `NegativeScore` for weighted product on non-positive scores
    pub fn aggregate(
        scored: &ScoredMatrix,
        weights: &WeightVector,
        method: AggregationMethod,
    ) -> Result<AggregatedResult, AggregationError> {
        let table = scored.table();
        if table.criterion_count() == 0 || table.alternative_count() == 0 {
            return Err(AggregationError::Empty);
        }

        let row_weights = Self::row_weights(table, weights)?;

        let totals = match method {
            AggregationMethod::WeightedSum => Self::weighted_sum(table, &row_weights),
            AggregationMethod::WeightedProduct => Self::weighted_product(table, &row_weights)?,
            AggregationMethod::Topsis => Self::topsis(table, &row_weights),
        };

        let result = AggregatedResult::ranked(
            method,
            table.alternative_ids().iter().cloned().zip(totals).collect(),
        );

        debug!(
            method = %method,
            criteria = table.criterion_count(),
            alternatives = table.alternative_count(),
            winner = result.winner().map(|w| w.alternative_id.as_str()).unwrap_or_default(),
            "Aggregated scores"
        );

        Ok(result)
    }

    /// Lines the weight vector up with the matrix rows.
    fn row_weights(table: &ScoreTable, weights: &WeightVector) -> Result<Vec<f64>, AggregationError> {
        if let Some(extra) = weights
            .criterion_ids()
            .find(|id| table.criterion_index(id).is_none())
        {
            return Err(AggregationError::WeightMismatch {
                criterion_id: extra.clone(),
            });
        }

        table
            .criterion_ids()
            .iter()
            .map(|id| {
                weights.get(id).ok_or_else(|| AggregationError::WeightMismatch {
                    criterion_id: id.clone(),
                })
            })
            .collect()
    }

    fn weighted_sum(table: &ScoreTable, weights: &[f64]) -> Vec<f64> {
        (0..table.alternative_count())
            .map(|a| {
                table
                    .rows()
                    .iter()
                    .zip(weights)
                    .map(|(row, w)| w * row[a])
                    .sum::<f64>()
            })
            .collect()
    }

    fn weighted_product(table: &ScoreTable, weights: &[f64]) -> Result<Vec<f64>, AggregationError> {
        for (r, row) in table.rows().iter().enumerate() {
            for (a, &value) in row.iter().enumerate() {
                if value == 0.0 {
                    return Err(AggregationError::ZeroScore {
                        criterion_id: criterion_at(table, r),
                        alternative_id: table.alternative_ids()[a].clone(),
                    });
                }
                if value < 0.0 {
                    return Err(AggregationError::NegativeScore {
                        criterion_id: criterion_at(table, r),
                        alternative_id: table.alternative_ids()[a].clone(),
                        value,
                    });
                }
            }
        }

        Ok((0..table.alternative_count())
            .map(|a| {
                table
                    .rows()
                    .iter()
                    .zip(weights)
                    .map(|(row, w)| row[a].powf(*w))
                    .product::<f64>()
            })
            .collect())
    }

    fn topsis(table: &ScoreTable, weights: &[f64]) -> Vec<f64> {
        let weighted: Vec<Vec<f64>> = table
            .rows()
            .iter()
            .zip(weights)
            .map(|(row, w)| row.iter().map(|s| w * s).collect())
            .collect();

        let ideal: Vec<f64> = weighted
            .iter()
            .map(|row| row.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            .collect();
        let anti_ideal: Vec<f64> = weighted
            .iter()
            .map(|row| row.iter().copied().fold(f64::INFINITY, f64::min))
            .collect();

        (0..table.alternative_count())
            .map(|a| {
                let to_ideal = distance(&weighted, a, &ideal);
                let to_anti_ideal = distance(&weighted, a, &anti_ideal);
                let total = to_ideal + to_anti_ideal;
                if total == 0.0 {
                    1.0
                } else {
                    to_anti_ideal / total
                }
            })
            .collect()
    }
}

fn criterion_at(table: &ScoreTable, row: usize) -> CriterionId {
    table.criterion_ids()[row].clone()
}

/// Euclidean distance between alternative `a` and a reference point.
fn distance(weighted: &[Vec<f64>], a: usize, reference: &[f64]) -> f64 {
    weighted
        .iter()
        .zip(reference)
        .map(|(row, r)| (row[a] - r).powi(2))
        .sum::<f64>()
        .sqrt()
}
