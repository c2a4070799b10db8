//! Weight Assigner - Converts an elicitation method into a normalized weight vector.
//!
//! Supported methods:
//! - Direct weights (rescaled to sum to 1)
//! - Rank Order Centroid (closed form from an importance ranking)
//! - Point allocation (points out of a fixed total)
//! - Analytic Hierarchy Process (pairwise comparisons + consistency ratio)

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::domain::foundation::CriterionId;

use super::WeightingError;

/// Tolerance for "weights sum to 1".
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Relative tolerance when checking `A[i][j] · A[j][i] = 1`.
pub const RECIPROCAL_TOLERANCE: f64 = 1e-3;

/// Conventional AHP consistency threshold. Above this a matrix is flagged, not rejected.
pub const CONSISTENCY_THRESHOLD: f64 = 0.10;

/// Saaty's Random Index for N = 1..=15.
pub const RANDOM_INDEX: [f64; 15] = [
    0.0, 0.0, 0.58, 0.90, 1.12, 1.24, 1.32, 1.41, 1.45, 1.49, 1.51, 1.48, 1.56, 1.57, 1.59,
];

/// Default total for point allocation.
pub const DEFAULT_POINT_TOTAL: u32 = 100;

/// A single criterion weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionWeight {
    pub criterion_id: CriterionId,
    pub weight: f64,
}

impl CriterionWeight {
    pub fn new(criterion_id: impl Into<CriterionId>, weight: f64) -> Self {
        Self {
            criterion_id: criterion_id.into(),
            weight,
        }
    }
}

/// Normalized criterion weights.
///
/// Invariant: every weight is finite and in [0, 1], no criterion repeats, and
/// the weights sum to 1 within [`WEIGHT_TOLERANCE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CriterionWeight>", into = "Vec<CriterionWeight>")]
pub struct WeightVector {
    entries: Vec<CriterionWeight>,
}

impl WeightVector {
    /// Creates a weight vector, validating the invariant.
    pub fn new(entries: Vec<CriterionWeight>) -> Result<Self, WeightingError> {
        validate_entries(&entries)?;
        let sum: f64 = entries.iter().map(|e| e.weight).sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(WeightingError::NotNormalized { sum });
        }
        Ok(Self { entries })
    }

    /// Weight of a criterion, if present.
    pub fn get(&self, criterion_id: &CriterionId) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| &e.criterion_id == criterion_id)
            .map(|e| e.weight)
    }

    pub fn entries(&self) -> &[CriterionWeight] {
        &self.entries
    }

    pub fn criterion_ids(&self) -> impl Iterator<Item = &CriterionId> {
        self.entries.iter().map(|e| &e.criterion_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|e| e.weight).sum()
    }

    /// Sets one criterion's weight and rescales the others to fill `1 − weight`.
    ///
    /// The other criteria keep their relative proportions. If they all weigh
    /// zero they share the remainder equally. With a single criterion the
    /// vector is returned unchanged, since its weight must stay 1.
    pub fn with_weight(
        &self,
        criterion_id: &CriterionId,
        weight: f64,
    ) -> Result<WeightVector, WeightingError> {
        if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
            return Err(WeightingError::InvalidWeight {
                criterion_id: criterion_id.clone(),
                value: weight,
            });
        }
        if self.get(criterion_id).is_none() {
            return Err(WeightingError::UnknownCriterion(criterion_id.clone()));
        }
        if self.entries.len() == 1 {
            return Ok(self.clone());
        }

        let others = self.entries.len() - 1;
        let rest: f64 = self
            .entries
            .iter()
            .filter(|e| &e.criterion_id != criterion_id)
            .map(|e| e.weight)
            .sum();
        let remainder = 1.0 - weight;

        let entries = self
            .entries
            .iter()
            .map(|e| {
                let w = if &e.criterion_id == criterion_id {
                    weight
                } else if rest > 0.0 {
                    e.weight * remainder / rest
                } else {
                    remainder / others as f64
                };
                CriterionWeight::new(e.criterion_id.clone(), w)
            })
            .collect();

        Ok(Self { entries })
    }

    /// Zeroes one criterion and rescales the rest to sum to 1.
    ///
    /// # Errors
    /// `Empty` if the criterion is the only one.
    pub fn without(&self, criterion_id: &CriterionId) -> Result<WeightVector, WeightingError> {
        if self.get(criterion_id).is_none() {
            return Err(WeightingError::UnknownCriterion(criterion_id.clone()));
        }
        if self.entries.len() == 1 {
            return Err(WeightingError::Empty);
        }
        self.with_weight(criterion_id, 0.0)
    }

    /// Rescales raw non-negative values so they sum to 1. Trusts its input.
    pub(crate) fn renormalized(entries: Vec<CriterionWeight>) -> Option<WeightVector> {
        let sum: f64 = entries.iter().map(|e| e.weight).sum();
        if !sum.is_finite() || sum <= 0.0 {
            return None;
        }
        Some(Self {
            entries: entries
                .into_iter()
                .map(|e| CriterionWeight::new(e.criterion_id, e.weight / sum))
                .collect(),
        })
    }
}

impl TryFrom<Vec<CriterionWeight>> for WeightVector {
    type Error = WeightingError;

    fn try_from(entries: Vec<CriterionWeight>) -> Result<Self, Self::Error> {
        WeightVector::new(entries)
    }
}

impl From<WeightVector> for Vec<CriterionWeight> {
    fn from(weights: WeightVector) -> Self {
        weights.entries
    }
}

fn validate_entries(entries: &[CriterionWeight]) -> Result<(), WeightingError> {
    if entries.is_empty() {
        return Err(WeightingError::Empty);
    }
    let mut seen = HashSet::new();
    for entry in entries {
        if !seen.insert(&entry.criterion_id) {
            return Err(WeightingError::DuplicateCriterion(entry.criterion_id.clone()));
        }
        if !entry.weight.is_finite() || entry.weight < 0.0 {
            return Err(WeightingError::InvalidWeight {
                criterion_id: entry.criterion_id.clone(),
                value: entry.weight,
            });
        }
    }
    Ok(())
}

/// AHP consistency measures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyRatio {
    /// CR = CI / RI(N). Zero when RI(N) is zero (N ≤ 2).
    pub ratio: f64,
    /// CI = (λmax − N) / (N − 1).
    pub consistency_index: f64,
    /// Principal eigenvalue estimate.
    pub lambda_max: f64,
    pub random_index: f64,
}

impl ConsistencyRatio {
    /// Returns true if the ratio does not exceed `threshold`.
    pub fn is_acceptable(&self, threshold: f64) -> bool {
        self.ratio <= threshold
    }
}

/// Square matrix of pairwise importance judgements for AHP.
///
/// `A[i][j]` is how much more important criterion i is than j.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseComparisonMatrix {
    criterion_ids: Vec<CriterionId>,
    entries: Vec<Vec<f64>>,
}

impl PairwiseComparisonMatrix {
    /// Starts from the identity matrix (all criteria equally important).
    pub fn new(criterion_ids: Vec<CriterionId>) -> Result<Self, WeightingError> {
        if criterion_ids.is_empty() {
            return Err(WeightingError::Empty);
        }
        let mut seen = HashSet::new();
        if let Some(dup) = criterion_ids.iter().find(|id| !seen.insert(*id)) {
            return Err(WeightingError::DuplicateCriterion(dup.clone()));
        }
        let n = criterion_ids.len();
        Ok(Self {
            criterion_ids,
            entries: vec![vec![1.0; n]; n],
        })
    }

    /// Wraps a full matrix as given. Validation happens in [`WeightAssigner::ahp`].
    pub fn from_rows(criterion_ids: Vec<CriterionId>, rows: Vec<Vec<f64>>) -> Self {
        Self {
            criterion_ids,
            entries: rows,
        }
    }

    /// Records that `more` is `intensity` times as important as `less`.
    ///
    /// Sets the reciprocal entry as well.
    pub fn compare(
        mut self,
        more: &CriterionId,
        less: &CriterionId,
        intensity: f64,
    ) -> Result<Self, WeightingError> {
        let i = self.index_of(more)?;
        let j = self.index_of(less)?;
        if !intensity.is_finite() || intensity <= 0.0 {
            return Err(WeightingError::malformed(format!(
                "comparison of '{}' over '{}' must be positive, got {}",
                more, less, intensity
            )));
        }
        if i == j {
            if (intensity - 1.0).abs() > RECIPROCAL_TOLERANCE {
                return Err(WeightingError::malformed(format!(
                    "'{}' compared with itself must be 1, got {}",
                    more, intensity
                )));
            }
            return Ok(self);
        }
        self.entries[i][j] = intensity;
        self.entries[j][i] = 1.0 / intensity;
        Ok(self)
    }

    fn index_of(&self, id: &CriterionId) -> Result<usize, WeightingError> {
        self.criterion_ids
            .iter()
            .position(|c| c == id)
            .ok_or_else(|| WeightingError::UnknownCriterion(id.clone()))
    }

    pub fn criterion_ids(&self) -> &[CriterionId] {
        &self.criterion_ids
    }

    pub fn size(&self) -> usize {
        self.criterion_ids.len()
    }

    pub fn value(&self, row: usize, column: usize) -> Option<f64> {
        self.entries.get(row)?.get(column).copied()
    }

    /// Checks shape, positivity, unit diagonal and reciprocity.
    pub fn validate(&self) -> Result<(), WeightingError> {
        let n = self.criterion_ids.len();
        if n == 0 {
            return Err(WeightingError::Empty);
        }
        if n > RANDOM_INDEX.len() {
            return Err(WeightingError::malformed(format!(
                "AHP supports at most {} criteria, got {}",
                RANDOM_INDEX.len(),
                n
            )));
        }
        if self.entries.len() != n || self.entries.iter().any(|row| row.len() != n) {
            return Err(WeightingError::malformed(format!(
                "matrix must be {0}x{0} to match its criteria",
                n
            )));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.criterion_ids.iter().find(|id| !seen.insert(*id)) {
            return Err(WeightingError::DuplicateCriterion(dup.clone()));
        }

        for i in 0..n {
            for j in 0..n {
                let a = self.entries[i][j];
                if !a.is_finite() || a <= 0.0 {
                    return Err(WeightingError::malformed(format!(
                        "entry [{}][{}] must be positive, got {}",
                        i, j, a
                    )));
                }
            }
            if (self.entries[i][i] - 1.0).abs() > RECIPROCAL_TOLERANCE {
                return Err(WeightingError::malformed(format!(
                    "diagonal entry [{0}][{0}] must be 1, got {1}",
                    i, self.entries[i][i]
                )));
            }
            for j in (i + 1)..n {
                let product = self.entries[i][j] * self.entries[j][i];
                if (product - 1.0).abs() > RECIPROCAL_TOLERANCE {
                    return Err(WeightingError::malformed(format!(
                        "entries [{0}][{1}] and [{1}][{0}] are not reciprocal",
                        i, j
                    )));
                }
            }
        }
        Ok(())
    }
}

/// One pairwise judgement as supplied by the elicitation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseJudgement {
    pub more: CriterionId,
    pub less: CriterionId,
    pub intensity: f64,
}

/// A single criterion's point allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionPoints {
    pub criterion_id: CriterionId,
    pub points: u32,
}

/// Weighting method chosen at runtime, with its method-specific parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum WeightingInput {
    Direct {
        weights: Vec<CriterionWeight>,
    },
    RankOrderCentroid {
        /// Most important first.
        ranking: Vec<CriterionId>,
    },
    PointAllocation {
        points: Vec<CriterionPoints>,
        #[serde(default = "default_point_total")]
        total: u32,
    },
    Ahp {
        criteria: Vec<CriterionId>,
        judgements: Vec<PairwiseJudgement>,
    },
}

fn default_point_total() -> u32 {
    DEFAULT_POINT_TOTAL
}

/// Result of a weighting step. AHP also reports consistency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightAssignment {
    pub weights: WeightVector,
    pub consistency: Option<ConsistencyRatio>,
}

/// Weight derivation functions.
pub struct WeightAssigner;

impl WeightAssigner {
    /// Dispatches on the chosen method.
    pub fn assign(input: &WeightingInput) -> Result<WeightAssignment, WeightingError> {
        match input {
            WeightingInput::Direct { weights } => {
                let weights =
                    Self::direct(weights.iter().map(|w| (w.criterion_id.clone(), w.weight)))?;
                Ok(WeightAssignment {
                    weights,
                    consistency: None,
                })
            }
            WeightingInput::RankOrderCentroid { ranking } => Ok(WeightAssignment {
                weights: Self::rank_order_centroid(ranking.iter().cloned())?,
                consistency: None,
            }),
            WeightingInput::PointAllocation { points, total } => Ok(WeightAssignment {
                weights: Self::point_allocation(
                    points.iter().map(|p| (p.criterion_id.clone(), p.points)),
                    *total,
                )?,
                consistency: None,
            }),
            WeightingInput::Ahp {
                criteria,
                judgements,
            } => {
                let mut matrix = PairwiseComparisonMatrix::new(criteria.clone())?;
                for judgement in judgements {
                    matrix = matrix.compare(&judgement.more, &judgement.less, judgement.intensity)?;
                }
                let (weights, consistency) = Self::ahp(&matrix)?;
                Ok(WeightAssignment {
                    weights,
                    consistency: Some(consistency),
                })
            }
        }
    }

    /// Direct weights, rescaled by their sum unless they already sum to 1±ε.
    ///
    /// # Errors
    /// - `Empty` if no criteria are given
    /// - `InvalidWeight` for negative or non-finite weights
    /// - `ZeroTotal` if every weight is zero
    pub fn direct<I, K>(raw_weights: I) -> Result<WeightVector, WeightingError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<CriterionId>,
    {
        let entries: Vec<CriterionWeight> = raw_weights
            .into_iter()
            .map(|(id, w)| CriterionWeight::new(id, w))
            .collect();
        validate_entries(&entries)?;

        let sum: f64 = entries.iter().map(|e| e.weight).sum();
        if sum == 0.0 {
            return Err(WeightingError::ZeroTotal);
        }
        if (sum - 1.0).abs() <= WEIGHT_TOLERANCE {
            return Ok(WeightVector { entries });
        }
        WeightVector::renormalized(entries).ok_or(WeightingError::ZeroTotal)
    }

    /// Rank Order Centroid weights.
    ///
    /// # Algorithm
    /// For N criteria, the criterion ranked k (1-indexed) gets
    /// `(1/N) · Σ_{i=k}^{N} 1/i`.
    pub fn rank_order_centroid<I, K>(ranked_criteria: I) -> Result<WeightVector, WeightingError>
    where
        I: IntoIterator<Item = K>,
        K: Into<CriterionId>,
    {
        let ranked: Vec<CriterionId> = ranked_criteria.into_iter().map(Into::into).collect();
        if ranked.is_empty() {
            return Err(WeightingError::Empty);
        }
        let mut seen = HashSet::new();
        if let Some(dup) = ranked.iter().find(|id| !seen.insert(*id)) {
            return Err(WeightingError::DuplicateCriterion(dup.clone()));
        }

        let n = ranked.len();
        let entries = ranked
            .into_iter()
            .enumerate()
            .map(|(position, id)| {
                let k = position + 1;
                let tail: f64 = (k..=n).map(|i| 1.0 / i as f64).sum();
                CriterionWeight::new(id, tail / n as f64)
            })
            .collect();

        Ok(WeightVector { entries })
    }

    /// Point allocation weights: `points / total`.
    ///
    /// # Errors
    /// - `Empty` if no criteria are given
    /// - `TotalMismatch` if the points do not add up to `total`
    /// - `ZeroTotal` if `total` is zero
    pub fn point_allocation<I, K>(points: I, total: u32) -> Result<WeightVector, WeightingError>
    where
        I: IntoIterator<Item = (K, u32)>,
        K: Into<CriterionId>,
    {
        let points: Vec<(CriterionId, u32)> =
            points.into_iter().map(|(id, p)| (id.into(), p)).collect();
        if points.is_empty() {
            return Err(WeightingError::Empty);
        }
        let mut seen = HashSet::new();
        for (id, _) in &points {
            if !seen.insert(id) {
                return Err(WeightingError::DuplicateCriterion(id.clone()));
            }
        }

        let actual: u64 = points.iter().map(|(_, p)| u64::from(*p)).sum();
        if actual != u64::from(total) {
            return Err(WeightingError::TotalMismatch {
                expected: total,
                actual,
            });
        }
        if total == 0 {
            return Err(WeightingError::ZeroTotal);
        }

        let entries = points
            .into_iter()
            .map(|(id, p)| CriterionWeight::new(id, f64::from(p) / f64::from(total)))
            .collect();
        Ok(WeightVector { entries })
    }

    /// Analytic Hierarchy Process weights and consistency ratio.
    ///
    /// # Algorithm
    /// 1. Normalize each column to sum to 1, then average each row (weights).
    /// 2. λmax = mean of (A·w)_i / w_i.
    /// 3. CI = (λmax − N) / (N − 1); CR = CI / RI(N).
    ///
    /// A CR above [`CONSISTENCY_THRESHOLD`] is reported, not rejected.
    ///
    /// # Errors
    /// `MalformedMatrix` for non-square, non-positive or non-reciprocal input.
    pub fn ahp(
        pairwise: &PairwiseComparisonMatrix,
    ) -> Result<(WeightVector, ConsistencyRatio), WeightingError> {
        pairwise.validate()?;

        let a = &pairwise.entries;
        let n = pairwise.size();

        let column_sums: Vec<f64> = (0..n).map(|j| (0..n).map(|i| a[i][j]).sum()).collect();
        let weights: Vec<f64> = (0..n)
            .map(|i| (0..n).map(|j| a[i][j] / column_sums[j]).sum::<f64>() / n as f64)
            .collect();

        let lambda_max = (0..n)
            .map(|i| {
                let aw: f64 = (0..n).map(|j| a[i][j] * weights[j]).sum();
                aw / weights[i]
            })
            .sum::<f64>()
            / n as f64;

        let consistency_index = if n > 1 {
            (lambda_max - n as f64) / (n as f64 - 1.0)
        } else {
            0.0
        };
        let random_index = RANDOM_INDEX[n - 1];
        let ratio = if random_index > 0.0 {
            consistency_index / random_index
        } else {
            0.0
        };

        debug!(
            criteria = n,
            lambda_max,
            consistency_ratio = ratio,
            "Derived AHP weights"
        );

        let entries = pairwise
            .criterion_ids
            .iter()
            .cloned()
            .zip(weights)
            .map(|(id, w)| CriterionWeight::new(id, w))
            .collect();

        Ok((
            WeightVector { entries },
            ConsistencyRatio {
                ratio,
                consistency_index,
                lambda_max,
                random_index,
            },
        ))
    }
}
