//! Error types for the trade study pipeline.
//!
//! One enum per stage. Every failure is a typed, recoverable result; the
//! engine never swallows an error or substitutes a silent default. The only
//! documented defaults are the zero-variance policies in normalization.

use thiserror::Error;

use crate::domain::foundation::{
    AlternativeId, CriterionId, DomainError, ErrorCode, ValidationError,
};

/// Errors raised while assembling a decision matrix.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatrixError {
    #[error("Decision matrix needs at least one criterion and one alternative")]
    Empty,

    #[error("Duplicate criterion '{0}'")]
    DuplicateCriterion(CriterionId),

    #[error("Duplicate alternative '{0}'")]
    DuplicateAlternative(AlternativeId),

    #[error("Unknown criterion '{0}'")]
    UnknownCriterion(CriterionId),

    #[error("Unknown alternative '{0}'")]
    UnknownAlternative(AlternativeId),

    #[error("Missing score for criterion '{criterion_id}' and alternative '{alternative_id}'")]
    MissingCell {
        criterion_id: CriterionId,
        alternative_id: AlternativeId,
    },

    #[error("Score for criterion '{criterion_id}' and alternative '{alternative_id}' is not finite")]
    NonFiniteValue {
        criterion_id: CriterionId,
        alternative_id: AlternativeId,
    },

    #[error("Expected {expected_rows} rows of {expected_columns} values")]
    ShapeMismatch {
        expected_rows: usize,
        expected_columns: usize,
    },
}

/// Errors raised while deriving a weight vector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightingError {
    #[error("No criteria were given")]
    Empty,

    #[error("Point allocation sums to {actual}, expected {expected}")]
    TotalMismatch { expected: u32, actual: u64 },

    #[error("Malformed pairwise comparison matrix: {reason}")]
    MalformedMatrix { reason: String },

    #[error("Weight for criterion '{criterion_id}' must be finite and non-negative, got {value}")]
    InvalidWeight { criterion_id: CriterionId, value: f64 },

    #[error("Weights sum to zero and cannot be rescaled")]
    ZeroTotal,

    #[error("Weights sum to {sum}, expected 1.0")]
    NotNormalized { sum: f64 },

    #[error("Criterion '{0}' appears more than once")]
    DuplicateCriterion(CriterionId),

    #[error("Criterion '{0}' has no weight")]
    UnknownCriterion(CriterionId),
}

impl WeightingError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        WeightingError::MalformedMatrix {
            reason: reason.into(),
        }
    }
}

/// Errors raised during normalization.
///
/// Zero variance is not an error: min-max maps such rows to 0.5 and z-score
/// maps them to 0.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizationError {
    #[error(
        "Logarithmic normalization of criterion '{criterion_id}' requires positive values, \
         alternative '{alternative_id}' has {value}"
    )]
    NonPositiveValue {
        criterion_id: CriterionId,
        alternative_id: AlternativeId,
        value: f64,
    },

    #[error("Logarithmic normalization of criterion '{criterion_id}' needs a maximum above 1, got {max}")]
    DegenerateLogScale { criterion_id: CriterionId, max: f64 },

    #[error(
        "Logarithmic normalization of criterion '{criterion_id}' requires values of at least 1, \
         alternative '{alternative_id}' has {value}"
    )]
    LogValueBelowOne {
        criterion_id: CriterionId,
        alternative_id: AlternativeId,
        value: f64,
    },

    #[error("Normalization override names unknown criterion '{0}'")]
    UnknownCriterion(CriterionId),
}

/// Errors raised while applying scoring functions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("Invalid scoring function for criterion '{criterion_id}': {source}")]
    InvalidFunction {
        criterion_id: CriterionId,
        #[source]
        source: ValidationError,
    },

    #[error("Scoring function given for unknown criterion '{0}'")]
    UnknownCriterion(CriterionId),
}

/// Errors raised during aggregation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregationError {
    #[error("Cannot aggregate an empty matrix")]
    Empty,

    #[error(
        "Weighted product is undefined: criterion '{criterion_id}' scores alternative \
         '{alternative_id}' at exactly 0"
    )]
    ZeroScore {
        criterion_id: CriterionId,
        alternative_id: AlternativeId,
    },

    #[error(
        "Weighted product is undefined: criterion '{criterion_id}' scores alternative \
         '{alternative_id}' at {value}"
    )]
    NegativeScore {
        criterion_id: CriterionId,
        alternative_id: AlternativeId,
        value: f64,
    },

    #[error("Weights and scored matrix disagree on criterion '{criterion_id}'")]
    WeightMismatch { criterion_id: CriterionId },
}

/// Errors raised during sensitivity analysis.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SensitivityError {
    #[error("No weight for criterion '{criterion_id}' in [0, 1] makes the top two alternatives tie")]
    NoBreakeven { criterion_id: CriterionId },

    #[error("Monte Carlo needs at least {minimum} samples, got {requested}")]
    InsufficientSamples { requested: usize, minimum: usize },

    #[error("Breakeven analysis needs at least two alternatives, got {count}")]
    TooFewAlternatives { count: usize },

    #[error("Invalid weight distribution for criterion '{criterion_id}': {reason}")]
    InvalidDistribution {
        criterion_id: CriterionId,
        reason: String,
    },

    #[error(transparent)]
    Weighting(#[from] WeightingError),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),
}

/// Any failure of the trade study pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TradeStudyError {
    #[error(transparent)]
    Matrix(#[from] MatrixError),

    #[error(transparent)]
    Weighting(#[from] WeightingError),

    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    #[error(transparent)]
    Sensitivity(#[from] SensitivityError),
}

impl TradeStudyError {
    /// Returns the stable error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            TradeStudyError::Matrix(err) => match err {
                MatrixError::Empty => ErrorCode::MatrixEmpty,
                MatrixError::DuplicateCriterion(_) | MatrixError::DuplicateAlternative(_) => {
                    ErrorCode::DuplicateId
                }
                MatrixError::UnknownCriterion(_) | MatrixError::UnknownAlternative(_) => {
                    ErrorCode::UnknownId
                }
                MatrixError::MissingCell { .. } => ErrorCode::MissingCell,
                MatrixError::NonFiniteValue { .. } => ErrorCode::NonFiniteValue,
                MatrixError::ShapeMismatch { .. } => ErrorCode::ValidationFailed,
            },
            TradeStudyError::Weighting(err) => weighting_code(err),
            TradeStudyError::Normalization(err) => match err {
                NormalizationError::NonPositiveValue { .. } => ErrorCode::NonPositiveValue,
                NormalizationError::DegenerateLogScale { .. } => ErrorCode::DegenerateLogScale,
                NormalizationError::LogValueBelowOne { .. } => ErrorCode::LogValueBelowOne,
                NormalizationError::UnknownCriterion(_) => ErrorCode::UnknownId,
            },
            TradeStudyError::Scoring(err) => match err {
                ScoringError::InvalidFunction { .. } => ErrorCode::InvalidScoringFunction,
                ScoringError::UnknownCriterion(_) => ErrorCode::UnknownId,
            },
            TradeStudyError::Aggregation(err) => aggregation_code(err),
            TradeStudyError::Sensitivity(err) => match err {
                SensitivityError::NoBreakeven { .. } => ErrorCode::NoBreakeven,
                SensitivityError::InsufficientSamples { .. } => ErrorCode::InsufficientSamples,
                SensitivityError::TooFewAlternatives { .. } => ErrorCode::TooFewAlternatives,
                SensitivityError::InvalidDistribution { .. } => ErrorCode::ValidationFailed,
                SensitivityError::Weighting(inner) => weighting_code(inner),
                SensitivityError::Aggregation(inner) => aggregation_code(inner),
            },
        }
    }

    /// Returns the criterion the failure refers to, if any.
    fn criterion_id(&self) -> Option<&CriterionId> {
        match self {
            TradeStudyError::Matrix(
                MatrixError::DuplicateCriterion(id)
                | MatrixError::UnknownCriterion(id)
                | MatrixError::MissingCell { criterion_id: id, .. }
                | MatrixError::NonFiniteValue { criterion_id: id, .. },
            ) => Some(id),
            TradeStudyError::Weighting(
                WeightingError::InvalidWeight { criterion_id: id, .. }
                | WeightingError::DuplicateCriterion(id)
                | WeightingError::UnknownCriterion(id),
            ) => Some(id),
            TradeStudyError::Normalization(
                NormalizationError::NonPositiveValue { criterion_id: id, .. }
                | NormalizationError::DegenerateLogScale { criterion_id: id, .. }
                | NormalizationError::LogValueBelowOne { criterion_id: id, .. }
                | NormalizationError::UnknownCriterion(id),
            ) => Some(id),
            TradeStudyError::Scoring(
                ScoringError::InvalidFunction { criterion_id: id, .. }
                | ScoringError::UnknownCriterion(id),
            ) => Some(id),
            TradeStudyError::Aggregation(
                AggregationError::ZeroScore { criterion_id: id, .. }
                | AggregationError::NegativeScore { criterion_id: id, .. }
                | AggregationError::WeightMismatch { criterion_id: id },
            ) => Some(id),
            TradeStudyError::Sensitivity(
                SensitivityError::NoBreakeven { criterion_id: id }
                | SensitivityError::InvalidDistribution { criterion_id: id, .. },
            ) => Some(id),
            _ => None,
        }
    }
}

fn weighting_code(err: &WeightingError) -> ErrorCode {
    match err {
        WeightingError::Empty => ErrorCode::WeightsEmpty,
        WeightingError::TotalMismatch { .. } => ErrorCode::PointTotalMismatch,
        WeightingError::MalformedMatrix { .. } => ErrorCode::MalformedPairwiseMatrix,
        WeightingError::InvalidWeight { .. }
        | WeightingError::ZeroTotal
        | WeightingError::NotNormalized { .. } => ErrorCode::InvalidWeight,
        WeightingError::DuplicateCriterion(_) => ErrorCode::DuplicateId,
        WeightingError::UnknownCriterion(_) => ErrorCode::UnknownId,
    }
}

fn aggregation_code(err: &AggregationError) -> ErrorCode {
    match err {
        AggregationError::Empty => ErrorCode::MatrixEmpty,
        AggregationError::ZeroScore { .. } => ErrorCode::ZeroScore,
        AggregationError::NegativeScore { .. } => ErrorCode::NegativeScore,
        AggregationError::WeightMismatch { .. } => ErrorCode::WeightMismatch,
    }
}

impl From<TradeStudyError> for DomainError {
    fn from(err: TradeStudyError) -> Self {
        let mut domain = DomainError::new(err.code(), err.to_string());

        if let Some(id) = err.criterion_id() {
            domain = domain.with_detail("criterion_id", id.as_str());
        }

        match &err {
            TradeStudyError::Weighting(WeightingError::TotalMismatch { expected, actual }) => {
                domain
                    .with_detail("expected", expected.to_string())
                    .with_detail("actual", actual.to_string())
            }
            TradeStudyError::Sensitivity(SensitivityError::InsufficientSamples {
                requested,
                minimum,
            }) => domain
                .with_detail("requested", requested.to_string())
                .with_detail("minimum", minimum.to_string()),
            _ => domain,
        }
    }
}
