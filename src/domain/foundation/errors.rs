//! Error types for the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors raised while constructing or checking a value object.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must lie in [{min}, {max}], got {actual}")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        actual: f64,
    },

    #[error("Field '{field}' must be finite")]
    NonFinite { field: String },

    #[error("Parameter '{field}' is invalid: {reason}")]
    InvalidParameter { field: String, reason: String },
}

impl ValidationError {
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    pub fn out_of_range(field: impl Into<String>, min: f64, max: f64, actual: f64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    pub fn non_finite(field: impl Into<String>) -> Self {
        ValidationError::NonFinite { field: field.into() }
    }

    pub fn invalid_parameter(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::EmptyField { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::NonFinite { field }
            | ValidationError::InvalidParameter { field, .. } => field,
        }
    }
}

/// Error codes organized by pipeline stage.
///
/// These are stable strings the conversational layer keys its remediation
/// prompts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,

    // Decision matrix errors
    MatrixEmpty,
    DuplicateId,
    UnknownId,
    MissingCell,
    NonFiniteValue,

    // Weighting errors
    WeightsEmpty,
    PointTotalMismatch,
    InvalidWeight,
    MalformedPairwiseMatrix,

    // Normalization errors
    NonPositiveValue,
    DegenerateLogScale,
    LogValueBelowOne,

    // Scoring errors
    InvalidScoringFunction,

    // Aggregation errors
    ZeroScore,
    NegativeScore,
    WeightMismatch,

    // Sensitivity errors
    NoBreakeven,
    InsufficientSamples,
    TooFewAlternatives,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::MatrixEmpty => "MATRIX_EMPTY",
            ErrorCode::DuplicateId => "DUPLICATE_ID",
            ErrorCode::UnknownId => "UNKNOWN_ID",
            ErrorCode::MissingCell => "MISSING_CELL",
            ErrorCode::NonFiniteValue => "NON_FINITE_VALUE",
            ErrorCode::WeightsEmpty => "WEIGHTS_EMPTY",
            ErrorCode::PointTotalMismatch => "POINT_TOTAL_MISMATCH",
            ErrorCode::InvalidWeight => "INVALID_WEIGHT",
            ErrorCode::MalformedPairwiseMatrix => "MALFORMED_PAIRWISE_MATRIX",
            ErrorCode::NonPositiveValue => "NON_POSITIVE_VALUE",
            ErrorCode::DegenerateLogScale => "DEGENERATE_LOG_SCALE",
            ErrorCode::LogValueBelowOne => "LOG_VALUE_BELOW_ONE",
            ErrorCode::InvalidScoringFunction => "INVALID_SCORING_FUNCTION",
            ErrorCode::ZeroScore => "ZERO_SCORE",
            ErrorCode::NegativeScore => "NEGATIVE_SCORE",
            ErrorCode::WeightMismatch => "WEIGHT_MISMATCH",
            ErrorCode::NoBreakeven => "NO_BREAKEVEN",
            ErrorCode::InsufficientSamples => "INSUFFICIENT_SAMPLES",
            ErrorCode::TooFewAlternatives => "TOO_FEW_ALTERNATIVES",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates a validation error for a specific field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message).with_detail("field", field.into())
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        DomainError::validation(err.field(), err.to_string())
    }
}
