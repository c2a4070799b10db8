//! Trade Study Module - Multi-criteria decision analysis engine.
//!
//! Turns a decision matrix (alternatives scored against criteria) and a set of
//! criterion weights into a ranked recommendation, then probes how robust that
//! recommendation is.
//!
//! # Components
//!
//! - `DecisionMatrix` - Raw scores, built with `DecisionMatrixBuilder`
//! - `WeightAssigner` - Direct, rank order centroid, point allocation and AHP weights
//! - `Normalizer` - Min-max, z-score, logarithmic and percentile-rank rescaling
//! - `ScoringFunction` - Linear, step, exponential, sigmoid and piecewise utility curves
//! - `Aggregator` - Weighted sum, weighted product and TOPSIS
//! - `DominanceAnalyzer` - Pareto screening and non-discriminating criteria
//! - `SensitivityAnalyzer` - Weight zeroing, tornado, Monte Carlo and breakeven
//! - `TradeStudy` - Runs every stage in order
//!
//! # Design Philosophy
//!
//! Every stage is a pure function: immutable inputs in, a new value out. Methods
//! are chosen at runtime through enums carrying their own parameters.

mod aggregation;
mod dominance;
mod errors;
mod matrix;
mod normalization;
mod pipeline;
mod scoring;
mod sensitivity;
mod weighting;

// Re-export all public types
pub use aggregation::{AggregatedResult, AggregationMethod, Aggregator, AlternativeScore};
pub use dominance::{DominanceAnalyzer, DominatedAlternative, NonDiscriminatingCriterion};
pub use errors::{
    AggregationError, MatrixError, NormalizationError, ScoringError, SensitivityError,
    TradeStudyError, WeightingError,
};
pub use matrix::{DecisionMatrix, DecisionMatrixBuilder, NormalizedMatrix, ScoreTable, ScoredMatrix};
pub use normalization::{
    NormalizationMethod, NormalizationPlan, Normalizer, MIN_MAX_ZERO_VARIANCE,
    Z_SCORE_ZERO_VARIANCE,
};
pub use pipeline::{TradeStudy, TradeStudyInput, TradeStudyOutcome};
pub use scoring::{ControlPoint, ScoringFunction, ScoringFunctionSpec, StepThreshold};
pub use sensitivity::{
    BreakevenConfig, BreakevenPoint, ConfidenceInterval, MonteCarloConfig, MonteCarloOutcome,
    MonteCarloResult, SensitivityAnalyzer, SensitivityConfig, SensitivityReport, TornadoBar,
    WeightDistribution, WeightZeroingResult, DEFAULT_TORNADO_SWING, SAMPLE_BLOCK_SIZE,
};
pub use weighting::{
    ConsistencyRatio, CriterionPoints, CriterionWeight, PairwiseComparisonMatrix,
    PairwiseJudgement, WeightAssigner, WeightAssignment, WeightVector, WeightingInput,
    CONSISTENCY_THRESHOLD, DEFAULT_POINT_TOTAL, RANDOM_INDEX, RECIPROCAL_TOLERANCE,
    WEIGHT_TOLERANCE,
};
