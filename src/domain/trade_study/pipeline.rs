//! Trade study pipeline - runs every stage in order.
//!
//! matrix → weights → normalization → scoring → aggregation → dominance → sensitivity

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::domain::foundation::{Alternative, Criterion, CriterionId};

use super::{
    AggregatedResult, AggregationMethod, Aggregator, ConsistencyRatio, DecisionMatrix,
    DominanceAnalyzer, DominatedAlternative, MatrixError, NonDiscriminatingCriterion,
    NormalizationPlan, NormalizedMatrix, Normalizer, ScoredMatrix, ScoringFunction,
    ScoringFunctionSpec, SensitivityAnalyzer, SensitivityReport, TradeStudyError,
    WeightAssigner, WeightDistribution, WeightVector, WeightingError, WeightingInput,
};

/// Everything the elicitation layer hands over for one study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeStudyInput {
    pub criteria: Vec<Criterion>,
    pub alternatives: Vec<Alternative>,
    /// Raw scores per criterion, in alternative order.
    pub scores: HashMap<CriterionId, Vec<f64>>,
    pub weighting: WeightingInput,
    #[serde(default)]
    pub normalization: NormalizationPlan,
    /// Criteria without an entry are scored linearly.
    #[serde(default)]
    pub scoring: HashMap<CriterionId, ScoringFunctionSpec>,
    #[serde(default)]
    pub aggregation: AggregationMethod,
    /// Monte Carlo distributions per criterion.
    #[serde(default)]
    pub distributions: HashMap<CriterionId, WeightDistribution>,
}

impl TradeStudyInput {
    /// Assembles the decision matrix.
    ///
    /// # Errors
    /// `ShapeMismatch` if a score row does not have one value per alternative,
    /// plus every `DecisionMatrixBuilder::build` failure.
    pub fn decision_matrix(&self) -> Result<DecisionMatrix, MatrixError> {
        let mut builder = DecisionMatrix::builder()
            .criteria(self.criteria.clone())
            .alternatives(self.alternatives.clone());

        let mut ids: Vec<&CriterionId> = self.scores.keys().collect();
        ids.sort();
        for id in ids {
            let values = &self.scores[id];
            if values.len() != self.alternatives.len() {
                return Err(MatrixError::ShapeMismatch {
                    expected_rows: self.criteria.len(),
                    expected_columns: self.alternatives.len(),
                });
            }
            builder = builder.row(id.clone(), values);
        }

        builder.build()
    }
}

/// Output of a full study run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeStudyOutcome {
    pub weights: WeightVector,
    /// Present for AHP weighting.
    pub consistency: Option<ConsistencyRatio>,
    /// True when the consistency ratio exceeds the configured threshold.
    pub consistency_warning: bool,
    pub normalized: NormalizedMatrix,
    pub scored: ScoredMatrix,
    pub result: AggregatedResult,
    pub dominated: Vec<DominatedAlternative>,
    pub non_discriminating: Vec<NonDiscriminatingCriterion>,
    pub sensitivity: SensitivityReport,
}

/// Runs trade studies under one engine configuration.
#[derive(Debug, Clone, Default)]
pub struct TradeStudy {
    config: EngineConfig,
}

impl TradeStudy {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs every stage. Identical input and configuration give identical output.
    ///
    /// A consistency ratio above the threshold is logged and flagged, never rejected.
    pub fn run(&self, input: &TradeStudyInput) -> Result<TradeStudyOutcome, TradeStudyError> {
        let matrix = input.decision_matrix()?;

        let assignment = WeightAssigner::assign(&input.weighting)?;
        let weights = assignment.weights;
        let sum = weights.sum();
        if (sum - 1.0).abs() > self.config.weight_tolerance {
            return Err(WeightingError::NotNormalized { sum }.into());
        }

        let consistency_warning = match assignment.consistency {
            Some(cr) if !cr.is_acceptable(self.config.consistency_threshold) => {
                warn!(
                    consistency_ratio = cr.ratio,
                    threshold = self.config.consistency_threshold,
                    "Pairwise comparisons are inconsistent"
                );
                true
            }
            _ => false,
        };

        let normalized = Normalizer::normalize_with_plan(&matrix, &input.normalization)?;
        let scored = ScoringFunction::score(&normalized, &input.scoring)?;
        let result = Aggregator::aggregate(&scored, &weights, input.aggregation)?;

        let dominated = DominanceAnalyzer::find_dominated(&scored);
        let non_discriminating = DominanceAnalyzer::find_non_discriminating(&matrix);

        let mut sensitivity_config = self.config.sensitivity_config();
        sensitivity_config.monte_carlo.distributions = input.distributions.clone();
        let sensitivity =
            SensitivityAnalyzer::analyze(&scored, &weights, input.aggregation, &sensitivity_config)?;

        debug!(
            criteria = matrix.criterion_count(),
            alternatives = matrix.alternative_count(),
            method = %input.aggregation,
            winner = result.winner().map(|w| w.alternative_id.as_str()).unwrap_or_default(),
            dominated = dominated.len(),
            "Trade study complete"
        );

        Ok(TradeStudyOutcome {
            weights,
            consistency: assignment.consistency,
            consistency_warning,
            normalized,
            scored,
            result,
            dominated,
            non_discriminating,
            sensitivity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade_study::{CriterionWeight, NormalizationError, NormalizationMethod};

    fn config() -> EngineConfig {
        EngineConfig {
            monte_carlo_samples: 200,
            ..EngineConfig::default()
        }
    }

    fn input() -> TradeStudyInput {
        TradeStudyInput {
            criteria: vec![
                Criterion::minimize("cost", "Cost"),
                Criterion::maximize("performance", "Performance"),
            ],
            alternatives: vec![Alternative::new("a1", "A1"), Alternative::new("a2", "A2")],
            scores: HashMap::from([
                ("cost".into(), vec![100.0, 200.0]),
                ("performance".into(), vec![60.0, 80.0]),
            ]),
            weighting: WeightingInput::Direct {
                weights: vec![
                    CriterionWeight::new("cost", 0.7),
                    CriterionWeight::new("performance", 0.3),
                ],
            },
            normalization: NormalizationPlan::default(),
            scoring: HashMap::new(),
            aggregation: AggregationMethod::WeightedSum,
            distributions: HashMap::new(),
        }
    }

    #[test]
    fn run_ranks_cheaper_alternative_first() {
        let outcome = TradeStudy::new(config()).run(&input()).unwrap();

        assert_eq!(outcome.result.winner().unwrap().alternative_id.as_str(), "a1");
        assert!(!outcome.consistency_warning);
        assert!(outcome.consistency.is_none());
        assert!(outcome.dominated.is_empty());
        assert_eq!(outcome.sensitivity.monte_carlo.samples, 200);
    }

    #[test]
    fn run_is_deterministic() {
        let study = TradeStudy::new(config());
        assert_eq!(study.run(&input()).unwrap(), study.run(&input()).unwrap());
    }

    #[test]
    fn short_score_rows_are_rejected() {
        let mut input = input();
        input.scores.insert("cost".into(), vec![100.0]);
        let err = TradeStudy::new(config()).run(&input).unwrap_err();
        assert!(matches!(
            err,
            TradeStudyError::Matrix(MatrixError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn stage_errors_propagate_unchanged() {
        let mut input = input();
        input.normalization =
            NormalizationPlan::default().with_override("cost", NormalizationMethod::Logarithmic);
        input.scores.insert("cost".into(), vec![0.0, 200.0]);

        let err = TradeStudy::new(config()).run(&input).unwrap_err();
        assert!(matches!(
            err,
            TradeStudyError::Normalization(NormalizationError::NonPositiveValue { .. })
        ));
    }

    #[test]
    fn input_deserializes_from_json() {
        let json = r#"{
            "criteria": [
                {"id": "cost", "name": "Cost", "direction": "minimize"},
                {"id": "speed", "name": "Speed"}
            ],
            "alternatives": [{"id": "x", "name": "X"}, {"id": "y", "name": "Y"}],
            "scores": {"cost": [10, 20], "speed": [5, 3]},
            "weighting": {"method": "rank_order_centroid", "ranking": ["cost", "speed"]},
            "aggregation": "topsis"
        }"#;

        let input: TradeStudyInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.aggregation, AggregationMethod::Topsis);

        let outcome = TradeStudy::new(config()).run(&input).unwrap();
        assert_eq!(outcome.result.winner().unwrap().alternative_id.as_str(), "x");
    }
}
