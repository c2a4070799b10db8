//! Dominance Analyzer - Pareto screening and non-discriminating criteria.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AlternativeId, CriterionId};

use super::{DecisionMatrix, ScoreTable, ScoredMatrix};

/// An alternative that is dominated by another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DominatedAlternative {
    pub alternative_id: AlternativeId,
    pub dominated_by: AlternativeId,
    pub explanation: String,
}

/// A criterion on which every alternative scores the same.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonDiscriminatingCriterion {
    pub criterion_id: CriterionId,
    pub uniform_value: f64,
}

/// Dominance screening functions.
pub struct DominanceAnalyzer;

impl DominanceAnalyzer {
    /// Finds all dominated alternatives.
    ///
    /// Alternative A dominates Alternative B if:
    /// 1. A >= B on ALL criteria
    /// 2. A > B on AT LEAST ONE criterion
    ///
    /// Scores are compared after normalization, so higher is always better.
    ///
    /// # Edge Cases
    /// - Single alternative: Returns empty Vec (can't dominate self)
    /// - Ties: Neither dominates if equal on all criteria
    pub fn find_dominated(scored: &ScoredMatrix) -> Vec<DominatedAlternative> {
        let table = scored.table();
        let mut dominated = Vec::new();

        if table.alternative_count() < 2 {
            return dominated;
        }

        for candidate in 0..table.alternative_count() {
            let dominator = (0..table.alternative_count())
                .filter(|&other| other != candidate)
                .find(|&other| Self::dominates(table, other, candidate));

            if let Some(other) = dominator {
                dominated.push(DominatedAlternative {
                    alternative_id: table.alternative_ids()[candidate].clone(),
                    dominated_by: table.alternative_ids()[other].clone(),
                    explanation: Self::explain_dominance(table, other, candidate),
                });
            }
        }

        dominated
    }

    /// Checks if column `a` dominates column `b`.
    fn dominates(table: &ScoreTable, a: usize, b: usize) -> bool {
        let mut strictly_better_on_one = false;

        for row in table.rows() {
            if row[a] < row[b] {
                return false;
            }
            if row[a] > row[b] {
                strictly_better_on_one = true;
            }
        }

        strictly_better_on_one
    }

    fn explain_dominance(table: &ScoreTable, a: usize, b: usize) -> String {
        let better_on: Vec<&str> = table
            .criterion_ids()
            .iter()
            .zip(table.rows())
            .filter(|(_, row)| row[a] > row[b])
            .map(|(id, _)| id.as_str())
            .collect();

        format!(
            "{} is at least as good on all criteria and strictly better on: {}",
            table.alternative_ids()[a],
            better_on.join(", ")
        )
    }

    /// Finds criteria that don't distinguish between alternatives.
    ///
    /// A criterion is non-discriminating if every alternative has the same raw
    /// value on it. Such a criterion cannot change the ranking.
    ///
    /// # Edge Cases
    /// - Single alternative: Returns empty Vec (no comparison possible)
    pub fn find_non_discriminating(matrix: &DecisionMatrix) -> Vec<NonDiscriminatingCriterion> {
        if matrix.alternative_count() < 2 {
            return Vec::new();
        }

        matrix
            .criteria()
            .iter()
            .enumerate()
            .filter_map(|(index, criterion)| {
                let row = matrix.row(index);
                let first = *row.first()?;
                row.iter()
                    .all(|v| *v == first)
                    .then(|| NonDiscriminatingCriterion {
                        criterion_id: criterion.id.clone(),
                        uniform_value: first,
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Alternative, Criterion};

    fn scored(rows: Vec<Vec<f64>>) -> ScoredMatrix {
        let criteria = (0..rows.len()).map(|i| CriterionId::from(format!("c{}", i + 1))).collect();
        let alternatives = ["a", "b", "c"][..rows[0].len()]
            .iter()
            .map(|id| AlternativeId::from(*id))
            .collect();
        ScoredMatrix::from_rows(criteria, alternatives, rows).unwrap()
    }

    #[test]
    fn finds_dominated_alternative() {
        let matrix = scored(vec![vec![0.9, 0.5, 1.0], vec![0.8, 0.85, 0.2]]);
        assert!(DominanceAnalyzer::find_dominated(&matrix).is_empty());

        let matrix = scored(vec![vec![0.9, 0.5, 1.0], vec![0.8, 0.7, 0.2]]);
        let dominated = DominanceAnalyzer::find_dominated(&matrix);

        assert_eq!(dominated.len(), 1);
        assert_eq!(dominated[0].alternative_id.as_str(), "b");
        assert_eq!(dominated[0].dominated_by.as_str(), "a");
        assert!(dominated[0].explanation.contains("c1, c2"));
    }

    #[test]
    fn identical_alternatives_do_not_dominate() {
        let matrix = scored(vec![vec![0.5, 0.5], vec![0.3, 0.3]]);
        assert!(DominanceAnalyzer::find_dominated(&matrix).is_empty());
    }

    #[test]
    fn single_alternative_is_never_dominated() {
        let matrix = scored(vec![vec![0.5]]);
        assert!(DominanceAnalyzer::find_dominated(&matrix).is_empty());
    }

    #[test]
    fn finds_non_discriminating_criteria() {
        let matrix = DecisionMatrix::builder()
            .criterion(Criterion::minimize("cost", "Cost"))
            .criterion(Criterion::maximize("warranty", "Warranty"))
            .alternative(Alternative::new("a", "A"))
            .alternative(Alternative::new("b", "B"))
            .row("cost", &[100.0, 200.0])
            .row("warranty", &[3.0, 3.0])
            .build()
            .unwrap();

        let flat = DominanceAnalyzer::find_non_discriminating(&matrix);
        assert_eq!(
            flat,
            vec![NonDiscriminatingCriterion {
                criterion_id: "warranty".into(),
                uniform_value: 3.0,
            }]
        );
    }
}
