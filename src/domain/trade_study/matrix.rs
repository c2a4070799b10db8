//! Decision matrix - raw scores of every alternative against every criterion.
//!
//! Also defines [`ScoreTable`], the dense criterion × alternative grid shared by
//! the normalized and scored matrices produced further down the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::domain::foundation::{Alternative, AlternativeId, Criterion, CriterionId};

use super::MatrixError;

/// Raw scores keyed by criterion (rows) and alternative (columns).
///
/// Invariant: every (criterion, alternative) cell holds a finite value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionMatrix {
    criteria: Vec<Criterion>,
    alternatives: Vec<Alternative>,
    values: Vec<Vec<f64>>,
}

impl DecisionMatrix {
    /// Creates a builder for constructing a decision matrix.
    pub fn builder() -> DecisionMatrixBuilder {
        DecisionMatrixBuilder::new()
    }

    /// Criteria in row order.
    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    /// Alternatives in column order.
    pub fn alternatives(&self) -> &[Alternative] {
        &self.alternatives
    }

    pub fn criterion_ids(&self) -> Vec<CriterionId> {
        self.criteria.iter().map(|c| c.id.clone()).collect()
    }

    pub fn alternative_ids(&self) -> Vec<AlternativeId> {
        self.alternatives.iter().map(|a| a.id.clone()).collect()
    }

    /// Returns the raw values of the criterion at `index`, one per alternative.
    pub fn row(&self, index: usize) -> &[f64] {
        &self.values[index]
    }

    /// Gets a raw score by criterion and alternative IDs.
    pub fn value(&self, criterion_id: &CriterionId, alternative_id: &AlternativeId) -> Option<f64> {
        let row = self.criteria.iter().position(|c| &c.id == criterion_id)?;
        let col = self.alternatives.iter().position(|a| &a.id == alternative_id)?;
        Some(self.values[row][col])
    }

    pub fn criterion_count(&self) -> usize {
        self.criteria.len()
    }

    pub fn alternative_count(&self) -> usize {
        self.alternatives.len()
    }
}

/// Builder for constructing DecisionMatrix instances.
///
/// Cells may be supplied in any order. `build` rejects incomplete matrices
/// unless a default score was configured.
#[derive(Debug, Default)]
pub struct DecisionMatrixBuilder {
    criteria: Vec<Criterion>,
    alternatives: Vec<Alternative>,
    cells: HashMap<(CriterionId, AlternativeId), f64>,
    default_score: Option<f64>,
}

impl DecisionMatrixBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a criterion (a row).
    pub fn criterion(mut self, criterion: Criterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    /// Sets all criteria at once.
    pub fn criteria(mut self, criteria: Vec<Criterion>) -> Self {
        self.criteria = criteria;
        self
    }

    /// Adds an alternative (a column).
    pub fn alternative(mut self, alternative: Alternative) -> Self {
        self.alternatives.push(alternative);
        self
    }

    /// Sets all alternatives at once.
    pub fn alternatives(mut self, alternatives: Vec<Alternative>) -> Self {
        self.alternatives = alternatives;
        self
    }

    /// Records the raw score of an alternative on a criterion.
    pub fn score(
        mut self,
        criterion_id: impl Into<CriterionId>,
        alternative_id: impl Into<AlternativeId>,
        value: f64,
    ) -> Self {
        self.cells
            .insert((criterion_id.into(), alternative_id.into()), value);
        self
    }

    /// Records a full row of scores, one per alternative in column order.
    pub fn row(mut self, criterion_id: impl Into<CriterionId>, values: &[f64]) -> Self {
        let criterion_id = criterion_id.into();
        for (alternative, value) in self.alternatives.iter().zip(values) {
            self.cells
                .insert((criterion_id.clone(), alternative.id.clone()), *value);
        }
        self
    }

    /// Fills cells that were never scored with `value` instead of failing.
    pub fn default_score(mut self, value: f64) -> Self {
        self.default_score = Some(value);
        self
    }

    /// Builds the decision matrix.
    ///
    /// # Errors
    /// - `Empty` when there are no criteria or no alternatives
    /// - `DuplicateCriterion` / `DuplicateAlternative` for repeated IDs
    /// - `UnknownCriterion` / `UnknownAlternative` for cells outside the matrix
    /// - `MissingCell` when a cell was never scored and no default is set
    /// - `NonFiniteValue` for NaN or infinite scores
    pub fn build(mut self) -> Result<DecisionMatrix, MatrixError> {
        if self.criteria.is_empty() || self.alternatives.is_empty() {
            return Err(MatrixError::Empty);
        }

        let mut seen = HashSet::new();
        for criterion in &self.criteria {
            if !seen.insert(&criterion.id) {
                return Err(MatrixError::DuplicateCriterion(criterion.id.clone()));
            }
        }
        let mut seen = HashSet::new();
        for alternative in &self.alternatives {
            if !seen.insert(&alternative.id) {
                return Err(MatrixError::DuplicateAlternative(alternative.id.clone()));
            }
        }

        // Report stray cells deterministically
        let mut stray: Vec<_> = self
            .cells
            .keys()
            .filter(|(c, a)| {
                !self.criteria.iter().any(|x| &x.id == c)
                    || !self.alternatives.iter().any(|x| &x.id == a)
            })
            .cloned()
            .collect();
        stray.sort();
        if let Some((c, a)) = stray.into_iter().next() {
            if !self.criteria.iter().any(|x| x.id == c) {
                return Err(MatrixError::UnknownCriterion(c));
            }
            return Err(MatrixError::UnknownAlternative(a));
        }

        let mut values = Vec::with_capacity(self.criteria.len());
        for criterion in &self.criteria {
            let mut row = Vec::with_capacity(self.alternatives.len());
            for alternative in &self.alternatives {
                let key = (criterion.id.clone(), alternative.id.clone());
                let value = match self.cells.remove(&key).or(self.default_score) {
                    Some(v) => v,
                    None => {
                        return Err(MatrixError::MissingCell {
                            criterion_id: criterion.id.clone(),
                            alternative_id: alternative.id.clone(),
                        })
                    }
                };
                if !value.is_finite() {
                    return Err(MatrixError::NonFiniteValue {
                        criterion_id: criterion.id.clone(),
                        alternative_id: alternative.id.clone(),
                    });
                }
                row.push(value);
            }
            values.push(row);
        }

        Ok(DecisionMatrix {
            criteria: self.criteria,
            alternatives: self.alternatives,
            values,
        })
    }
}

/// Dense grid of derived values: one row per criterion, one column per alternative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTable {
    criterion_ids: Vec<CriterionId>,
    alternative_ids: Vec<AlternativeId>,
    rows: Vec<Vec<f64>>,
}

impl ScoreTable {
    /// Creates a table from explicit rows, validating shape and values.
    pub fn from_rows(
        criterion_ids: Vec<CriterionId>,
        alternative_ids: Vec<AlternativeId>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, MatrixError> {
        if criterion_ids.is_empty() || alternative_ids.is_empty() {
            return Err(MatrixError::Empty);
        }
        if rows.len() != criterion_ids.len()
            || rows.iter().any(|row| row.len() != alternative_ids.len())
        {
            return Err(MatrixError::ShapeMismatch {
                expected_rows: criterion_ids.len(),
                expected_columns: alternative_ids.len(),
            });
        }

        let mut seen = HashSet::new();
        if let Some(dup) = criterion_ids.iter().find(|id| !seen.insert(*id)) {
            return Err(MatrixError::DuplicateCriterion(dup.clone()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = alternative_ids.iter().find(|id| !seen.insert(*id)) {
            return Err(MatrixError::DuplicateAlternative(dup.clone()));
        }

        for (r, row) in rows.iter().enumerate() {
            if let Some(c) = row.iter().position(|v| !v.is_finite()) {
                return Err(MatrixError::NonFiniteValue {
                    criterion_id: criterion_ids[r].clone(),
                    alternative_id: alternative_ids[c].clone(),
                });
            }
        }

        Ok(Self {
            criterion_ids,
            alternative_ids,
            rows,
        })
    }

    /// Builds a table that shares the shape of `matrix`. Rows are trusted.
    pub(crate) fn with_shape_of(matrix: &DecisionMatrix, rows: Vec<Vec<f64>>) -> Self {
        Self {
            criterion_ids: matrix.criterion_ids(),
            alternative_ids: matrix.alternative_ids(),
            rows,
        }
    }

    /// Same shape as `self` with new row values. Rows are trusted.
    pub(crate) fn with_rows(&self, rows: Vec<Vec<f64>>) -> Self {
        Self {
            criterion_ids: self.criterion_ids.clone(),
            alternative_ids: self.alternative_ids.clone(),
            rows,
        }
    }

    pub fn criterion_ids(&self) -> &[CriterionId] {
        &self.criterion_ids
    }

    pub fn alternative_ids(&self) -> &[AlternativeId] {
        &self.alternative_ids
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> &[f64] {
        &self.rows[index]
    }

    /// Returns the values of a single alternative across all criteria.
    pub fn column(&self, index: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[index]).collect()
    }

    pub fn criterion_index(&self, id: &CriterionId) -> Option<usize> {
        self.criterion_ids.iter().position(|c| c == id)
    }

    pub fn alternative_index(&self, id: &AlternativeId) -> Option<usize> {
        self.alternative_ids.iter().position(|a| a == id)
    }

    /// Gets a value by criterion and alternative IDs.
    pub fn value(&self, criterion_id: &CriterionId, alternative_id: &AlternativeId) -> Option<f64> {
        let r = self.criterion_index(criterion_id)?;
        let c = self.alternative_index(alternative_id)?;
        Some(self.rows[r][c])
    }

    pub fn criterion_count(&self) -> usize {
        self.criterion_ids.len()
    }

    pub fn alternative_count(&self) -> usize {
        self.alternative_ids.len()
    }
}

/// Decision matrix after normalization; higher always means better.
///
/// Values lie in [0, 1] except for criteria listed as unbounded (z-score).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMatrix {
    table: ScoreTable,
    unbounded: Vec<CriterionId>,
}

impl NormalizedMatrix {
    pub(crate) fn new(table: ScoreTable, unbounded: Vec<CriterionId>) -> Self {
        Self { table, unbounded }
    }

    /// Creates a normalized matrix from already-normalized rows.
    pub fn from_rows(
        criterion_ids: Vec<CriterionId>,
        alternative_ids: Vec<AlternativeId>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, MatrixError> {
        Ok(Self::new(
            ScoreTable::from_rows(criterion_ids, alternative_ids, rows)?,
            Vec::new(),
        ))
    }

    pub fn table(&self) -> &ScoreTable {
        &self.table
    }

    /// Criteria whose values are not confined to [0, 1].
    pub fn unbounded_criteria(&self) -> &[CriterionId] {
        &self.unbounded
    }

    pub fn is_unbounded(&self, criterion_id: &CriterionId) -> bool {
        self.unbounded.contains(criterion_id)
    }

    pub fn value(&self, criterion_id: &CriterionId, alternative_id: &AlternativeId) -> Option<f64> {
        self.table.value(criterion_id, alternative_id)
    }
}

/// Normalized matrix after the scoring-function transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoredMatrix {
    table: ScoreTable,
}

impl ScoredMatrix {
    pub(crate) fn new(table: ScoreTable) -> Self {
        Self { table }
    }

    /// Creates a scored matrix from explicit rows (one per criterion).
    pub fn from_rows(
        criterion_ids: Vec<CriterionId>,
        alternative_ids: Vec<AlternativeId>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, MatrixError> {
        Ok(Self::new(ScoreTable::from_rows(
            criterion_ids,
            alternative_ids,
            rows,
        )?))
    }

    pub fn table(&self) -> &ScoreTable {
        &self.table
    }

    pub fn value(&self, criterion_id: &CriterionId, alternative_id: &AlternativeId) -> Option<f64> {
        self.table.value(criterion_id, alternative_id)
    }

    /// Returns a copy with one cell replaced.
    pub fn with_value(
        &self,
        criterion_id: &CriterionId,
        alternative_id: &AlternativeId,
        value: f64,
    ) -> Result<Self, MatrixError> {
        let r = self
            .table
            .criterion_index(criterion_id)
            .ok_or_else(|| MatrixError::UnknownCriterion(criterion_id.clone()))?;
        let c = self
            .table
            .alternative_index(alternative_id)
            .ok_or_else(|| MatrixError::UnknownAlternative(alternative_id.clone()))?;
        if !value.is_finite() {
            return Err(MatrixError::NonFiniteValue {
                criterion_id: criterion_id.clone(),
                alternative_id: alternative_id.clone(),
            });
        }
        let mut rows = self.table.rows().to_vec();
        rows[r][c] = value;
        Ok(Self::new(self.table.with_rows(rows)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> DecisionMatrixBuilder {
        DecisionMatrix::builder()
            .criterion(Criterion::minimize("cost", "Cost"))
            .criterion(Criterion::maximize("perf", "Performance"))
            .alternative(Alternative::new("a", "Option A"))
            .alternative(Alternative::new("b", "Option B"))
    }

    #[test]
    fn builder_creates_complete_matrix() {
        let matrix = two_by_two()
            .score("cost", "a", 100.0)
            .score("cost", "b", 200.0)
            .score("perf", "a", 80.0)
            .score("perf", "b", 60.0)
            .build()
            .unwrap();

        assert_eq!(matrix.criterion_count(), 2);
        assert_eq!(matrix.alternative_count(), 2);
        assert_eq!(matrix.value(&"cost".into(), &"b".into()), Some(200.0));
        assert_eq!(matrix.row(1), &[80.0, 60.0]);
    }

    #[test]
    fn builder_accepts_rows() {
        let matrix = two_by_two()
            .row("cost", &[100.0, 200.0])
            .row("perf", &[80.0, 60.0])
            .build()
            .unwrap();

        assert_eq!(matrix.value(&"perf".into(), &"a".into()), Some(80.0));
    }

    #[test]
    fn builder_rejects_missing_cells() {
        let result = two_by_two()
            .score("cost", "a", 100.0)
            .score("cost", "b", 200.0)
            .score("perf", "a", 80.0)
            .build();

        assert_eq!(
            result.unwrap_err(),
            MatrixError::MissingCell {
                criterion_id: "perf".into(),
                alternative_id: "b".into(),
            }
        );
    }

    #[test]
    fn builder_fills_missing_cells_with_default() {
        let matrix = two_by_two()
            .score("cost", "a", 100.0)
            .default_score(0.0)
            .build()
            .unwrap();

        assert_eq!(matrix.value(&"perf".into(), &"b".into()), Some(0.0));
        assert_eq!(matrix.value(&"cost".into(), &"a".into()), Some(100.0));
    }

    #[test]
    fn builder_rejects_empty_matrix() {
        let result = DecisionMatrix::builder()
            .criterion(Criterion::maximize("perf", "Performance"))
            .build();
        assert_eq!(result.unwrap_err(), MatrixError::Empty);
    }

    #[test]
    fn builder_rejects_duplicates() {
        let result = two_by_two()
            .criterion(Criterion::maximize("perf", "Again"))
            .default_score(1.0)
            .build();
        assert_eq!(result.unwrap_err(), MatrixError::DuplicateCriterion("perf".into()));

        let result = two_by_two()
            .alternative(Alternative::new("a", "Again"))
            .default_score(1.0)
            .build();
        assert_eq!(result.unwrap_err(), MatrixError::DuplicateAlternative("a".into()));
    }

    #[test]
    fn builder_rejects_unknown_ids() {
        let result = two_by_two()
            .default_score(1.0)
            .score("weight", "a", 3.0)
            .build();
        assert_eq!(result.unwrap_err(), MatrixError::UnknownCriterion("weight".into()));

        let result = two_by_two()
            .default_score(1.0)
            .score("cost", "z", 3.0)
            .build();
        assert_eq!(result.unwrap_err(), MatrixError::UnknownAlternative("z".into()));
    }

    #[test]
    fn builder_rejects_non_finite_values() {
        let result = two_by_two()
            .default_score(1.0)
            .score("perf", "b", f64::NAN)
            .build();
        assert!(matches!(result, Err(MatrixError::NonFiniteValue { .. })));
    }

    #[test]
    fn score_table_validates_shape() {
        let result = ScoreTable::from_rows(
            vec!["c1".into(), "c2".into()],
            vec!["a".into()],
            vec![vec![0.5]],
        );
        assert_eq!(
            result.unwrap_err(),
            MatrixError::ShapeMismatch {
                expected_rows: 2,
                expected_columns: 1,
            }
        );
    }

    #[test]
    fn score_table_columns_follow_alternatives() {
        let table = ScoreTable::from_rows(
            vec!["c1".into(), "c2".into()],
            vec!["a".into(), "b".into()],
            vec![vec![0.1, 0.2], vec![0.3, 0.4]],
        )
        .unwrap();

        assert_eq!(table.column(1), vec![0.2, 0.4]);
        assert_eq!(table.value(&"c2".into(), &"a".into()), Some(0.3));
        assert_eq!(table.value(&"c3".into(), &"a".into()), None);
    }

    #[test]
    fn scored_matrix_with_value_replaces_one_cell() {
        let scored = ScoredMatrix::from_rows(
            vec!["c1".into()],
            vec!["a".into(), "b".into()],
            vec![vec![0.1, 0.2]],
        )
        .unwrap();

        let updated = scored.with_value(&"c1".into(), &"b".into(), 0.9).unwrap();
        assert_eq!(updated.value(&"c1".into(), &"b".into()), Some(0.9));
        assert_eq!(scored.value(&"c1".into(), &"b".into()), Some(0.2));
    }

    #[test]
    fn decision_matrix_serializes_to_json() {
        let matrix = two_by_two().default_score(1.0).build().unwrap();
        let json = serde_json::to_string(&matrix).unwrap();
        assert!(json.contains("criteria"));
        assert!(json.contains("alternatives"));
    }
}
