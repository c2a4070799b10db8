//! Criterion and alternative value objects.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{AlternativeId, CriterionId};

/// Whether higher or lower raw values are preferred for a criterion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Maximize,
    Minimize,
}

impl Direction {
    /// Returns true if lower raw values are better.
    pub fn is_minimize(&self) -> bool {
        matches!(self, Direction::Minimize)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Maximize => "maximize",
            Direction::Minimize => "minimize",
        };
        write!(f, "{}", s)
    }
}

/// An evaluation criterion. Immutable once the evaluation set is fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: CriterionId,
    pub name: String,
    #[serde(default)]
    pub direction: Direction,
}

impl Criterion {
    /// Creates a criterion where higher values are better.
    pub fn maximize(id: impl Into<CriterionId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            direction: Direction::Maximize,
        }
    }

    /// Creates a criterion where lower values are better.
    pub fn minimize(id: impl Into<CriterionId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            direction: Direction::Minimize,
        }
    }
}

/// A candidate alternative under evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternative {
    pub id: AlternativeId,
    pub name: String,
}

impl Alternative {
    /// Creates a new alternative.
    pub fn new(id: impl Into<AlternativeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_defaults_to_maximize() {
        assert_eq!(Direction::default(), Direction::Maximize);
        assert!(!Direction::Maximize.is_minimize());
        assert!(Direction::Minimize.is_minimize());
    }

    #[test]
    fn criterion_constructors_set_direction() {
        assert_eq!(Criterion::minimize("cost", "Cost").direction, Direction::Minimize);
        assert_eq!(
            Criterion::maximize("perf", "Performance").direction,
            Direction::Maximize
        );
    }

    #[test]
    fn criterion_deserializes_with_default_direction() {
        let json = r#"{"id": "perf", "name": "Performance"}"#;
        let criterion: Criterion = serde_json::from_str(json).unwrap();
        assert_eq!(criterion.direction, Direction::Maximize);

        let json = r#"{"id": "cost", "name": "Cost", "direction": "minimize"}"#;
        let criterion: Criterion = serde_json::from_str(json).unwrap();
        assert_eq!(criterion.direction, Direction::Minimize);
    }

    #[test]
    fn direction_displays_lowercase() {
        assert_eq!(format!("{}", Direction::Minimize), "minimize");
    }
}
