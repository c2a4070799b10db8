//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types that form the
//! vocabulary of a trade study.

mod criterion;
mod errors;
mod ids;
mod percentage;

pub use criterion::{Alternative, Criterion, Direction};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{AlternativeId, CriterionId};
pub use percentage::Percentage;
