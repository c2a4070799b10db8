//! Domain layer containing the decision analysis logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `trade_study` - Pure numeric engine (weighting, normalization, scoring,
//!   aggregation, sensitivity)

pub mod foundation;
pub mod trade_study;
