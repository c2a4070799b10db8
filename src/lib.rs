//! Trade Study - Multi-criteria decision analysis engine
//!
//! This crate weights criteria, normalizes and scores a decision matrix,
//! aggregates it into a ranking and measures how sensitive that ranking is
//! to the weights.

pub mod config;
pub mod domain;
pub mod telemetry;
