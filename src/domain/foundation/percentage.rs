//! Whole-number percentage used for relative weight perturbations.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// A relative perturbation between 0% and 100%.
///
/// Deserialization rejects values above 100, so a swing loaded from
/// configuration is always usable as a fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Percentage(u8);

impl Percentage {
    pub const ZERO: Self = Self(0);

    /// Saturates at 100.
    pub fn new(value: u8) -> Self {
        Self(value.min(100))
    }

    /// # Errors
    /// `OutOfRange` above 100.
    pub fn try_new(value: u8) -> Result<Self, ValidationError> {
        if value > 100 {
            return Err(ValidationError::out_of_range("percentage", 0.0, 100.0, f64::from(value)));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn as_fraction(&self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// Perturbs a weight down and up by this fraction of itself.
    ///
    /// Both ends are clamped to [0, 1]; the upper end stays below 1 only
    /// while `weight·(1+p) < 1`.
    pub fn band_around(&self, weight: f64) -> (f64, f64) {
        let p = self.as_fraction();
        let low = weight - weight * p;
        let high = weight + weight * p;
        (low.clamp(0.0, 1.0), high.clamp(0.0, 1.0))
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Self::ZERO
    }
}

impl TryFrom<u8> for Percentage {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<Percentage> for u8 {
    fn from(pct: Percentage) -> Self {
        pct.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
