//! Risk bucketing
//!
//! Fixed half-open thresholds over the rounded probability:
//! `[0, 0.3)` Low, `[0.3, 0.5)` Moderate, `[0.5, 0.7)` High, `[0.7, 1]` Very High.

use serde::{Deserialize, Serialize};

/// Lower bound of Moderate
pub const MODERATE_THRESHOLD: f64 = 0.3;
/// Lower bound of High
pub const HIGH_THRESHOLD: f64 = 0.5;
/// Lower bound of Very High
pub const VERY_HIGH_THRESHOLD: f64 = 0.7;

/// Ordinal risk label
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Moderate,
        RiskLevel::High,
        RiskLevel::VeryHigh,
    ];

    /// Boundary values belong to the upper bucket.
    pub fn from_probability(probability: f64) -> Self {
        if probability < MODERATE_THRESHOLD {
            RiskLevel::Low
        } else if probability < HIGH_THRESHOLD {
            RiskLevel::Moderate
        } else if probability < VERY_HIGH_THRESHOLD {
            RiskLevel::High
        } else {
            RiskLevel::VeryHigh
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
            RiskLevel::VeryHigh => "Very High",
        }
    }

    /// Position in `ALL`
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Round to 2 decimal places, half away from zero
pub fn round_probability(probability: f64) -> f64 {
    (probability * 100.0).round() / 100.0
}
