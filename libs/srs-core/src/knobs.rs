//! Immutable per-algorithm configuration.

use crate::error::{Result, SrsError};
use crate::types::Algorithm;
use serde::{Deserialize, Serialize};

/// Number of FSRS weights.
pub const FSRS_WEIGHT_COUNT: usize = 17;

/// FSRS v4 default weights.
pub const DEFAULT_FSRS_WEIGHTS: [f64; FSRS_WEIGHT_COUNT] = [
    0.4, 0.6, 2.4, 5.8, // w[0-3]: initial stability for Again, Hard, Good, Easy
    4.93, // w[4]: initial difficulty base
    0.94, // w[5]: initial difficulty modifier
    0.86, // w[6]: difficulty step per rating
    0.01, // w[7]: mean reversion weight
    1.49, // w[8]: stability exp base
    0.14, // w[9]: stability decay
    0.94, // w[10]: retrievability effect
    2.18, // w[11]: forget stability base
    0.05, // w[12]: difficulty on forget
    0.34, // w[13]: stability on forget
    1.26, // w[14]: retrievability on forget
    0.29, // w[15]: hard penalty
    2.61, // w[16]: easy bonus
];

/// FSRS tuning knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsrsKnobs {
    /// Ascending cut points splitting [0, 100] into Again/Hard/Good/Easy.
    pub rating_thresholds: (f64, f64, f64),
    pub w: [f64; FSRS_WEIGHT_COUNT],
    /// Retention the review interval aims for.
    pub request_retention: f64,
    /// Days.
    pub maximum_interval: f64,
}

impl Default for FsrsKnobs {
    fn default() -> Self {
        Self {
            rating_thresholds: (25.0, 50.0, 85.0),
            w: DEFAULT_FSRS_WEIGHTS,
            request_retention: 0.9,
            maximum_interval: 36500.0,
        }
    }
}

impl FsrsKnobs {
    pub fn with_thresholds(t1: f64, t2: f64, t3: f64) -> Self {
        Self {
            rating_thresholds: (t1, t2, t3),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let (t1, t2, t3) = self.rating_thresholds;
        if ![t1, t2, t3].iter().all(|t| t.is_finite() && (0.0..=100.0).contains(t)) {
            return Err(SrsError::invalid(format!(
                "rating thresholds must lie in [0, 100], got ({t1}, {t2}, {t3})"
            )));
        }
        if !(t1 < t2 && t2 < t3) {
            return Err(SrsError::invalid(format!(
                "rating thresholds must be strictly ascending, got ({t1}, {t2}, {t3})"
            )));
        }
        if let Some(i) = self.w.iter().position(|w| !w.is_finite()) {
            return Err(SrsError::invalid(format!("weight w[{i}] is not finite")));
        }
        if !(self.request_retention > 0.0 && self.request_retention < 1.0) {
            return Err(SrsError::invalid(format!(
                "request retention must be in (0, 1), got {}",
                self.request_retention
            )));
        }
        if self.maximum_interval.is_nan() || self.maximum_interval < 1.0 {
            return Err(SrsError::invalid(format!(
                "maximum interval must be at least one day, got {}",
                self.maximum_interval
            )));
        }
        Ok(())
    }
}

/// Ebisu tuning knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EbisuKnobs {
    /// Half-life assigned to a card before its first review.
    pub default_half_life_hours: f64,
    /// A card is due once predicted recall falls to this value.
    pub recall_threshold: f64,
    /// Recall the re-fitted half-life is anchored to.
    pub target_recall: f64,
    /// Initial alpha = beta of the Beta prior.
    pub prior_strength: f64,
}

impl Default for EbisuKnobs {
    fn default() -> Self {
        Self {
            default_half_life_hours: 24.0,
            recall_threshold: 0.5,
            target_recall: 0.5,
            prior_strength: 2.0,
        }
    }
}

impl EbisuKnobs {
    pub fn validate(&self) -> Result<()> {
        if !(self.default_half_life_hours.is_finite() && self.default_half_life_hours > 0.0) {
            return Err(SrsError::invalid(format!(
                "default half-life must be positive, got {}",
                self.default_half_life_hours
            )));
        }
        for (name, value) in [
            ("recall threshold", self.recall_threshold),
            ("target recall", self.target_recall),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(SrsError::invalid(format!(
                    "{name} must be in (0, 1), got {value}"
                )));
            }
        }
        if !(self.prior_strength.is_finite() && self.prior_strength > 0.0) {
            return Err(SrsError::invalid(format!(
                "prior strength must be positive, got {}",
                self.prior_strength
            )));
        }
        Ok(())
    }
}

/// Explicit algorithm selection plus its knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum StrategyConfig {
    Fsrs(FsrsKnobs),
    Ebisu(EbisuKnobs),
}

impl StrategyConfig {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Fsrs(_) => Algorithm::Fsrs,
            Self::Ebisu(_) => Algorithm::Ebisu,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Fsrs(knobs) => knobs.validate(),
            Self::Ebisu(knobs) => knobs.validate(),
        }
    }
}

impl From<Algorithm> for StrategyConfig {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Fsrs => Self::Fsrs(FsrsKnobs::default()),
            Algorithm::Ebisu => Self::Ebisu(EbisuKnobs::default()),
        }
    }
}
