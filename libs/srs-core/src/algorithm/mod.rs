//! Scheduling strategy implementations.

pub mod ebisu;
pub mod fsrs;
pub mod math;

use crate::error::{Result, SrsError};
use crate::knobs::StrategyConfig;
use crate::types::{Algorithm, Card, ReviewInput, ReviewSnapshot, SchedulingState};
use chrono::{DateTime, Utc};

/// Result of applying one answer to a card.
#[derive(Debug, Clone)]
pub struct ScheduledReview {
    pub state: SchedulingState,
    pub snapshot: ReviewSnapshot,
}

/// How cards with equal ordering keys are ordered by `next`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
    /// Keep creation order.
    Insertion,
    /// Ascending by card key.
    Key,
}

/// Trait for spaced repetition algorithms.
pub trait SchedulingStrategy: Send + Sync + std::fmt::Debug {
    fn algorithm(&self) -> Algorithm;

    /// Validate a correctness percentage and convert it to this strategy's input.
    fn map_correctness(&self, correctness: f64) -> Result<ReviewInput>;

    /// State for a card answered for the first time.
    fn initialize(&self, input: ReviewInput, now: DateTime<Utc>) -> Result<ScheduledReview>;

    /// Fold an answer into an existing card.
    fn update(&self, card: &Card, input: ReviewInput, now: DateTime<Utc>)
        -> Result<ScheduledReview>;

    fn is_due(&self, card: &Card, now: DateTime<Utc>) -> Result<bool>;

    /// Sort key for due cards; smaller comes first.
    fn ordering_key(&self, card: &Card, now: DateTime<Utc>) -> Result<f64>;

    fn tie_break(&self) -> TieBreak;

    /// Probability of recalling the card at `now`.
    fn recall_probability(&self, card: &Card, now: DateTime<Utc>) -> Result<f64>;

    /// Moment the card becomes due.
    fn due_at(&self, card: &Card) -> Result<DateTime<Utc>>;

    /// Whether the due timestamp is persisted with the card, so the store can
    /// answer `min_due` directly.
    fn persists_due(&self) -> bool;
}

/// Build the strategy selected by `config`.
pub fn build_strategy(config: &StrategyConfig) -> Result<Box<dyn SchedulingStrategy>> {
    let strategy: Box<dyn SchedulingStrategy> = match config {
        StrategyConfig::Fsrs(knobs) => Box::new(fsrs::Fsrs::new(knobs.clone())?),
        StrategyConfig::Ebisu(knobs) => Box::new(ebisu::Ebisu::new(knobs.clone())?),
    };
    Ok(strategy)
}

pub(crate) fn mismatch(card: &Card, expected: Algorithm) -> SrsError {
    SrsError::StateMismatch {
        key: card.key.clone(),
        expected: expected.as_str(),
    }
}

/// Fractional hours between two instants, never negative.
pub(crate) fn elapsed_hours(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let millis = to.signed_duration_since(from).num_milliseconds();
    (millis as f64 / 3_600_000.0).max(0.0)
}

/// Shift a timestamp by a fractional number of hours, rounded to the millisecond.
pub(crate) fn add_hours(at: DateTime<Utc>, hours: f64) -> Result<DateTime<Utc>> {
    shift_millis(at, (hours * 3_600_000.0).round())
}

/// Shift a timestamp by whole milliseconds, saturating at the representable range.
pub(crate) fn shift_millis(at: DateTime<Utc>, millis: f64) -> Result<DateTime<Utc>> {
    if millis.is_nan() {
        return Err(SrsError::Numeric(format!("cannot shift {at} by NaN")));
    }
    let limit = if millis < 0.0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    };
    // The float cast saturates at i64 bounds; chrono rejects anything beyond its own range.
    let shifted = chrono::TimeDelta::try_milliseconds(millis as i64)
        .and_then(|delta| at.checked_add_signed(delta));
    Ok(shifted.unwrap_or(limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knobs::{EbisuKnobs, FsrsKnobs};
    use chrono::TimeZone;

    #[test]
    fn builds_selected_strategy() {
        let fsrs = build_strategy(&StrategyConfig::Fsrs(FsrsKnobs::default())).unwrap();
        assert_eq!(fsrs.algorithm(), Algorithm::Fsrs);
        assert!(fsrs.persists_due());
        assert_eq!(fsrs.tie_break(), TieBreak::Insertion);

        let ebisu = build_strategy(&StrategyConfig::Ebisu(EbisuKnobs::default())).unwrap();
        assert_eq!(ebisu.algorithm(), Algorithm::Ebisu);
        assert!(!ebisu.persists_due());
        assert_eq!(ebisu.tie_break(), TieBreak::Key);
    }

    #[test]
    fn invalid_knobs_fail_construction() {
        let config = StrategyConfig::Fsrs(FsrsKnobs::with_thresholds(90.0, 50.0, 10.0));
        assert!(build_strategy(&config).is_err());
    }

    #[test]
    fn hour_arithmetic() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let t1 = add_hours(t0, 1.5).unwrap();
        assert_eq!(t1, Utc.with_ymd_and_hms(2024, 1, 1, 11, 30, 0).unwrap());
        assert_eq!(elapsed_hours(t0, t1), 1.5);
        assert_eq!(elapsed_hours(t1, t0), 0.0);
    }

    #[test]
    fn shifts_saturate_instead_of_overflowing() {
        let near_end = DateTime::<Utc>::MAX_UTC - chrono::Duration::days(1);
        assert_eq!(add_hours(near_end, 48.0).unwrap(), DateTime::<Utc>::MAX_UTC);
        assert_eq!(add_hours(near_end, f64::INFINITY).unwrap(), DateTime::<Utc>::MAX_UTC);
        assert_eq!(shift_millis(near_end, 1e300).unwrap(), DateTime::<Utc>::MAX_UTC);

        let near_start = DateTime::<Utc>::MIN_UTC + chrono::Duration::days(1);
        assert_eq!(add_hours(near_start, -48.0).unwrap(), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn nan_shift_is_a_numeric_error() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert!(matches!(add_hours(t0, f64::NAN), Err(SrsError::Numeric(_))));
    }
}
