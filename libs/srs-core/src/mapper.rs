//! Correctness percentage to strategy input.

use crate::error::{Result, SrsError};
use crate::types::Rating;

/// Reject anything outside the closed interval [0, 100].
pub fn validate_correctness(correctness: f64) -> Result<f64> {
    if correctness.is_nan() || !(0.0..=100.0).contains(&correctness) {
        return Err(SrsError::invalid(format!(
            "correctness must be between 0 and 100, got {correctness}"
        )));
    }
    Ok(correctness)
}

/// Band a correctness value into an FSRS rating.
///
/// Each threshold opens the band above it, so a value equal to `t2`
/// rates Good rather than Hard.
pub fn correctness_to_rating(correctness: f64, thresholds: (f64, f64, f64)) -> Result<Rating> {
    let c = validate_correctness(correctness)?;
    let (t1, t2, t3) = thresholds;
    let rating = if c < t1 {
        Rating::Again
    } else if c < t2 {
        Rating::Hard
    } else if c < t3 {
        Rating::Good
    } else {
        Rating::Easy
    };
    Ok(rating)
}

/// Linear rescale to a continuous Ebisu success value.
pub fn correctness_to_success(correctness: f64) -> Result<f64> {
    Ok(validate_correctness(correctness)? / 100.0)
}
