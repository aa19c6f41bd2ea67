//! Ebisu Bayesian half-life strategy.
//!
//! Recall of a card `Δt` hours after its last review is modelled as
//! `p^(Δt / h)` where `p ~ Beta(alpha, beta)` is recall at the half-life `h`.
//! Each answer performs a noisy-binary posterior update, then moves the model
//! to the time at which the posterior mean equals the target recall.

use super::math::{ln_beta, signed_log_sum_exp, solve_decreasing};
use super::{elapsed_hours, mismatch, shift_millis, ScheduledReview, SchedulingStrategy, TieBreak};
use crate::error::{Result, SrsError};
use crate::knobs::EbisuKnobs;
use crate::mapper::correctness_to_success;
use crate::types::{Algorithm, Card, EbisuState, ReviewInput, ReviewSnapshot, SchedulingState};
use chrono::{DateTime, Utc};

/// Elapsed time used when a card is answered again without time passing,
/// including its very first answer.
pub const MIN_ELAPSED_HOURS: f64 = 0.1;

/// Ebisu algorithm with configurable parameters.
#[derive(Debug, Clone)]
pub struct Ebisu {
    knobs: EbisuKnobs,
}

impl Default for Ebisu {
    fn default() -> Self {
        Self {
            knobs: EbisuKnobs::default(),
        }
    }
}

impl SchedulingStrategy for Ebisu {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Ebisu
    }

    fn map_correctness(&self, correctness: f64) -> Result<ReviewInput> {
        correctness_to_success(correctness).map(ReviewInput::Success)
    }

    fn initialize(&self, input: ReviewInput, _now: DateTime<Utc>) -> Result<ScheduledReview> {
        let success = Self::success(input)?;
        let prior = self.prior();
        let recall = Self::predict_recall(&prior, 0.0);
        let posterior = self.update_model(&prior, success, 0.0)?;
        Ok(Self::scheduled(posterior, recall))
    }

    fn update(
        &self,
        card: &Card,
        input: ReviewInput,
        now: DateTime<Utc>,
    ) -> Result<ScheduledReview> {
        let success = Self::success(input)?;
        let model = Self::model(card)?;
        let elapsed = elapsed_hours(card.last_review, now);
        let recall = Self::predict_recall(model, elapsed);
        let posterior = self.update_model(model, success, elapsed)?;
        Ok(Self::scheduled(posterior, recall))
    }

    fn is_due(&self, card: &Card, now: DateTime<Utc>) -> Result<bool> {
        Ok(self.recall_at(card, now)? <= self.knobs.recall_threshold)
    }

    fn ordering_key(&self, card: &Card, now: DateTime<Utc>) -> Result<f64> {
        self.recall_at(card, now)
    }

    fn tie_break(&self) -> TieBreak {
        TieBreak::Key
    }

    fn recall_probability(&self, card: &Card, now: DateTime<Utc>) -> Result<f64> {
        self.recall_at(card, now)
    }

    fn due_at(&self, card: &Card) -> Result<DateTime<Utc>> {
        let hours = self.hours_until_recall(Self::model(card)?, self.knobs.recall_threshold)?;
        // Round up so the card is due at the returned instant.
        shift_millis(card.last_review, (hours * 3_600_000.0).ceil())
    }

    fn persists_due(&self) -> bool {
        false
    }
}

impl Ebisu {
    pub fn new(knobs: EbisuKnobs) -> Result<Self> {
        knobs.validate()?;
        Ok(Self { knobs })
    }

    pub fn knobs(&self) -> &EbisuKnobs {
        &self.knobs
    }

    /// Model of a card that has never been reviewed.
    pub fn prior(&self) -> EbisuState {
        EbisuState {
            alpha: self.knobs.prior_strength,
            beta: self.knobs.prior_strength,
            half_life: self.knobs.default_half_life_hours,
            total_reviews: 0,
        }
    }

    /// Expected recall `elapsed_hours` after the last review.
    ///
    /// `E[p^δ] = B(α + δ, β) / B(α, β)` with `δ = elapsed / half_life`.
    pub fn predict_recall(model: &EbisuState, elapsed_hours: f64) -> f64 {
        let delta = elapsed_hours.max(0.0) / model.half_life;
        (ln_beta(model.alpha + delta, model.beta) - ln_beta(model.alpha, model.beta)).exp()
    }

    /// Predicted recall of a card at `now`.
    pub fn recall_at(&self, card: &Card, now: DateTime<Utc>) -> Result<f64> {
        let model = Self::model(card)?;
        Ok(Self::predict_recall(model, elapsed_hours(card.last_review, now)))
    }

    /// Hours after the last review at which predicted recall falls to `recall`.
    pub fn hours_until_recall(&self, model: &EbisuState, recall: f64) -> Result<f64> {
        solve_decreasing(
            |hours| Self::predict_recall(model, hours),
            recall,
            model.half_life,
        )
    }

    /// Posterior model after observing `success` `elapsed_hours` after the
    /// last review, re-fitted so recall at the new half-life is the target.
    pub fn update_model(
        &self,
        model: &EbisuState,
        success: f64,
        elapsed_hours: f64,
    ) -> Result<EbisuState> {
        let (alpha, beta) = (model.alpha, model.beta);
        let t_now = elapsed_hours.max(MIN_ELAPSED_HOURS);
        let dt = t_now / model.half_life;

        let passed = success > 0.5;
        let q1 = if passed { success } else { 1.0 - success };
        let q0 = 1.0 - q1;
        let (c, d) = if passed {
            (q1 - q0, q0)
        } else {
            (q0 - q1, 1.0 - q0)
        };

        let ln_evidence = signed_log_sum_exp(&[
            (c, ln_beta(alpha + dt, beta)),
            (d, ln_beta(alpha, beta)),
        ])
        .ok_or_else(|| SrsError::Numeric("posterior has no mass".to_string()))?;

        // N-th posterior moment of recall at `et * t_now` hours.
        let moment = |n: f64, et: f64| -> f64 {
            let shift = n * dt * et;
            signed_log_sum_exp(&[
                (c, ln_beta(alpha + dt + shift, beta)),
                (d, ln_beta(alpha + shift, beta)),
            ])
            .map(|ln| (ln - ln_evidence).exp())
            .unwrap_or(f64::NAN)
        };

        let et = solve_decreasing(|et| moment(1.0, et), self.knobs.target_recall, 1.0 / dt)?;
        let mean = moment(1.0, et);
        let variance = moment(2.0, et) - mean * mean;
        let (new_alpha, new_beta) = mean_var_to_beta(mean, variance)?;
        let half_life = et * t_now;

        tracing::debug!(
            success,
            elapsed_hours,
            previous_half_life = model.half_life,
            half_life,
            alpha = new_alpha,
            beta = new_beta,
            "ebisu review"
        );

        Ok(EbisuState {
            alpha: new_alpha,
            beta: new_beta,
            half_life,
            total_reviews: model.total_reviews + 1,
        })
    }

    fn model(card: &Card) -> Result<&EbisuState> {
        card.state
            .as_ebisu()
            .ok_or_else(|| mismatch(card, Algorithm::Ebisu))
    }

    fn success(input: ReviewInput) -> Result<f64> {
        match input {
            ReviewInput::Success(success) if (0.0..=1.0).contains(&success) => Ok(success),
            ReviewInput::Success(success) => Err(SrsError::invalid(format!(
                "success must be within [0, 1], got {success}"
            ))),
            ReviewInput::Rating(_) => Err(SrsError::invalid(
                "ebisu expects a success value, not a rating",
            )),
        }
    }

    fn scheduled(state: EbisuState, recall_probability: f64) -> ScheduledReview {
        let snapshot = ReviewSnapshot::Ebisu {
            recall_probability,
            alpha: state.alpha,
            beta: state.beta,
            half_life: state.half_life,
        };
        ScheduledReview {
            state: SchedulingState::Ebisu(state),
            snapshot,
        }
    }
}

/// Beta parameters with the given mean and variance.
fn mean_var_to_beta(mean: f64, variance: f64) -> Result<(f64, f64)> {
    if !(mean > 0.0 && mean < 1.0 && variance > 0.0) {
        return Err(SrsError::Numeric(format!(
            "cannot fit beta to mean {mean} and variance {variance}"
        )));
    }
    let strength = mean * (1.0 - mean) / variance - 1.0;
    if !(strength > 0.0 && strength.is_finite()) {
        return Err(SrsError::Numeric(format!(
            "cannot fit beta to mean {mean} and variance {variance}"
        )));
    }
    Ok((mean * strength, (1.0 - mean) * strength))
}
