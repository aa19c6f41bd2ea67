//! FSRS (Free Spaced Repetition Scheduler) strategy.
//!
//! Modern algorithm based on memory research using DSR model:
//! - Difficulty (D): Card difficulty 1-10
//! - Stability (S): Days until retrievability drops to the requested retention
//! - Retrievability (R): Probability of recall

use super::{add_hours, elapsed_hours, mismatch, ScheduledReview, SchedulingStrategy, TieBreak};
use crate::error::{Result, SrsError};
use crate::knobs::FsrsKnobs;
use crate::mapper::correctness_to_rating;
use crate::types::{
    Algorithm, Card, CardStatus, FsrsState, Rating, ReviewInput, ReviewSnapshot, SchedulingState,
};
use chrono::{DateTime, Utc};

/// Stability never drops below this many days; it divides elapsed time.
pub const MIN_STABILITY: f64 = 0.01;
pub const MIN_DIFFICULTY: f64 = 1.0;
pub const MAX_DIFFICULTY: f64 = 10.0;

const MINUTES_PER_DAY: f64 = 1440.0;

/// FSRS algorithm with configurable parameters.
#[derive(Debug, Clone)]
pub struct Fsrs {
    knobs: FsrsKnobs,
}

impl Default for Fsrs {
    fn default() -> Self {
        Self {
            knobs: FsrsKnobs::default(),
        }
    }
}

impl SchedulingStrategy for Fsrs {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Fsrs
    }

    fn map_correctness(&self, correctness: f64) -> Result<ReviewInput> {
        correctness_to_rating(correctness, self.knobs.rating_thresholds).map(ReviewInput::Rating)
    }

    fn initialize(&self, input: ReviewInput, now: DateTime<Utc>) -> Result<ScheduledReview> {
        let rating = Self::rating(input)?;
        self.schedule_first_review(rating, now).map(Self::scheduled)
    }

    fn update(
        &self,
        card: &Card,
        input: ReviewInput,
        now: DateTime<Utc>,
    ) -> Result<ScheduledReview> {
        let rating = Self::rating(input)?;
        let state = card
            .state
            .as_fsrs()
            .ok_or_else(|| mismatch(card, Algorithm::Fsrs))?;
        let elapsed = elapsed_hours(card.last_review, now) / 24.0;
        self.schedule_subsequent_review(state, rating, elapsed, now)
            .map(Self::scheduled)
    }

    fn is_due(&self, card: &Card, now: DateTime<Utc>) -> Result<bool> {
        Ok(self.due_at(card)? <= now)
    }

    fn ordering_key(&self, card: &Card, _now: DateTime<Utc>) -> Result<f64> {
        Ok(self.due_at(card)?.timestamp_millis() as f64)
    }

    fn tie_break(&self) -> TieBreak {
        TieBreak::Insertion
    }

    fn recall_probability(&self, card: &Card, now: DateTime<Utc>) -> Result<f64> {
        let state = card
            .state
            .as_fsrs()
            .ok_or_else(|| mismatch(card, Algorithm::Fsrs))?;
        Ok(Self::retrievability(
            elapsed_hours(card.last_review, now) / 24.0,
            state.stability,
        ))
    }

    fn due_at(&self, card: &Card) -> Result<DateTime<Utc>> {
        card.state
            .stored_due()
            .ok_or_else(|| mismatch(card, Algorithm::Fsrs))
    }

    fn persists_due(&self) -> bool {
        true
    }
}

impl Fsrs {
    pub fn new(knobs: FsrsKnobs) -> Result<Self> {
        knobs.validate()?;
        Ok(Self { knobs })
    }

    pub fn knobs(&self) -> &FsrsKnobs {
        &self.knobs
    }

    fn rating(input: ReviewInput) -> Result<Rating> {
        match input {
            ReviewInput::Rating(rating) => Ok(rating),
            ReviewInput::Success(_) => Err(SrsError::invalid(
                "fsrs expects a rating, not a success value",
            )),
        }
    }

    fn scheduled(state: FsrsState) -> ScheduledReview {
        let snapshot = ReviewSnapshot::Fsrs {
            status: state.status,
            stability: state.stability,
            difficulty: state.difficulty,
            interval_days: state.interval_days,
            due: state.due,
        };
        ScheduledReview {
            state: SchedulingState::Fsrs(state),
            snapshot,
        }
    }

    fn w(&self, i: usize) -> f64 {
        self.knobs.w[i]
    }

    /// Calculate initial stability for a new card based on first rating.
    /// S0(G) = w[G-1] where G is rating 1-4
    fn initial_stability(&self, rating: Rating) -> f64 {
        let index = (rating.to_value() - 1) as usize;
        self.w(index).max(MIN_STABILITY)
    }

    /// Calculate initial difficulty for a new card based on first rating.
    /// D0(G) = w[4] - w[5] * (G - 3)
    fn initial_difficulty(&self, rating: Rating) -> f64 {
        let g = rating.to_value() as f64;
        (self.w(4) - self.w(5) * (g - 3.0)).clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
    }

    /// Calculate next difficulty.
    /// D' = D - w[6] * (G - 3)
    /// Mean reversion towards D0(Good): D'' = w[7] * D0(3) + (1 - w[7]) * D'
    fn next_difficulty(&self, current_d: f64, rating: Rating) -> f64 {
        let g = rating.to_value() as f64;
        let d_step = current_d - self.w(6) * (g - 3.0);
        let d_reverted =
            self.w(7) * self.initial_difficulty(Rating::Good) + (1.0 - self.w(7)) * d_step;
        d_reverted.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
    }

    /// Calculate retrievability (probability of recall).
    /// R = (1 + t / (9 * S))^(-1)
    pub fn retrievability(elapsed_days: f64, stability: f64) -> f64 {
        let s = stability.max(MIN_STABILITY);
        (1.0 + elapsed_days.max(0.0) / (9.0 * s)).powf(-1.0)
    }

    /// Calculate next stability after successful recall.
    /// S' = S * (e^(w[8]) * (11 - D) * S^(-w[9]) * (e^(w[10]*(1-R)) - 1) * hard * easy + 1)
    fn next_stability_recall(
        &self,
        stability: f64,
        difficulty: f64,
        retrievability: f64,
        rating: Rating,
    ) -> f64 {
        let hard_penalty = if rating == Rating::Hard { self.w(15) } else { 1.0 };
        let easy_bonus = if rating == Rating::Easy { self.w(16) } else { 1.0 };

        let growth = self.w(8).exp()
            * (11.0 - difficulty)
            * stability.powf(-self.w(9))
            * ((self.w(10) * (1.0 - retrievability)).exp() - 1.0)
            * hard_penalty
            * easy_bonus;

        self.bound_stability(stability * (1.0 + growth))
    }

    /// Calculate next stability after forgetting (lapse).
    /// S' = w[11] * D^(-w[12]) * ((S+1)^w[13] - 1) * e^(w[14]*(1-R))
    fn next_stability_forget(&self, stability: f64, difficulty: f64, retrievability: f64) -> f64 {
        let d_factor = difficulty.max(MIN_DIFFICULTY).powf(-self.w(12));
        let s_factor = (stability + 1.0).powf(self.w(13)) - 1.0;
        let r_factor = (self.w(14) * (1.0 - retrievability)).exp();

        let new_s = self.w(11) * d_factor * s_factor * r_factor;
        // Never exceed previous stability on lapse
        self.bound_stability(new_s.min(stability))
    }

    fn bound_stability(&self, stability: f64) -> f64 {
        if stability.is_nan() {
            return MIN_STABILITY;
        }
        stability.clamp(MIN_STABILITY, self.knobs.maximum_interval)
    }

    /// Calculate optimal interval from stability.
    /// I = 9 * S * (1/R - 1) where R = request_retention
    fn interval_from_stability(&self, stability: f64) -> f64 {
        let interval = 9.0 * stability * (1.0 / self.knobs.request_retention - 1.0);
        interval.clamp(1.0, self.knobs.maximum_interval)
    }

    /// Short interval for learning/relearning cards: 10 minutes up to one day.
    fn short_term_interval(stability: f64) -> f64 {
        let minutes = (stability * 60.0).clamp(10.0, MINUTES_PER_DAY);
        minutes / MINUTES_PER_DAY
    }

    fn interval_for(&self, status: CardStatus, stability: f64) -> f64 {
        if status.is_short_term() {
            Self::short_term_interval(stability)
        } else {
            self.interval_from_stability(stability)
        }
    }

    /// Determine new status based on current status and rating.
    fn next_status(current: CardStatus, rating: Rating) -> CardStatus {
        match (current, rating) {
            (_, Rating::Again) => CardStatus::Relearn,
            (CardStatus::New, Rating::Hard) => CardStatus::Relearn,
            (CardStatus::New, _) => CardStatus::Review,
            (CardStatus::Learning, Rating::Hard) => CardStatus::Learning,
            (CardStatus::Relearn, Rating::Hard) => CardStatus::Relearn,
            (CardStatus::Learning | CardStatus::Relearn, _) => CardStatus::Review,
            (CardStatus::Review, _) => CardStatus::Review,
        }
    }

    fn with_due(&self, mut state: FsrsState, now: DateTime<Utc>) -> Result<FsrsState> {
        state.interval_days = self.interval_for(state.status, state.stability);
        state.due = add_hours(now, state.interval_days * 24.0)?;
        Ok(state)
    }

    /// Schedule first review - initialize stability and difficulty.
    fn schedule_first_review(&self, rating: Rating, now: DateTime<Utc>) -> Result<FsrsState> {
        let state = FsrsState {
            status: Self::next_status(CardStatus::New, rating),
            difficulty: self.initial_difficulty(rating),
            stability: self.initial_stability(rating),
            reps: 1,
            lapses: u32::from(rating == Rating::Again),
            interval_days: 0.0,
            due: now,
        };
        let state = self.with_due(state, now)?;
        tracing::debug!(
            ?rating,
            status = %state.status,
            stability = state.stability,
            difficulty = state.difficulty,
            "fsrs first review"
        );
        Ok(state)
    }

    /// Schedule subsequent review - update stability and difficulty.
    fn schedule_subsequent_review(
        &self,
        state: &FsrsState,
        rating: Rating,
        elapsed_days: f64,
        now: DateTime<Utc>,
    ) -> Result<FsrsState> {
        let current_s = state.stability.max(MIN_STABILITY);
        let current_d = state.difficulty;
        let r = Self::retrievability(elapsed_days, current_s);

        let (stability, lapses) = if rating == Rating::Again {
            // Lapse: forgot the card
            (
                self.next_stability_forget(current_s, current_d, r),
                state.lapses + 1,
            )
        } else {
            // Recall: remembered the card
            (
                self.next_stability_recall(current_s, current_d, r, rating),
                state.lapses,
            )
        };

        let next = FsrsState {
            status: Self::next_status(state.status, rating),
            difficulty: self.next_difficulty(current_d, rating),
            stability,
            reps: state.reps + 1,
            lapses,
            interval_days: 0.0,
            due: now,
        };
        let next = self.with_due(next, now)?;
        tracing::debug!(
            ?rating,
            elapsed_days,
            retrievability = r,
            status = %next.status,
            stability = next.stability,
            difficulty = next.difficulty,
            "fsrs review"
        );
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knobs::FSRS_WEIGHT_COUNT;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    }

    fn first(fsrs: &Fsrs, rating: Rating) -> FsrsState {
        fsrs.schedule_first_review(rating, now()).unwrap()
    }

    fn review_state(stability: f64, difficulty: f64) -> FsrsState {
        FsrsState {
            status: CardStatus::Review,
            difficulty,
            stability,
            reps: 5,
            lapses: 0,
            interval_days: stability,
            due: now(),
        }
    }

    fn card(state: FsrsState, last_review: DateTime<Utc>) -> Card {
        Card {
            key: "q1".to_string(),
            last_review,
            state: SchedulingState::Fsrs(state),
        }
    }

    #[test]
    fn new_card_first_review_good() {
        let fsrs = Fsrs::default();
        let state = first(&fsrs, Rating::Good);

        assert_eq!(state.status, CardStatus::Review);
        assert!(state.stability > 0.0);
        assert_eq!(state.reps, 1);
        assert_eq!(state.lapses, 0);
        assert!(state.interval_days >= 1.0);
    }

    #[test]
    fn new_card_first_review_again() {
        let fsrs = Fsrs::default();
        let state = first(&fsrs, Rating::Again);

        assert_eq!(state.status, CardStatus::Relearn);
        assert_eq!(state.lapses, 1);
        assert_eq!(state.reps, 1);
        assert!(state.interval_days < 1.0);
        assert!(state.due > now());
    }

    #[test]
    fn new_card_first_review_hard_relearns_without_lapse() {
        let fsrs = Fsrs::default();
        let state = first(&fsrs, Rating::Hard);

        assert_eq!(state.status, CardStatus::Relearn);
        assert_eq!(state.lapses, 0);
    }

    #[test]
    fn new_card_first_review_easy_higher_stability() {
        let fsrs = Fsrs::default();
        let good = first(&fsrs, Rating::Good);
        let easy = first(&fsrs, Rating::Easy);

        assert!(easy.stability > good.stability);
        assert!(easy.due > good.due);
    }

    #[test]
    fn stability_increases_on_successful_recall() {
        let fsrs = Fsrs::default();
        let state = review_state(5.0, 5.0);
        let next = fsrs.schedule_subsequent_review(&state, Rating::Good, 5.0, now()).unwrap();
        assert!(next.stability > 5.0);
        assert_eq!(next.status, CardStatus::Review);
        assert_eq!(next.reps, 6);
    }

    #[test]
    fn stability_decreases_on_lapse() {
        let fsrs = Fsrs::default();
        let state = review_state(10.0, 5.0);
        let next = fsrs.schedule_subsequent_review(&state, Rating::Again, 10.0, now()).unwrap();
        assert!(next.stability < 10.0);
        assert!(next.stability >= MIN_STABILITY);
        assert_eq!(next.lapses, 1);
        assert_eq!(next.status, CardStatus::Relearn);
    }

    #[test]
    fn difficulty_moves_with_rating() {
        let fsrs = Fsrs::default();
        let state = review_state(5.0, 5.0);

        let easy = fsrs.schedule_subsequent_review(&state, Rating::Easy, 5.0, now()).unwrap();
        assert!(easy.difficulty < 5.0);

        let again = fsrs.schedule_subsequent_review(&state, Rating::Again, 5.0, now()).unwrap();
        assert!(again.difficulty > 5.0);
    }

    #[test]
    fn difficulty_clamped_to_bounds() {
        let fsrs = Fsrs::default();

        let state = review_state(5.0, MAX_DIFFICULTY);
        let next = fsrs.schedule_subsequent_review(&state, Rating::Again, 5.0, now()).unwrap();
        assert!(next.difficulty <= MAX_DIFFICULTY);

        let state = review_state(5.0, MIN_DIFFICULTY);
        let next = fsrs.schedule_subsequent_review(&state, Rating::Easy, 5.0, now()).unwrap();
        assert!(next.difficulty >= MIN_DIFFICULTY);
    }

    #[test]
    fn interval_respects_maximum() {
        let fsrs = Fsrs::default();
        let state = review_state(50000.0, 5.0);
        let next = fsrs.schedule_subsequent_review(&state, Rating::Good, 1000.0, now()).unwrap();
        assert!(next.interval_days <= fsrs.knobs().maximum_interval);
    }

    #[test]
    fn retrievability_formula() {
        // At t=0, R should be 1.0
        assert!((Fsrs::retrievability(0.0, 10.0) - 1.0).abs() < 0.001);

        // At t = 9*S, R = 0.5
        assert!((Fsrs::retrievability(90.0, 10.0) - 0.5).abs() < 0.001);

        // Zero stability is floored rather than dividing by zero
        assert!(Fsrs::retrievability(1.0, 0.0).is_finite());
    }

    #[test]
    fn interval_equals_stability_at_ninety_percent() {
        let fsrs = Fsrs::default();
        assert!((fsrs.interval_from_stability(5.8) - 5.8).abs() < 1e-9);
        assert_eq!(fsrs.interval_from_stability(0.4), 1.0);
    }

    #[test]
    fn relearning_card_graduates_on_good() {
        let fsrs = Fsrs::default();
        let state = FsrsState {
            status: CardStatus::Relearn,
            ..review_state(1.0, 5.0)
        };

        let next = fsrs.schedule_subsequent_review(&state, Rating::Good, 0.01, now()).unwrap();
        assert_eq!(next.status, CardStatus::Review);
        assert!(next.interval_days >= 1.0);

        let next = fsrs.schedule_subsequent_review(&state, Rating::Hard, 0.01, now()).unwrap();
        assert_eq!(next.status, CardStatus::Relearn);
        assert!(next.interval_days < 1.0);
    }

    #[test]
    fn learning_card_rules() {
        let fsrs = Fsrs::default();
        let state = FsrsState {
            status: CardStatus::Learning,
            ..review_state(1.0, 5.0)
        };

        let hard = fsrs.schedule_subsequent_review(&state, Rating::Hard, 0.01, now()).unwrap();
        assert_eq!(hard.status, CardStatus::Learning);

        let easy = fsrs.schedule_subsequent_review(&state, Rating::Easy, 0.01, now()).unwrap();
        assert_eq!(easy.status, CardStatus::Review);

        let again = fsrs.schedule_subsequent_review(&state, Rating::Again, 0.01, now()).unwrap();
        assert_eq!(again.status, CardStatus::Relearn);
        assert_eq!(again.lapses, 1);
    }

    #[test]
    fn hard_penalty_and_easy_bonus() {
        let fsrs = Fsrs::default();
        let state = review_state(10.0, 5.0);

        let hard = fsrs.schedule_subsequent_review(&state, Rating::Hard, 10.0, now()).unwrap();
        let good = fsrs.schedule_subsequent_review(&state, Rating::Good, 10.0, now()).unwrap();
        let easy = fsrs.schedule_subsequent_review(&state, Rating::Easy, 10.0, now()).unwrap();

        assert!(hard.stability < good.stability);
        assert!(easy.stability > good.stability);
    }

    #[test]
    fn initial_values_are_monotone_in_rating() {
        let fsrs = Fsrs::default();
        let ratings = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

        let s: Vec<f64> = ratings.iter().map(|r| fsrs.initial_stability(*r)).collect();
        let d: Vec<f64> = ratings.iter().map(|r| fsrs.initial_difficulty(*r)).collect();

        assert!(s.windows(2).all(|w| w[0] < w[1]));
        assert!(d.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn update_uses_time_since_last_review() {
        let fsrs = Fsrs::default();
        let state = fsrs.schedule_first_review(Rating::Good, now()).unwrap();

        let soon = fsrs
            .update(
                &card(state.clone(), now()),
                ReviewInput::Rating(Rating::Good),
                now() + Duration::days(1),
            )
            .unwrap();
        let late = fsrs
            .update(
                &card(state, now()),
                ReviewInput::Rating(Rating::Good),
                now() + Duration::days(10),
            )
            .unwrap();

        let soon_s = soon.state.as_fsrs().unwrap().stability;
        let late_s = late.state.as_fsrs().unwrap().stability;
        assert!(late_s > soon_s);
    }

    #[test]
    fn zero_weights_still_schedule() {
        let fsrs = Fsrs::new(FsrsKnobs {
            w: [0.0; FSRS_WEIGHT_COUNT],
            ..FsrsKnobs::default()
        })
        .unwrap();
        let state = fsrs.schedule_first_review(Rating::Good, now()).unwrap();
        assert_eq!(state.stability, MIN_STABILITY);
        assert!(state.due >= now() + Duration::days(1));
    }

    #[test]
    fn rejects_success_input_and_foreign_state() {
        let fsrs = Fsrs::default();
        assert!(fsrs.initialize(ReviewInput::Success(0.5), now()).is_err());

        let foreign = Card {
            key: "q1".to_string(),
            last_review: now(),
            state: SchedulingState::Ebisu(crate::types::EbisuState {
                alpha: 2.0,
                beta: 2.0,
                half_life: 24.0,
                total_reviews: 1,
            }),
        };
        let err = fsrs
            .update(&foreign, ReviewInput::Rating(Rating::Good), now())
            .unwrap_err();
        assert!(matches!(err, SrsError::StateMismatch { .. }));
    }
}
