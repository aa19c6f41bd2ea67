//! Scheduler facade: correctness in, due cards out.

use crate::algorithm::{build_strategy, SchedulingStrategy, TieBreak};
use crate::error::Result;
use crate::knobs::{EbisuKnobs, FsrsKnobs, StrategyConfig};
use crate::store::CardStore;
use crate::types::{Algorithm, Card, ReviewRecord};
use chrono::{DateTime, Utc};

/// Per-algorithm entry point over a card store.
///
/// `answer` takes `&mut self`, so writes through one scheduler are serialized.
/// Callers sharing a store between processes must serialize per key themselves.
#[derive(Debug)]
pub struct Scheduler<S: CardStore> {
    config: StrategyConfig,
    strategy: Box<dyn SchedulingStrategy>,
    store: S,
}

impl<S: CardStore> Scheduler<S> {
    /// Validate `config` and build its strategy.
    pub fn new(config: StrategyConfig, store: S) -> Result<Self> {
        let strategy = build_strategy(&config)?;
        Ok(Self {
            config,
            strategy,
            store,
        })
    }

    pub fn fsrs(knobs: FsrsKnobs, store: S) -> Result<Self> {
        Self::new(StrategyConfig::Fsrs(knobs), store)
    }

    pub fn ebisu(knobs: EbisuKnobs, store: S) -> Result<Self> {
        Self::new(StrategyConfig::Ebisu(knobs), store)
    }

    pub fn algorithm(&self) -> Algorithm {
        self.strategy.algorithm()
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Record an answer for `key` at `timestamp`.
    ///
    /// Correctness is validated before anything is read or written; the new
    /// card state and its review record are committed together.
    pub fn answer(&mut self, timestamp: DateTime<Utc>, key: &str, correctness: f64) -> Result<()> {
        let input = self.strategy.map_correctness(correctness)?;

        let scheduled = match self.store.load_card(key)? {
            Some(card) => self.strategy.update(&card, input, timestamp)?,
            None => self.strategy.initialize(input, timestamp)?,
        };

        let card = Card {
            key: key.to_string(),
            last_review: timestamp,
            state: scheduled.state,
        };
        let review = ReviewRecord {
            key: key.to_string(),
            timestamp,
            correctness,
            input,
            snapshot: scheduled.snapshot,
        };
        self.store.commit(&card, &review)?;

        tracing::debug!(
            key,
            correctness,
            algorithm = %self.algorithm(),
            reviews = card.state.review_count(),
            "answer recorded"
        );
        Ok(())
    }

    /// Keys of every card due at `timestamp`, most urgent first.
    pub fn next(&self, timestamp: DateTime<Utc>) -> Result<Vec<String>> {
        let mut due = Vec::new();
        for card in self.store.all_cards()? {
            if self.strategy.is_due(&card, timestamp)? {
                let rank = self.strategy.ordering_key(&card, timestamp)?;
                due.push((rank, card.key));
            }
        }

        // Stable sort keeps creation order among equal ranks.
        match self.strategy.tie_break() {
            TieBreak::Insertion => due.sort_by(|a, b| a.0.total_cmp(&b.0)),
            TieBreak::Key => due.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1))),
        }

        Ok(due.into_iter().map(|(_, key)| key).collect())
    }

    /// Earliest upcoming due timestamp across all cards.
    pub fn next_due_date(&self) -> Result<Option<DateTime<Utc>>> {
        if self.strategy.persists_due() {
            return self.store.min_due();
        }
        let mut earliest: Option<DateTime<Utc>> = None;
        for card in self.store.all_cards()? {
            let due = self.strategy.due_at(&card)?;
            earliest = Some(earliest.map_or(due, |current| current.min(due)));
        }
        Ok(earliest)
    }

    pub fn card(&self, key: &str) -> Result<Option<Card>> {
        self.store.load_card(key)
    }

    pub fn reviews(&self, key: &str) -> Result<Vec<ReviewRecord>> {
        self.store.reviews(key)
    }

    /// Due timestamp of `key`, if the card exists.
    pub fn due_date(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        match self.store.load_card(key)? {
            Some(card) => Ok(Some(self.strategy.due_at(&card)?)),
            None => Ok(None),
        }
    }

    /// Recall probability of `key` at `timestamp`, if the card exists.
    pub fn predict_recall(&self, key: &str, timestamp: DateTime<Utc>) -> Result<Option<f64>> {
        match self.store.load_card(key)? {
            Some(card) => Ok(Some(self.strategy.recall_probability(&card, timestamp)?)),
            None => Ok(None),
        }
    }
}
