//! Storage collaborator interface and an in-memory implementation.

use crate::error::Result;
use crate::types::{Card, ReviewRecord};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Persistence used by the scheduler.
///
/// Implementations must keep previously saved cards across reopen and
/// tolerate unrelated data living next to theirs.
pub trait CardStore {
    fn load_card(&self, key: &str) -> Result<Option<Card>>;

    /// Insert or replace the card with the same key.
    fn save_card(&mut self, card: &Card) -> Result<()>;

    fn append_review(&mut self, review: &ReviewRecord) -> Result<()>;

    /// Persist a card together with the review that produced it.
    ///
    /// Stores that can do so should write both or neither.
    fn commit(&mut self, card: &Card, review: &ReviewRecord) -> Result<()> {
        self.save_card(card)?;
        self.append_review(review)
    }

    /// Every card, in creation order.
    fn all_cards(&self) -> Result<Vec<Card>>;

    /// Earliest persisted due timestamp.
    fn min_due(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .all_cards()?
            .iter()
            .filter_map(|card| card.state.stored_due())
            .min())
    }

    /// Review history of one card, oldest first.
    fn reviews(&self, key: &str) -> Result<Vec<ReviewRecord>>;
}

/// Volatile store, handy for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    cards: Vec<Card>,
    index: HashMap<String, usize>,
    reviews: Vec<ReviewRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn review_count(&self) -> usize {
        self.reviews.len()
    }
}

impl CardStore for MemoryStore {
    fn load_card(&self, key: &str) -> Result<Option<Card>> {
        Ok(self.index.get(key).map(|&i| self.cards[i].clone()))
    }

    fn save_card(&mut self, card: &Card) -> Result<()> {
        match self.index.get(&card.key) {
            Some(&i) => self.cards[i] = card.clone(),
            None => {
                self.index.insert(card.key.clone(), self.cards.len());
                self.cards.push(card.clone());
            }
        }
        Ok(())
    }

    fn append_review(&mut self, review: &ReviewRecord) -> Result<()> {
        self.reviews.push(review.clone());
        Ok(())
    }

    fn all_cards(&self) -> Result<Vec<Card>> {
        Ok(self.cards.clone())
    }

    fn reviews(&self, key: &str) -> Result<Vec<ReviewRecord>> {
        Ok(self
            .reviews
            .iter()
            .filter(|review| review.key == key)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        CardStatus, FsrsState, Rating, ReviewInput, ReviewSnapshot, SchedulingState,
    };
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    }

    fn card(key: &str, due_in_days: i64) -> Card {
        Card {
            key: key.to_string(),
            last_review: now(),
            state: SchedulingState::Fsrs(FsrsState {
                status: CardStatus::Review,
                difficulty: 5.0,
                stability: due_in_days as f64,
                reps: 1,
                lapses: 0,
                interval_days: due_in_days as f64,
                due: now() + Duration::days(due_in_days),
            }),
        }
    }

    fn review(key: &str) -> ReviewRecord {
        ReviewRecord {
            key: key.to_string(),
            timestamp: now(),
            correctness: 80.0,
            input: ReviewInput::Rating(Rating::Good),
            snapshot: ReviewSnapshot::Fsrs {
                status: CardStatus::Review,
                stability: 2.4,
                difficulty: 4.93,
                interval_days: 2.4,
                due: now(),
            },
        }
    }

    #[test]
    fn upsert_keeps_creation_order() {
        let mut store = MemoryStore::new();
        store.save_card(&card("b", 3)).unwrap();
        store.save_card(&card("a", 1)).unwrap();
        store.save_card(&card("b", 5)).unwrap();

        let keys: Vec<String> = store.all_cards().unwrap().into_iter().map(|c| c.key).collect();
        assert_eq!(keys, vec!["b".to_string(), "a".to_string()]);
        assert_eq!(store.load_card("b").unwrap(), Some(card("b", 5)));
        assert_eq!(store.load_card("zzz").unwrap(), None);
    }

    #[test]
    fn min_due_defaults_to_earliest() {
        let mut store = MemoryStore::new();
        assert_eq!(store.min_due().unwrap(), None);
        store.save_card(&card("b", 3)).unwrap();
        store.save_card(&card("a", 1)).unwrap();
        assert_eq!(store.min_due().unwrap(), Some(now() + Duration::days(1)));
    }

    #[test]
    fn commit_writes_card_and_review() {
        let mut store = MemoryStore::new();
        store.commit(&card("a", 1), &review("a")).unwrap();
        store.commit(&card("b", 1), &review("b")).unwrap();
        store.commit(&card("a", 2), &review("a")).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.review_count(), 3);
        assert_eq!(store.reviews("a").unwrap().len(), 2);
        assert!(store.reviews("missing").unwrap().is_empty());
    }
}
