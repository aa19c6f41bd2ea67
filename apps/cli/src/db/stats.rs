//! Aggregate statistics and per-card listings.

use crate::db::error::DbError;
use crate::db::repository::SqliteStore;
use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::Serialize;
use srs_core::{Algorithm, CardStatus, SchedulingState};

type Result<T> = std::result::Result<T, DbError>;

/// Read-only reporting over a store's tables.
pub trait StatsRepository {
    fn stats(&self) -> Result<StoreStats>;
    fn card_summaries(&self) -> Result<Vec<CardSummary>>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum StoreStats {
    Fsrs(FsrsStats),
    Ebisu(EbisuStats),
}

/// FSRS collection statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FsrsStats {
    pub total_cards: usize,
    pub total_reviews: usize,
    pub new_cards: usize,
    pub learning_cards: usize,
    pub review_cards: usize,
    pub relearn_cards: usize,
    pub average_difficulty: f64,
    pub average_stability: f64,
    pub average_reps: f64,
    pub total_lapses: u64,
}

/// Ebisu collection statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EbisuStats {
    pub total_cards: usize,
    pub total_reviews: usize,
    pub average_alpha: f64,
    pub average_beta: f64,
    /// Hours.
    pub average_half_life: f64,
}

/// One line of the per-card listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardSummary {
    pub key: String,
    pub reviews: u32,
    pub last_review: DateTime<Utc>,
    /// FSRS only.
    pub status: Option<CardStatus>,
    /// FSRS only.
    pub due: Option<DateTime<Utc>>,
    /// Stability in days for FSRS, half-life in hours for Ebisu.
    pub strength: f64,
}

impl StatsRepository for SqliteStore {
    fn stats(&self) -> Result<StoreStats> {
        match self.algorithm() {
            Algorithm::Fsrs => self.fsrs_stats().map(StoreStats::Fsrs),
            Algorithm::Ebisu => self.ebisu_stats().map(StoreStats::Ebisu),
        }
    }

    fn card_summaries(&self) -> Result<Vec<CardSummary>> {
        Ok(self
            .get_all_cards()?
            .into_iter()
            .map(|card| {
                let reviews = card.state.review_count();
                let (status, due, strength) = match &card.state {
                    SchedulingState::Fsrs(state) => {
                        (Some(state.status), Some(state.due), state.stability)
                    }
                    SchedulingState::Ebisu(state) => (None, None, state.half_life),
                };
                CardSummary {
                    key: card.key,
                    reviews,
                    last_review: card.last_review,
                    status,
                    due,
                    strength,
                }
            })
            .collect())
    }
}

impl SqliteStore {
    fn fsrs_stats(&self) -> Result<FsrsStats> {
        let conn = self.conn();
        let (total_cards, average_difficulty, average_stability, average_reps, total_lapses) = conn
            .query_row(
                "SELECT COUNT(*), COALESCE(AVG(difficulty), 0.0), COALESCE(AVG(stability), 0.0),
                        COALESCE(AVG(reps), 0.0), COALESCE(SUM(lapses), 0)
                 FROM fsrs_cards",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, f64>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )?;

        let mut stats = FsrsStats {
            total_cards: total_cards as usize,
            total_reviews: count_rows(self, "fsrs_reviews")?,
            new_cards: 0,
            learning_cards: 0,
            review_cards: 0,
            relearn_cards: 0,
            average_difficulty,
            average_stability,
            average_reps,
            total_lapses: total_lapses.max(0) as u64,
        };

        let mut stmt = conn.prepare("SELECT state, COUNT(*) FROM fsrs_cards GROUP BY state")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            let (code, count) = row?;
            let count = count as usize;
            match CardStatus::from_code(code) {
                Some(CardStatus::New) => stats.new_cards = count,
                Some(CardStatus::Learning) => stats.learning_cards = count,
                Some(CardStatus::Review) => stats.review_cards = count,
                Some(CardStatus::Relearn) => stats.relearn_cards = count,
                None => {
                    return Err(DbError::InvalidData(format!("unknown card state {code}")));
                }
            }
        }
        Ok(stats)
    }

    fn ebisu_stats(&self) -> Result<EbisuStats> {
        let (total_cards, average_alpha, average_beta, average_half_life) = self.conn().query_row(
            "SELECT COUNT(*), COALESCE(AVG(alpha), 0.0), COALESCE(AVG(beta), 0.0), COALESCE(AVG(t), 0.0)
             FROM ebisu_cards",
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                ))
            },
        )?;
        Ok(EbisuStats {
            total_cards: total_cards as usize,
            total_reviews: count_rows(self, "ebisu_reviews")?,
            average_alpha,
            average_beta,
            average_half_life,
        })
    }
}

fn count_rows(store: &SqliteStore, table: &str) -> Result<usize> {
    let count: i64 = store
        .conn()
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), params![], |row| {
            row.get(0)
        })?;
    Ok(count as usize)
}
