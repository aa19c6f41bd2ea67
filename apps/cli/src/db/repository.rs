//! SQLite-backed card store.

use crate::db::error::DbError;
use crate::db::timestamp;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use srs_core::{
    Algorithm, Card, CardStatus, CardStore, EbisuState, FsrsState, Rating, ReviewInput,
    ReviewRecord, ReviewSnapshot, SchedulingState,
};
use std::path::Path;
use tracing::{info, warn};

type Result<T> = std::result::Result<T, DbError>;

/// Card store over one SQLite file.
///
/// Both table families are created on open, so FSRS and Ebisu stores can
/// share a file. Each store only reads and writes its own algorithm's tables.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    algorithm: Algorithm,
}

impl SqliteStore {
    /// Open database at path, creating if necessary.
    pub fn open<P: AsRef<Path>>(path: P, algorithm: Algorithm) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        let store = Self { conn, algorithm };
        store.initialize()?;
        info!(path = %path.display(), %algorithm, "opened card store");
        Ok(store)
    }

    /// Open in-memory database (for testing).
    pub fn open_in_memory(algorithm: Algorithm) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn, algorithm };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(super::schema::SCHEMA)?;
        Ok(())
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    fn get_card(&self, key: &str) -> Result<Option<Card>> {
        let row = match self.algorithm {
            Algorithm::Fsrs => self
                .conn
                .query_row(
                    &format!("{FSRS_CARD_COLUMNS} WHERE question_key = ?1"),
                    params![key],
                    FsrsCardRow::from_row,
                )
                .optional()?
                .map(StoredCard::Fsrs),
            Algorithm::Ebisu => self
                .conn
                .query_row(
                    &format!("{EBISU_CARD_COLUMNS} WHERE question_key = ?1"),
                    params![key],
                    EbisuCardRow::from_row,
                )
                .optional()?
                .map(StoredCard::Ebisu),
        };
        row.map(StoredCard::decode).transpose()
    }

    pub(crate) fn get_all_cards(&self) -> Result<Vec<Card>> {
        let rows: Vec<StoredCard> = match self.algorithm {
            Algorithm::Fsrs => {
                let mut stmt = self
                    .conn
                    .prepare(&format!("{FSRS_CARD_COLUMNS} ORDER BY rowid"))?;
                let rows = stmt.query_map([], FsrsCardRow::from_row)?;
                rows.map(|row| row.map(StoredCard::Fsrs))
                    .collect::<rusqlite::Result<Vec<_>>>()?
            }
            Algorithm::Ebisu => {
                let mut stmt = self
                    .conn
                    .prepare(&format!("{EBISU_CARD_COLUMNS} ORDER BY rowid"))?;
                let rows = stmt.query_map([], EbisuCardRow::from_row)?;
                rows.map(|row| row.map(StoredCard::Ebisu))
                    .collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        rows.into_iter().map(StoredCard::decode).collect()
    }

    fn get_min_due(&self) -> Result<Option<DateTime<Utc>>> {
        if self.algorithm != Algorithm::Fsrs {
            return Ok(None);
        }
        let due: Option<String> =
            self.conn
                .query_row("SELECT MIN(due) FROM fsrs_cards", [], |row| row.get(0))?;
        due.as_deref().map(timestamp::from_sql).transpose()
    }

    fn get_reviews(&self, key: &str) -> Result<Vec<ReviewRecord>> {
        match self.algorithm {
            Algorithm::Fsrs => {
                let mut stmt = self.conn.prepare(
                    "SELECT question_key, review_time, correctness, rating, state, stability, difficulty, interval_days, due
                     FROM fsrs_reviews WHERE question_key = ?1 ORDER BY id",
                )?;
                let rows = stmt
                    .query_map(params![key], |row| {
                        Ok(FsrsReviewRow {
                            key: row.get(0)?,
                            review_time: row.get(1)?,
                            correctness: row.get(2)?,
                            rating: row.get(3)?,
                            state: row.get(4)?,
                            stability: row.get(5)?,
                            difficulty: row.get(6)?,
                            interval_days: row.get(7)?,
                            due: row.get(8)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows.into_iter().map(FsrsReviewRow::decode).collect()
            }
            Algorithm::Ebisu => {
                let mut stmt = self.conn.prepare(
                    "SELECT question_key, review_time, correctness, success, recall_probability, alpha, beta, t
                     FROM ebisu_reviews WHERE question_key = ?1 ORDER BY id",
                )?;
                let rows = stmt
                    .query_map(params![key], |row| {
                        Ok(EbisuReviewRow {
                            key: row.get(0)?,
                            review_time: row.get(1)?,
                            correctness: row.get(2)?,
                            success: row.get(3)?,
                            recall_probability: row.get(4)?,
                            alpha: row.get(5)?,
                            beta: row.get(6)?,
                            half_life: row.get(7)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows.into_iter().map(EbisuReviewRow::decode).collect()
            }
        }
    }
}

impl CardStore for SqliteStore {
    fn load_card(&self, key: &str) -> srs_core::Result<Option<Card>> {
        Ok(self.get_card(key)?)
    }

    fn save_card(&mut self, card: &Card) -> srs_core::Result<()> {
        Ok(upsert_card(self.algorithm, &self.conn, card)?)
    }

    fn append_review(&mut self, review: &ReviewRecord) -> srs_core::Result<()> {
        Ok(insert_review(self.algorithm, &self.conn, review)?)
    }

    fn commit(&mut self, card: &Card, review: &ReviewRecord) -> srs_core::Result<()> {
        let algorithm = self.algorithm;
        let tx = self.conn.transaction().map_err(DbError::from)?;
        // An early return drops the transaction, which rolls it back.
        upsert_card(algorithm, &tx, card)?;
        insert_review(algorithm, &tx, review)?;
        tx.commit().map_err(DbError::from)?;
        Ok(())
    }

    fn all_cards(&self) -> srs_core::Result<Vec<Card>> {
        Ok(self.get_all_cards()?)
    }

    fn min_due(&self) -> srs_core::Result<Option<DateTime<Utc>>> {
        Ok(self.get_min_due()?)
    }

    fn reviews(&self, key: &str) -> srs_core::Result<Vec<ReviewRecord>> {
        Ok(self.get_reviews(key)?)
    }
}

fn check_algorithm(store: Algorithm, found: Algorithm) -> Result<()> {
    if found == store {
        Ok(())
    } else {
        Err(DbError::AlgorithmMismatch { store, found })
    }
}

fn upsert_card(algorithm: Algorithm, conn: &Connection, card: &Card) -> Result<()> {
    check_algorithm(algorithm, card.state.algorithm())?;
    let last_review = timestamp::to_sql(card.last_review)?;
    match &card.state {
        SchedulingState::Fsrs(state) => {
            // Upsert rather than REPLACE so the rowid, and with it creation order, survives.
            conn.execute(
                "INSERT INTO fsrs_cards (question_key, difficulty, stability, reps, lapses, state, interval_days, due, last_review)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(question_key) DO UPDATE SET
                    difficulty = excluded.difficulty,
                    stability = excluded.stability,
                    reps = excluded.reps,
                    lapses = excluded.lapses,
                    state = excluded.state,
                    interval_days = excluded.interval_days,
                    due = excluded.due,
                    last_review = excluded.last_review",
                params![
                    card.key,
                    state.difficulty,
                    state.stability,
                    i64::from(state.reps),
                    i64::from(state.lapses),
                    state.status.to_code(),
                    state.interval_days,
                    timestamp::to_sql(state.due)?,
                    last_review,
                ],
            )?;
        }
        SchedulingState::Ebisu(state) => {
            conn.execute(
                "INSERT INTO ebisu_cards (question_key, alpha, beta, t, total_reviews, last_review)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(question_key) DO UPDATE SET
                    alpha = excluded.alpha,
                    beta = excluded.beta,
                    t = excluded.t,
                    total_reviews = excluded.total_reviews,
                    last_review = excluded.last_review",
                params![
                    card.key,
                    state.alpha,
                    state.beta,
                    state.half_life,
                    i64::from(state.total_reviews),
                    last_review,
                ],
            )?;
        }
    }
    Ok(())
}

fn insert_review(algorithm: Algorithm, conn: &Connection, review: &ReviewRecord) -> Result<()> {
    let review_time = timestamp::to_sql(review.timestamp)?;
    match (&review.snapshot, review.input) {
        (
            ReviewSnapshot::Fsrs {
                status,
                stability,
                difficulty,
                interval_days,
                due,
            },
            ReviewInput::Rating(rating),
        ) => {
            check_algorithm(algorithm, Algorithm::Fsrs)?;
            conn.execute(
                "INSERT INTO fsrs_reviews (question_key, review_time, correctness, rating, state, stability, difficulty, interval_days, due)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    review.key,
                    review_time,
                    review.correctness,
                    rating.to_value(),
                    status.to_code(),
                    stability,
                    difficulty,
                    interval_days,
                    timestamp::to_sql(*due)?,
                ],
            )?;
        }
        (
            ReviewSnapshot::Ebisu {
                recall_probability,
                alpha,
                beta,
                half_life,
            },
            ReviewInput::Success(success),
        ) => {
            check_algorithm(algorithm, Algorithm::Ebisu)?;
            conn.execute(
                "INSERT INTO ebisu_reviews (question_key, review_time, correctness, success, recall_probability, alpha, beta, t)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    review.key,
                    review_time,
                    review.correctness,
                    success,
                    recall_probability,
                    alpha,
                    beta,
                    half_life,
                ],
            )?;
        }
        _ => {
            return Err(DbError::InvalidData(format!(
                "review for {} pairs an input with another algorithm's snapshot",
                review.key
            )))
        }
    }
    Ok(())
}

const FSRS_CARD_COLUMNS: &str = "SELECT question_key, difficulty, stability, reps, lapses, state, interval_days, due, last_review FROM fsrs_cards";
const EBISU_CARD_COLUMNS: &str =
    "SELECT question_key, alpha, beta, t, total_reviews, last_review FROM ebisu_cards";

/// Raw column values, decoded outside the rusqlite row callback.
struct FsrsCardRow {
    key: String,
    difficulty: f64,
    stability: f64,
    reps: i64,
    lapses: i64,
    state: i64,
    interval_days: f64,
    due: String,
    last_review: String,
}

impl FsrsCardRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            key: row.get(0)?,
            difficulty: row.get(1)?,
            stability: row.get(2)?,
            reps: row.get(3)?,
            lapses: row.get(4)?,
            state: row.get(5)?,
            interval_days: row.get(6)?,
            due: row.get(7)?,
            last_review: row.get(8)?,
        })
    }
}

struct EbisuCardRow {
    key: String,
    alpha: f64,
    beta: f64,
    half_life: f64,
    total_reviews: i64,
    last_review: String,
}

impl EbisuCardRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            key: row.get(0)?,
            alpha: row.get(1)?,
            beta: row.get(2)?,
            half_life: row.get(3)?,
            total_reviews: row.get(4)?,
            last_review: row.get(5)?,
        })
    }
}

enum StoredCard {
    Fsrs(FsrsCardRow),
    Ebisu(EbisuCardRow),
}

impl StoredCard {
    fn key(&self) -> &str {
        match self {
            StoredCard::Fsrs(row) => &row.key,
            StoredCard::Ebisu(row) => &row.key,
        }
    }

    fn decode(self) -> Result<Card> {
        let key = self.key().to_string();
        self.try_decode().inspect_err(|e| {
            warn!(key = %key, error = %e, "failed to decode stored card");
        })
    }

    fn try_decode(self) -> Result<Card> {
        match self {
            StoredCard::Fsrs(row) => {
                let status = CardStatus::from_code(row.state).ok_or_else(|| {
                    DbError::InvalidData(format!("unknown card state {}", row.state))
                })?;
                Ok(Card {
                    last_review: timestamp::from_sql(&row.last_review)?,
                    state: SchedulingState::Fsrs(FsrsState {
                        status,
                        difficulty: row.difficulty,
                        stability: row.stability,
                        reps: count(row.reps)?,
                        lapses: count(row.lapses)?,
                        interval_days: row.interval_days,
                        due: timestamp::from_sql(&row.due)?,
                    }),
                    key: row.key,
                })
            }
            StoredCard::Ebisu(row) => Ok(Card {
                last_review: timestamp::from_sql(&row.last_review)?,
                state: SchedulingState::Ebisu(EbisuState {
                    alpha: row.alpha,
                    beta: row.beta,
                    half_life: row.half_life,
                    total_reviews: count(row.total_reviews)?,
                }),
                key: row.key,
            }),
        }
    }
}

struct FsrsReviewRow {
    key: String,
    review_time: String,
    correctness: f64,
    rating: u8,
    state: i64,
    stability: f64,
    difficulty: f64,
    interval_days: f64,
    due: String,
}

impl FsrsReviewRow {
    fn decode(self) -> Result<ReviewRecord> {
        let rating = Rating::from_value(self.rating)
            .ok_or_else(|| DbError::InvalidData(format!("unknown rating {}", self.rating)))?;
        let status = CardStatus::from_code(self.state)
            .ok_or_else(|| DbError::InvalidData(format!("unknown card state {}", self.state)))?;
        Ok(ReviewRecord {
            timestamp: timestamp::from_sql(&self.review_time)?,
            correctness: self.correctness,
            input: ReviewInput::Rating(rating),
            snapshot: ReviewSnapshot::Fsrs {
                status,
                stability: self.stability,
                difficulty: self.difficulty,
                interval_days: self.interval_days,
                due: timestamp::from_sql(&self.due)?,
            },
            key: self.key,
        })
    }
}

struct EbisuReviewRow {
    key: String,
    review_time: String,
    correctness: f64,
    success: f64,
    recall_probability: f64,
    alpha: f64,
    beta: f64,
    half_life: f64,
}

impl EbisuReviewRow {
    fn decode(self) -> Result<ReviewRecord> {
        Ok(ReviewRecord {
            timestamp: timestamp::from_sql(&self.review_time)?,
            correctness: self.correctness,
            input: ReviewInput::Success(self.success),
            snapshot: ReviewSnapshot::Ebisu {
                recall_probability: self.recall_probability,
                alpha: self.alpha,
                beta: self.beta,
                half_life: self.half_life,
            },
            key: self.key,
        })
    }
}

fn count(value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| DbError::InvalidData(format!("negative count {value}")))
}
