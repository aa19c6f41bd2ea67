//! SQLite schema definitions.
//!
//! Every statement is idempotent and only touches `fsrs_*` / `ebisu_*`
//! tables, so a database shared with other data is left alone.

/// Complete schema for both algorithms.
pub const SCHEMA: &str = r#"
-- FSRS card state
CREATE TABLE IF NOT EXISTS fsrs_cards (
    question_key TEXT PRIMARY KEY,
    difficulty REAL NOT NULL,
    stability REAL NOT NULL,
    reps INTEGER NOT NULL,
    lapses INTEGER NOT NULL,
    state INTEGER NOT NULL,
    interval_days REAL NOT NULL,
    due TEXT NOT NULL,
    last_review TEXT NOT NULL
);

-- FSRS review history (append-only)
CREATE TABLE IF NOT EXISTS fsrs_reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    question_key TEXT NOT NULL,
    review_time TEXT NOT NULL,
    correctness REAL NOT NULL,
    rating INTEGER NOT NULL,
    state INTEGER NOT NULL,
    stability REAL NOT NULL,
    difficulty REAL NOT NULL,
    interval_days REAL NOT NULL,
    due TEXT NOT NULL
);

-- Ebisu card model; t is the half-life in hours
CREATE TABLE IF NOT EXISTS ebisu_cards (
    question_key TEXT PRIMARY KEY,
    alpha REAL NOT NULL,
    beta REAL NOT NULL,
    t REAL NOT NULL,
    total_reviews INTEGER NOT NULL,
    last_review TEXT NOT NULL
);

-- Ebisu review history (append-only)
CREATE TABLE IF NOT EXISTS ebisu_reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    question_key TEXT NOT NULL,
    review_time TEXT NOT NULL,
    correctness REAL NOT NULL,
    success REAL NOT NULL,
    recall_probability REAL NOT NULL,
    alpha REAL NOT NULL,
    beta REAL NOT NULL,
    t REAL NOT NULL
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_fsrs_cards_due ON fsrs_cards(due);
CREATE INDEX IF NOT EXISTS idx_fsrs_reviews_key ON fsrs_reviews(question_key);
CREATE INDEX IF NOT EXISTS idx_ebisu_reviews_key ON ebisu_reviews(question_key);
"#;
