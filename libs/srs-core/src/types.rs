//! Core types shared by both scheduling algorithms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// FSRS card learning status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    New,
    Learning,
    Review,
    Relearn,
}

impl Default for CardStatus {
    fn default() -> Self {
        Self::New
    }
}

impl CardStatus {
    /// Integer code used by the storage layer.
    pub fn to_code(self) -> i64 {
        match self {
            Self::New => 0,
            Self::Learning => 1,
            Self::Review => 2,
            Self::Relearn => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::New),
            1 => Some(Self::Learning),
            2 => Some(Self::Review),
            3 => Some(Self::Relearn),
            _ => None,
        }
    }

    /// Learning and relearning cards are allowed sub-day intervals.
    pub fn is_short_term(self) -> bool {
        matches!(self, Self::Learning | Self::Relearn)
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::New => "New",
            Self::Learning => "Learning",
            Self::Review => "Review",
            Self::Relearn => "Relearn",
        };
        f.write_str(name)
    }
}

/// Four-level FSRS rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    /// Convert to 4-point numeric value (1-4).
    pub fn to_value(self) -> u8 {
        match self {
            Self::Again => 1,
            Self::Hard => 2,
            Self::Good => 3,
            Self::Easy => 4,
        }
    }

    /// Create from 4-point numeric value.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Again),
            2 => Some(Self::Hard),
            3 => Some(Self::Good),
            4 => Some(Self::Easy),
            _ => None,
        }
    }
}

/// Which scheduling algorithm a store or scheduler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Fsrs,
    Ebisu,
}

impl Default for Algorithm {
    fn default() -> Self {
        Self::Fsrs
    }
}

impl Algorithm {
    /// Get the algorithm name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fsrs => "fsrs",
            Self::Ebisu => "ebisu",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fsrs" => Ok(Self::Fsrs),
            "ebisu" => Ok(Self::Ebisu),
            other => Err(format!("unknown algorithm: {other}")),
        }
    }
}

/// FSRS memory state of a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsrsState {
    pub status: CardStatus,
    pub difficulty: f64,
    /// Days.
    pub stability: f64,
    pub reps: u32,
    pub lapses: u32,
    pub interval_days: f64,
    pub due: DateTime<Utc>,
}

/// Ebisu Beta/half-life model of a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EbisuState {
    pub alpha: f64,
    pub beta: f64,
    /// Hours.
    pub half_life: f64,
    pub total_reviews: u32,
}

/// Algorithm-specific scheduling state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum SchedulingState {
    Fsrs(FsrsState),
    Ebisu(EbisuState),
}

impl SchedulingState {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Fsrs(_) => Algorithm::Fsrs,
            Self::Ebisu(_) => Algorithm::Ebisu,
        }
    }

    pub fn as_fsrs(&self) -> Option<&FsrsState> {
        match self {
            Self::Fsrs(state) => Some(state),
            Self::Ebisu(_) => None,
        }
    }

    pub fn as_ebisu(&self) -> Option<&EbisuState> {
        match self {
            Self::Ebisu(state) => Some(state),
            Self::Fsrs(_) => None,
        }
    }

    /// Due timestamp persisted alongside the state, if the algorithm stores one.
    pub fn stored_due(&self) -> Option<DateTime<Utc>> {
        self.as_fsrs().map(|state| state.due)
    }

    /// Number of answers folded into this state.
    pub fn review_count(&self) -> u32 {
        match self {
            Self::Fsrs(state) => state.reps,
            Self::Ebisu(state) => state.total_reviews,
        }
    }
}

/// Persistent scheduling state for one learning item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub key: String,
    pub last_review: DateTime<Utc>,
    pub state: SchedulingState,
}

/// Strategy input derived from a correctness percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewInput {
    Rating(Rating),
    /// Continuous success in [0.0, 1.0].
    Success(f64),
}

/// Post-update values recorded with each review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum ReviewSnapshot {
    Fsrs {
        status: CardStatus,
        stability: f64,
        difficulty: f64,
        interval_days: f64,
        due: DateTime<Utc>,
    },
    Ebisu {
        /// Recall predicted at the moment of the review, before the update.
        recall_probability: f64,
        alpha: f64,
        beta: f64,
        half_life: f64,
    },
}

/// Append-only record of one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub key: String,
    pub timestamp: DateTime<Utc>,
    pub correctness: f64,
    pub input: ReviewInput,
    pub snapshot: ReviewSnapshot,
}
