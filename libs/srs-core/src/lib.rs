//! Spaced repetition scheduling engine.
//!
//! Provides:
//! - Correctness mapping from 0-100 percentages to algorithm input
//! - FSRS and Ebisu scheduling strategies behind one trait
//! - A storage trait with an in-memory implementation
//! - The `Scheduler` facade (`answer`, `next`, `next_due_date`)

pub mod algorithm;
pub mod error;
pub mod knobs;
pub mod mapper;
pub mod scheduler;
pub mod store;
pub mod types;

pub use algorithm::{build_strategy, ScheduledReview, SchedulingStrategy, TieBreak};
pub use error::{Result, SrsError};
pub use knobs::{EbisuKnobs, FsrsKnobs, StrategyConfig};
pub use scheduler::Scheduler;
pub use store::{CardStore, MemoryStore};
pub use types::{
    Algorithm, Card, CardStatus, EbisuState, FsrsState, Rating, ReviewInput, ReviewRecord,
    ReviewSnapshot, SchedulingState,
};
