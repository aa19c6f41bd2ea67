//! SQLite storage for cards and review history.

pub mod error;
pub mod repository;
pub mod schema;
pub mod stats;
pub mod timestamp;

pub use error::DbError;
pub use repository::SqliteStore;
pub use stats::{CardSummary, EbisuStats, FsrsStats, StatsRepository, StoreStats};
