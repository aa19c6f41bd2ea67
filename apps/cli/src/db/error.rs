//! Database error types.

use srs_core::{Algorithm, SrsError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("{store} store cannot hold {found} state")]
    AlgorithmMismatch { store: Algorithm, found: Algorithm },
}

impl From<DbError> for SrsError {
    fn from(err: DbError) -> Self {
        SrsError::storage(err)
    }
}
