//! Error types for srs-core.

use thiserror::Error;

/// Result type alias using SrsError.
pub type Result<T> = std::result::Result<T, SrsError>;

/// Errors raised by the scheduling engine and its storage collaborators.
#[derive(Debug, Error)]
pub enum SrsError {
    /// Correctness outside [0, 100] or a malformed knob value.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A stored card carries state for the other algorithm.
    #[error("card {key} does not hold {expected} state")]
    StateMismatch { key: String, expected: &'static str },

    #[error("numeric failure: {0}")]
    Numeric(String),

    /// Storage failures are passed through untouched.
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SrsError {
    /// Wrap any storage-layer error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage(Box::new(err))
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = SrsError::storage(io);
        assert_eq!(err.to_string(), "storage error: disk on fire");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn mismatch_message_names_algorithm() {
        let err = SrsError::StateMismatch {
            key: "q1".to_string(),
            expected: "fsrs",
        };
        assert_eq!(err.to_string(), "card q1 does not hold fsrs state");
    }
}
