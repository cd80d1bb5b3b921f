use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Invalid stat delta: {0}")]
    InvalidDelta(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Inconsistent state: {0}")]
    InconsistentState(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<StoreError> for StatsError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => StatsError::StoreUnavailable(msg),
            StoreError::Corrupt(msg) => StatsError::InconsistentState(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_keep_their_message() {
        let err: StatsError = StoreError::Unavailable("connection refused".into()).into();
        assert!(matches!(err, StatsError::StoreUnavailable(ref m) if m == "connection refused"));

        let err: StatsError = StoreError::Corrupt("unknown game 'cs2'".into()).into();
        assert!(matches!(err, StatsError::InconsistentState(_)));
        assert_eq!(err.to_string(), "Inconsistent state: unknown game 'cs2'");
    }
}
