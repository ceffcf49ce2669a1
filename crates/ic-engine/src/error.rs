//! Engine error types.
//!
//! These never cross the public `SmartParser` surface; the boundary turns
//! them into confidence-0 responses.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store error: {0}")]
    Store(String),

    #[error("lookup cancelled")]
    Cancelled,

    #[error("lookup deadline exceeded")]
    DeadlineExceeded,

    #[error("configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// Whether retrying the same call could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Store(_) | Self::Cancelled | Self::DeadlineExceeded
        )
    }
}

/// Convenience alias for engine results.
pub type EngineResult<T> = Result<T, EngineError>;
