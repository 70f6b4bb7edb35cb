//! Error types for feedback store operations.
//!
//! Validation failures are raised before anything is written; persistence
//! failures wrap the underlying SQLite/lock error. The `FeedbackStore`
//! boundary methods log these and degrade to empty results, the `try_*`
//! methods hand them to the caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid feedback: {0}")]
    Validation(String),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] anyhow::Error),

    #[error("Metadata serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Rendering prompt guidance failed: {0}")]
    Template(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Persistence(err.into())
    }
}

impl StoreError {
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
