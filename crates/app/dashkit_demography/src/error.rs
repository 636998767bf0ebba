//! Data access errors.

use dashkit_core::HandlerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Dataset I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dataset format error: {0}")]
    Format(#[from] serde_json::Error),
}

impl From<QueryError> for HandlerError {
    fn from(e: QueryError) -> Self {
        HandlerError::failed(e)
    }
}
