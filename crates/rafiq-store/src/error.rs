use std::time::Duration;

use rafiq_core::EngagementError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("store busy: no connection within {0:?}")]
    Timeout(Duration),
}

impl From<StoreError> for EngagementError {
    fn from(e: StoreError) -> Self {
        EngagementError::Store(Box::new(e))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
