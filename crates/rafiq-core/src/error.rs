//! Error taxonomy shared by every engagement operation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngagementError {
    /// Malformed or missing input; the caller's fault.
    #[error("validation error: {0}")]
    Validation(String),

    /// The referenced story, goal, or link is absent or no longer visible.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller does not own the record it tried to mutate.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A unique key already exists.
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// The persistence layer failed. Not retried.
    #[error("store failure: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl EngagementError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn duplicate(msg: impl Into<String>) -> Self {
        Self::Duplicate(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, EngagementError>;
