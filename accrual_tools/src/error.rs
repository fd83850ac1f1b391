use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AccrualApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST request: {0}")]
    RestRequestError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Too many requests. Retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },
    #[error("The accrual service is unavailable. Error {status}")]
    Unavailable { status: u16 },
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Gave up after {attempts} attempts. {last}")]
    RetriesExhausted { attempts: usize, last: Box<AccrualApiError> },
}

impl AccrualApiError {
    /// Transport failures, rate limiting and 5xx responses may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RestRequestError(_) | Self::RateLimited { .. } | Self::Unavailable { .. })
    }
}
