use std::{fmt::Display, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{OrderNumber, Points};

/// The order states reported by the external accrual service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExternalAccrualStatus {
    /// The accrual service knows about the order but has not started on it.
    Registered,
    Processing,
    Invalid,
    Processed,
}

impl Display for ExternalAccrualStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Registered => "REGISTERED",
            Self::Processing => "PROCESSING",
            Self::Invalid => "INVALID",
            Self::Processed => "PROCESSED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccrualReport {
    pub status: ExternalAccrualStatus,
    pub accrual: Option<Points>,
}

impl AccrualReport {
    pub fn new(status: ExternalAccrualStatus, accrual: Option<Points>) -> Self {
        Self { status, accrual }
    }
}

/// Anything that can tell the reconciler what the external accrual service thinks of an order.
#[allow(async_fn_in_trait)]
pub trait AccrualSource {
    /// Returns `Ok(None)` if the service has no record of the order yet.
    ///
    /// Implementations are expected to retry transient failures themselves. An error returned from here is logged by
    /// the reconciler and the order is retried on the next pass.
    async fn fetch_accrual(&self, number: &OrderNumber) -> Result<Option<AccrualReport>, AccrualSourceError>;
}

#[derive(Debug, Clone, Error)]
pub enum AccrualSourceError {
    #[error("The accrual service is unavailable. {0}")]
    Unavailable(String),
    #[error("The accrual service asked us to back off for {0:?}")]
    RateLimited(Duration),
    #[error("The accrual service returned a malformed response. {0}")]
    MalformedResponse(String),
    #[error("The accrual service did not respond in time")]
    Timeout,
}
