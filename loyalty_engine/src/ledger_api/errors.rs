use thiserror::Error;

use crate::{
    db_types::{InvalidOrderNumber, Points},
    traits::{AccrualSourceError, LedgerError},
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("{0}")]
    InvalidOrderNumber(#[from] InvalidOrderNumber),
    #[error("{0}")]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Clone, Error)]
pub enum WithdrawalError {
    #[error("{0}")]
    InvalidOrderNumber(#[from] InvalidOrderNumber),
    #[error("A withdrawal must be for a positive amount, but {0} was requested")]
    InvalidAmount(Points),
    #[error("Insufficient balance. {requested} points were requested, but only {available} are available.")]
    InsufficientBalance { requested: Points, available: Points },
    #[error("{0}")]
    Ledger(LedgerError),
}

impl From<LedgerError> for WithdrawalError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientBalance { requested, available } => {
                Self::InsufficientBalance { requested, available }
            },
            e => Self::Ledger(e),
        }
    }
}

/// Why a single order could not be reconciled. Only a rate-limit answer ends the pass early.
#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    #[error("{0}")]
    Source(#[from] AccrualSourceError),
    #[error("{0}")]
    Ledger(#[from] LedgerError),
}
