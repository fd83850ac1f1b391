use thiserror::Error;

use crate::{
    db_types::{AccrualUpdate, NewWithdrawal, Order, OrderNumber, Points, Withdrawal},
    traits::{data_objects::AccrualApplied, AccountApiError, AccountManagement, InsertOrderResult},
};

/// The write side of the ledger.
///
/// Every method is atomic. Implementations must guarantee that:
/// * an order number is owned by at most one user, and the first insert wins;
/// * a status change and the balance credit it carries are committed together;
/// * a withdrawal debit is a compare-and-swap on the balance row, so `current` never drops below zero no matter how
///   many debits and credits race for the same user.
#[allow(async_fn_in_trait)]
pub trait LedgerDatabase: Clone + AccountManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Registers `number` for `user_id` unless it already exists. The existence check and the insert happen in one
    /// step, so concurrent submissions of the same fresh number produce exactly one `Inserted` result.
    ///
    /// If the number exists, the existing order is returned untouched, whoever owns it.
    async fn insert_order(&self, user_id: i64, number: &OrderNumber) -> Result<InsertOrderResult, LedgerError>;

    /// Fetches every order that is still waiting on the accrual service, i.e. in `New` or `Processing` state,
    /// oldest first.
    async fn fetch_pending_orders(&self) -> Result<Vec<Order>, LedgerError>;

    /// Writes the reconciliation outcome for `number`, and credits the owner's balance if the update carries a
    /// reward and the new status is `Processed`. Both writes commit together.
    ///
    /// Orders that already reached a final state are left alone and `None` is returned, so applying the same
    /// outcome twice never double-credits.
    async fn apply_accrual(
        &self,
        number: &OrderNumber,
        update: AccrualUpdate,
    ) -> Result<Option<AccrualApplied>, LedgerError>;

    /// Debits `withdrawal.sum` from the user's balance and records the withdrawal, in one transaction.
    ///
    /// Fails with [`LedgerError::InsufficientBalance`] if `current` is smaller than the sum. In that case nothing is
    /// written.
    async fn withdraw(&self, user_id: i64, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError>;

    /// Closes the database connection pool.
    async fn close(&mut self) -> Result<(), LedgerError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("We have an internal database engine error. {0}")]
    DatabaseError(String),
    #[error("The storage operation did not complete within {0} ms")]
    Timeout(u128),
    #[error("User {0} does not exist")]
    UserNotFound(i64),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("Insufficient balance. {requested} points were requested, but only {available} are available.")]
    InsufficientBalance { requested: Points, available: Points },
    #[error("The balance of user {0} cannot hold any more points")]
    BalanceOverflow(i64),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

impl From<AccountApiError> for LedgerError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::Timeout(ms) => Self::Timeout(ms),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}
