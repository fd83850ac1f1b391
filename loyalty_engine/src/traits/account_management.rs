use thiserror::Error;

use crate::db_types::{Balance, Order, OrderNumber, User, Withdrawal};

/// Read-only projections of the ledger.
///
/// None of these methods have side effects. Listings are sorted most-recent first. An empty vector means that the
/// user has no records, which is distinct from an error.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AccountApiError>;

    async fn fetch_user_by_login(&self, login: &str) -> Result<Option<User>, AccountApiError>;

    /// All orders owned by the user, most recently uploaded first.
    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, AccountApiError>;

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, AccountApiError>;

    /// The user's balance. Both fields come from the same committed row version.
    async fn fetch_balance(&self, user_id: i64) -> Result<Option<Balance>, AccountApiError>;

    /// All withdrawals made by the user, most recently processed first.
    async fn fetch_withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, AccountApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("The storage operation did not complete within {0} ms")]
    Timeout(u128),
    #[error("User {0} does not exist")]
    UserNotFound(i64),
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}
