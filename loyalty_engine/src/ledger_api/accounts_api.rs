//! Unifies API for reading user accounts.

use std::fmt::Debug;

use log::trace;

use crate::{
    db_types::{Balance, Order, OrderNumber, User, Withdrawal},
    traits::{AccountApiError, AccountManagement},
};

/// The `AccountApi` provides read-only views of a user's orders, balance and withdrawals.
pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn user_by_id(&self, user_id: i64) -> Result<Option<User>, AccountApiError> {
        self.db.fetch_user(user_id).await
    }

    pub async fn order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, AccountApiError> {
        self.db.fetch_order_by_number(number).await
    }

    /// All orders the user has submitted, most recently uploaded first.
    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, AccountApiError> {
        let orders = self.db.fetch_orders_for_user(user_id).await?;
        trace!("Fetched {} orders for user #{user_id}", orders.len());
        Ok(orders)
    }

    /// All withdrawals the user has made, most recently processed first.
    pub async fn withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, AccountApiError> {
        let withdrawals = self.db.fetch_withdrawals_for_user(user_id).await?;
        trace!("Fetched {} withdrawals for user #{user_id}", withdrawals.len());
        Ok(withdrawals)
    }

    /// The user's current and lifetime-withdrawn points. Every registered user has a balance, so a missing one is
    /// reported as [`AccountApiError::UserNotFound`].
    pub async fn balance_for_user(&self, user_id: i64) -> Result<Balance, AccountApiError> {
        self.db.fetch_balance(user_id).await?.ok_or(AccountApiError::UserNotFound(user_id))
    }
}
