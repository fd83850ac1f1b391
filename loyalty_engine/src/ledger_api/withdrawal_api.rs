//! The withdrawal processor.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewWithdrawal, OrderNumber, Points, Withdrawal},
    ledger_api::errors::WithdrawalError,
    traits::LedgerDatabase,
};

pub struct WithdrawalApi<B> {
    db: B,
}

impl<B: Debug> Debug for WithdrawalApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WithdrawalApi ({:?})", self.db)
    }
}

impl<B> WithdrawalApi<B>
where B: LedgerDatabase
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Spends `sum` points from the user's balance against `number`.
    ///
    /// The order number is Luhn-checked before anything else. It does not have to be an order the user submitted
    /// for accrual. On [`WithdrawalError::InsufficientBalance`] the balance and withdrawal history are unchanged.
    pub async fn withdraw(&self, user_id: i64, number: &str, sum: Points) -> Result<Withdrawal, WithdrawalError> {
        let number = number.parse::<OrderNumber>()?;
        if !sum.is_positive() {
            return Err(WithdrawalError::InvalidAmount(sum));
        }
        let withdrawal = self.db.withdraw(user_id, NewWithdrawal::new(number, sum)).await.map_err(|e| {
            debug!("💸️ Withdrawal of {sum} by user #{user_id} was declined. {e}");
            WithdrawalError::from(e)
        })?;
        info!("💸️ User #{user_id} withdrew {sum} points against order {}", withdrawal.order_number);
        Ok(withdrawal)
    }
}
