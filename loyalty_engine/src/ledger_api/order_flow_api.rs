//! The order registrar.
//!
//! Order numbers are a shared namespace across all users, so the first user to submit a number owns it for good.
//! The ownership decision rides on the backend's atomic [`LedgerDatabase::insert_order`], never on a separate
//! existence check, so two users racing with the same fresh number cannot both win.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::OrderNumber,
    ledger_api::{errors::OrderFlowError, order_objects::SubmitOrderResult},
    traits::{InsertOrderResult, LedgerDatabase},
};

pub struct OrderFlowApi<B> {
    db: B,
}

impl<B: Debug> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.db)
    }
}

impl<B> OrderFlowApi<B>
where B: LedgerDatabase
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Submits `number` on behalf of `user_id`.
    ///
    /// The number is Luhn-checked before the ledger is touched. Re-submitting a number you already own is not an
    /// error, and does not create a second order.
    pub async fn submit_order(&self, user_id: i64, number: &str) -> Result<SubmitOrderResult, OrderFlowError> {
        let number = number.parse::<OrderNumber>().map_err(|e| {
            debug!("🔄️ User #{user_id} submitted an invalid order number. {e}");
            e
        })?;
        let result = match self.db.insert_order(user_id, &number).await? {
            InsertOrderResult::Inserted(order) => {
                info!("🔄️ Order {number} registered to user #{user_id}");
                SubmitOrderResult::Accepted(order)
            },
            InsertOrderResult::AlreadyExists(order) if order.user_id == user_id => {
                debug!("🔄️ User #{user_id} re-submitted order {number}");
                SubmitOrderResult::AlreadyOwnedBySameUser(order)
            },
            InsertOrderResult::AlreadyExists(order) => {
                warn!("🔄️ User #{user_id} tried to submit order {number}, which belongs to user #{}", order.user_id);
                SubmitOrderResult::OwnedByOther
            },
        };
        Ok(result)
    }
}
