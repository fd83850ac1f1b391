use crate::db_types::{Order, Points};

/// The result of trying to register an order number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOrderResult {
    /// The number was fresh and now belongs to the caller.
    Inserted(Order),
    /// The number was already registered. The order may belong to anyone.
    AlreadyExists(Order),
}

/// What changed when an accrual outcome was applied to an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccrualApplied {
    pub order: Order,
    /// The amount credited to the owner's balance, if any.
    pub credited: Option<Points>,
}
