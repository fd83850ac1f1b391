use tokio::time::Instant;

use crate::db_types::Order;

/// The outcome of submitting an order number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOrderResult {
    /// The number was fresh. It is now registered to the caller with status `NEW`.
    Accepted(Order),
    /// The caller already owns this number. Nothing changed.
    AlreadyOwnedBySameUser(Order),
    /// Another user registered this number first.
    OwnedByOther,
}

/// Tally of a single reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Orders whose status changed.
    pub updated: usize,
    /// Orders that credited a balance. These are also counted in `updated`.
    pub credited: usize,
    /// Orders the accrual service has not started on yet.
    pub skipped: usize,
    /// Orders that could not be fetched or written. They are retried next pass.
    pub failed: usize,
    /// Orders not attempted because the pass ran out of time or was rate limited.
    pub deferred: usize,
    /// Set when the accrual service asked us to back off. No pass should start before this instant.
    pub resume_after: Option<Instant>,
}

impl ReconcileSummary {
    pub fn total(&self) -> usize {
        self.updated + self.skipped + self.failed + self.deferred
    }
}
