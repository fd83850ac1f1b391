//! The accrual reconciler.
//!
//! Orders move through `NEW → PROCESSING → {INVALID | PROCESSED}`. A reconciliation pass asks the accrual service
//! about every order that is still `NEW` or `PROCESSING` and writes back whatever has changed.
//!
//! A pass is tolerant of partial failure. If the accrual service cannot answer for one order, or the ledger refuses
//! one write, that order is logged, counted as failed and picked up again on the next pass. Only a failure to read
//! the list of pending orders aborts the pass. A rate-limit answer from the accrual service ends the pass early: the
//! remaining orders are deferred and the summary carries the instant after which the service may be asked again.
//!
//! Scheduling is the caller's business. `reconcile_once` runs exactly one pass, and takes an optional deadline so
//! that one slow answer cannot hold up the rest of the batch indefinitely.
use std::fmt::Debug;

use log::*;
use tokio::time::{timeout_at, Instant};

use crate::{
    db_types::{AccrualUpdate, Order, OrderStatusType, Points},
    ledger_api::{errors::ReconcileError, order_objects::ReconcileSummary},
    traits::{AccrualSource, AccrualSourceError, ExternalAccrualStatus, LedgerDatabase, LedgerError},
};

enum OrderOutcome {
    Updated { credited: Option<Points> },
    Skipped,
}

pub struct ReconciliationApi<B> {
    db: B,
}

impl<B: Debug> Debug for ReconciliationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi ({:?})", self.db)
    }
}

impl<B> ReconciliationApi<B>
where B: LedgerDatabase
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Runs one reconciliation pass over all pending orders.
    ///
    /// Once `deadline` passes, no new orders are started and the remainder are counted as deferred. An outbound call
    /// that is still running at the deadline is abandoned and counted as failed.
    pub async fn reconcile_once<S: AccrualSource>(
        &self,
        source: &S,
        deadline: Option<Instant>,
    ) -> Result<ReconcileSummary, LedgerError> {
        let orders = self.db.fetch_pending_orders().await?;
        let mut summary = ReconcileSummary::default();
        let total = orders.len();
        trace!("🕰️ {total} orders are awaiting accrual");
        for (i, order) in orders.iter().enumerate() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                summary.deferred = total - i;
                warn!("🕰️ Reconciliation deadline reached. {} orders deferred to the next pass", summary.deferred);
                break;
            }
            match self.reconcile_order(source, order, deadline).await {
                Ok(OrderOutcome::Updated { credited }) => {
                    summary.updated += 1;
                    if let Some(amount) = credited {
                        info!("🕰️ Order {} credited {amount} points to user #{}", order.number, order.user_id);
                        summary.credited += 1;
                    }
                },
                Ok(OrderOutcome::Skipped) => summary.skipped += 1,
                Err(ReconcileError::Source(AccrualSourceError::RateLimited(wait))) => {
                    summary.failed += 1;
                    summary.deferred = total - i - 1;
                    summary.resume_after = Some(Instant::now() + wait);
                    warn!(
                        "🕰️ The accrual service is rate limiting us. Backing off for {wait:?} with {} orders deferred",
                        summary.deferred
                    );
                    break;
                },
                Err(e) => {
                    warn!("🕰️ Could not reconcile order {}. It will be retried. {e}", order.number);
                    summary.failed += 1;
                },
            }
        }
        Ok(summary)
    }

    async fn reconcile_order<S: AccrualSource>(
        &self,
        source: &S,
        order: &Order,
        deadline: Option<Instant>,
    ) -> Result<OrderOutcome, ReconcileError> {
        let fetch = source.fetch_accrual(&order.number);
        let report = match deadline {
            Some(d) => timeout_at(d, fetch).await.map_err(|_| AccrualSourceError::Timeout)??,
            None => fetch.await?,
        };
        let Some(report) = report else {
            trace!("🕰️ The accrual service does not know order {} yet", order.number);
            return Ok(OrderOutcome::Skipped);
        };
        if let Some(amount) = report.accrual.filter(|a| a.is_negative()) {
            return Err(AccrualSourceError::MalformedResponse(format!("negative accrual of {amount}")).into());
        }
        let update = match report.status {
            ExternalAccrualStatus::Registered => return Ok(OrderOutcome::Skipped),
            ExternalAccrualStatus::Processing if order.status == OrderStatusType::Processing => {
                return Ok(OrderOutcome::Skipped);
            },
            ExternalAccrualStatus::Processing => AccrualUpdate::processing(),
            ExternalAccrualStatus::Invalid => {
                if let Some(amount) = report.accrual {
                    warn!("🕰️ Order {} is INVALID but came with an accrual of {amount}. Ignoring it.", order.number);
                }
                AccrualUpdate::invalid()
            },
            ExternalAccrualStatus::Processed => AccrualUpdate::processed(report.accrual),
        };
        match self.db.apply_accrual(&order.number, update).await? {
            Some(applied) => {
                debug!("🕰️ Order {} moved from {} to {}", order.number, order.status, applied.order.status);
                Ok(OrderOutcome::Updated { credited: applied.credited })
            },
            // Another pass got there first
            None => Ok(OrderOutcome::Skipped),
        }
    }
}
