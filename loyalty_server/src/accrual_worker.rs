//! The background job that keeps local orders in step with the accrual service.
//!
//! [`AccrualService`] adapts the HTTP client in `accrual_tools` to the engine's [`AccrualSource`] contract. The worker
//! itself runs one reconciliation pass per tick. Passes never overlap: a tick that arrives while a pass is still
//! running is skipped. When the accrual service rate limits a pass, no further pass starts until the back-off it
//! asked for has elapsed.
use std::time::Duration;

use accrual_tools::{AccrualApi, AccrualApiError, AccrualOrder, AccrualStatus};
use log::*;
use loyalty_engine::{
    db_types::OrderNumber,
    traits::{AccrualReport, AccrualSource, AccrualSourceError, ExternalAccrualStatus, LedgerDatabase},
    ReconciliationApi,
    SqliteDatabase,
};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

const MIN_PASS_DURATION: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct AccrualService {
    api: AccrualApi,
}

impl AccrualService {
    pub fn new(api: AccrualApi) -> Self {
        Self { api }
    }
}

impl AccrualSource for AccrualService {
    async fn fetch_accrual(&self, number: &OrderNumber) -> Result<Option<AccrualReport>, AccrualSourceError> {
        let order = self.api.fetch_order_with_retry(number.as_str()).await.map_err(source_error)?;
        Ok(order.map(|o| to_report(number, o)))
    }
}

fn to_report(number: &OrderNumber, order: AccrualOrder) -> AccrualReport {
    if order.order != number.as_str() {
        warn!("🌐️ Asked the accrual service about {number}, but the answer was for {}", order.order);
    }
    let status = match order.status {
        AccrualStatus::Registered => ExternalAccrualStatus::Registered,
        AccrualStatus::Processing => ExternalAccrualStatus::Processing,
        AccrualStatus::Invalid => ExternalAccrualStatus::Invalid,
        AccrualStatus::Processed => ExternalAccrualStatus::Processed,
    };
    AccrualReport::new(status, order.accrual)
}

fn source_error(e: AccrualApiError) -> AccrualSourceError {
    match e {
        AccrualApiError::RateLimited { retry_after } => {
            AccrualSourceError::RateLimited(retry_after.unwrap_or_default())
        },
        AccrualApiError::JsonError(msg) => AccrualSourceError::MalformedResponse(msg),
        AccrualApiError::RetriesExhausted { last, .. } => source_error(*last),
        e => AccrualSourceError::Unavailable(e.to_string()),
    }
}

/// Runs reconciliation passes every `poll_interval` until `shutdown` flips to `true` or its sender is dropped.
///
/// Each pass is given one poll interval (and at least a second) to finish. Orders it does not get to are picked up
/// by the next pass.
pub async fn run_accrual_worker<B, S>(
    api: ReconciliationApi<B>,
    source: S,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) where
    B: LedgerDatabase,
    S: AccrualSource,
{
    let mut timer = tokio::time::interval(poll_interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let budget = poll_interval.max(MIN_PASS_DURATION);
    let mut resume_after: Option<Instant> = None;
    info!("🕰️ Accrual worker started. Polling every {} ms", poll_interval.as_millis());
    loop {
        tokio::select! {
            _ = timer.tick() => {},
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            },
        }
        if *shutdown.borrow() {
            break;
        }
        if resume_after.is_some_and(|t| Instant::now() < t) {
            trace!("🕰️ Still backing off from the accrual service");
            continue;
        }
        let deadline = Instant::now() + budget;
        let result = api.reconcile_once(&source, Some(deadline)).await;
        resume_after = result.as_ref().ok().and_then(|s| s.resume_after);
        match result {
            Ok(summary) if summary.total() == 0 => trace!("🕰️ No orders awaiting accrual"),
            Ok(summary) => info!(
                "🕰️ Reconciliation pass complete. {} updated ({} credited), {} unchanged, {} failed, {} deferred",
                summary.updated, summary.credited, summary.skipped, summary.failed, summary.deferred
            ),
            Err(e) => error!("🕰️ Could not run reconciliation pass. {e}"),
        }
    }
    info!("🕰️ Accrual worker stopped");
}

/// Starts the accrual worker on the runtime. The returned handle completes once `shutdown` is signalled.
pub fn start_accrual_worker(
    db: SqliteDatabase,
    source: AccrualService,
    poll_interval: Duration,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let api = ReconciliationApi::new(db);
        run_accrual_worker(api, source, poll_interval, shutdown).await;
    })
}
