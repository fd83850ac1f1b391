use std::{fmt::Debug, sync::Arc, time::Duration};

use backon::{BackoffBuilder, ExponentialBuilder};
use log::*;
use reqwest::{
    header::{HeaderValue, RETRY_AFTER},
    Client,
    StatusCode,
};

use crate::{AccrualApiError, AccrualConfig, AccrualOrder};

/// A client for the accrual calculation service.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone)]
pub struct AccrualApi {
    config: AccrualConfig,
    client: Arc<Client>,
}

impl Debug for AccrualApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccrualApi ({})", self.config.address)
    }
}

impl AccrualApi {
    pub fn new(config: AccrualConfig) -> Result<Self, AccrualApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AccrualApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &AccrualConfig {
        &self.config
    }

    pub fn url(&self, number: &str) -> String {
        format!("{}/api/orders/{number}", self.config.address)
    }

    /// Makes a single request for `number`. `Ok(None)` means the service has not registered the order.
    pub async fn fetch_order(&self, number: &str) -> Result<Option<AccrualOrder>, AccrualApiError> {
        let url = self.url(number);
        trace!("🌐️ Sending accrual query: {url}");
        let response =
            self.client.get(&url).send().await.map_err(|e| AccrualApiError::RestRequestError(e.to_string()))?;
        match response.status() {
            StatusCode::OK => {
                let order =
                    response.json::<AccrualOrder>().await.map_err(|e| AccrualApiError::JsonError(e.to_string()))?;
                if order.order != number {
                    warn!("🌐️ Asked about order {number} but the accrual service answered for {}", order.order);
                }
                trace!("🌐️ Order {number} is {}", order.status);
                Ok(Some(order))
            },
            StatusCode::NO_CONTENT => {
                trace!("🌐️ Order {number} is not registered with the accrual service");
                Ok(None)
            },
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = parse_retry_after(response.headers().get(RETRY_AFTER));
                Err(AccrualApiError::RateLimited { retry_after })
            },
            status if status.is_server_error() => Err(AccrualApiError::Unavailable { status: status.as_u16() }),
            status => {
                let message = response.text().await.unwrap_or_default();
                Err(AccrualApiError::QueryError { status: status.as_u16(), message })
            },
        }
    }

    /// Like [`fetch_order`](Self::fetch_order), but retries transient failures on an exponential schedule.
    ///
    /// A `Retry-After` hint longer than the scheduled delay wins. The call gives up with
    /// [`AccrualApiError::RetriesExhausted`] once the retry count is spent or the next sleep would take the total
    /// time spent waiting past `max_total_wait`. Permanent failures are returned immediately.
    pub async fn fetch_order_with_retry(&self, number: &str) -> Result<Option<AccrualOrder>, AccrualApiError> {
        let mut schedule = retry_schedule(&self.config);
        let mut attempts = 0;
        let mut waited = Duration::ZERO;
        loop {
            attempts += 1;
            let err = match self.fetch_order(number).await {
                Ok(order) => return Ok(order),
                Err(e) if e.is_transient() => e,
                Err(e) => return Err(e),
            };
            let Some(delay) = schedule.next() else {
                warn!("🌐️ Giving up on order {number} after {attempts} attempts. {err}");
                return Err(AccrualApiError::RetriesExhausted { attempts, last: Box::new(err) });
            };
            let delay = match &err {
                AccrualApiError::RateLimited { retry_after: Some(hint) } => delay.max(*hint),
                _ => delay,
            };
            if waited + delay > self.config.max_total_wait {
                warn!("🌐️ Giving up on order {number}. Waiting another {delay:?} would exceed the retry budget. {err}");
                return Err(AccrualApiError::RetriesExhausted { attempts, last: Box::new(err) });
            }
            debug!("🌐️ Attempt {attempts} for order {number} failed. Retrying in {delay:?}. {err}");
            tokio::time::sleep(delay).await;
            waited += delay;
        }
    }
}

fn retry_schedule(config: &AccrualConfig) -> impl Iterator<Item = Duration> {
    ExponentialBuilder::default()
        .with_min_delay(config.backoff_base)
        .with_max_delay(config.backoff_max)
        .with_max_times(config.max_retries)
        .with_jitter()
        .build()
}

/// Only the delay-seconds form of `Retry-After` is understood.
fn parse_retry_after(value: Option<&HeaderValue>) -> Option<Duration> {
    let secs = value?.to_str().ok()?.trim().parse::<u64>().ok()?;
    Some(Duration::from_secs(secs))
}
