use std::time::Duration;

use log::*;
use lpg_common::parse_env_or_default;

#[derive(Debug, Clone)]
pub struct AccrualConfig {
    /// Base URL of the accrual service, e.g. `http://localhost:8080`.
    pub address: String,
    /// Bound on a single HTTP round trip.
    pub request_timeout: Duration,
    pub max_retries: usize,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    /// Bound on the time `fetch_order_with_retry` may spend sleeping between attempts.
    pub max_total_wait: Duration,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self {
            address: "http://localhost:8080".to_string(),
            request_timeout: Duration::from_millis(2000),
            max_retries: 5,
            backoff_base: Duration::from_millis(100),
            backoff_max: Duration::from_millis(2000),
            max_total_wait: Duration::from_millis(5000),
        }
    }
}

impl AccrualConfig {
    pub fn new_from_env_or_default() -> Self {
        let defaults = Self::default();
        let address = std::env::var("LPG_ACCRUAL_SYSTEM_ADDRESS").unwrap_or_else(|_| {
            warn!("🪛️ LPG_ACCRUAL_SYSTEM_ADDRESS not set, using {} as default", defaults.address);
            defaults.address.clone()
        });
        let millis = |name: &str, default: Duration| {
            let ms = parse_env_or_default(name, default.as_millis() as u64, |e| {
                warn!("🪛️ {e}. Using the default of {}ms", default.as_millis())
            });
            Duration::from_millis(ms)
        };
        let request_timeout = millis("LPG_ACCRUAL_REQUEST_TIMEOUT_MS", defaults.request_timeout);
        let backoff_base = millis("LPG_ACCRUAL_BACKOFF_BASE_MS", defaults.backoff_base);
        let backoff_max = millis("LPG_ACCRUAL_BACKOFF_MAX_MS", defaults.backoff_max);
        let max_total_wait = millis("LPG_ACCRUAL_MAX_TOTAL_WAIT_MS", defaults.max_total_wait);
        let max_retries = parse_env_or_default("LPG_ACCRUAL_MAX_RETRIES", defaults.max_retries, |e| {
            warn!("🪛️ {e}. Using the default of {}", defaults.max_retries)
        });
        let address = address.trim_end_matches('/').to_string();
        Self { address, request_timeout, max_retries, backoff_base, backoff_max, max_total_wait }
    }

    pub fn with_address<S: Into<String>>(mut self, address: S) -> Self {
        self.address = address.into().trim_end_matches('/').to_string();
        self
    }
}
