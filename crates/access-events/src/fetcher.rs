//! Per-employee event fetch with caching, bounded retry, and fail-open
//! degradation.

use chrono::NaiveDate;
use log::{debug, warn};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::cache::{FetchCache, FETCH_CACHE_TTL};
use crate::errors::{AccessEventError, RetryClass};
use crate::models::{Pin, RawEvent};
use crate::source::TransactionSource;

/// Retry and timeout budget for one `fetch` call.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Total attempts per window, first try included.
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles for each attempt after.
    pub base_backoff: Duration,
    /// Upper bound on the random jitter added to each backoff.
    pub backoff_jitter: Duration,
    /// Total timeout applied to each outbound call.
    pub request_timeout: Duration,
    /// TTL for cached windows.
    pub cache_ttl: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(500),
            backoff_jitter: Duration::from_millis(250),
            request_timeout: Duration::from_secs(30),
            cache_ttl: FETCH_CACHE_TTL,
        }
    }
}

/// Fetches one employee's events over a day window.
///
/// Failure policy is fail-open: after the retry budget, any error degrades
/// to an empty list. Partial data loss for one employee must not block the
/// sync for all others; the caller cannot tell "no scans" from "upstream
/// down", and does not need to, the next run heals it.
pub struct EventFetcher {
    source: Arc<dyn TransactionSource>,
    cache: FetchCache,
    options: FetchOptions,
}

impl EventFetcher {
    pub fn new(source: Arc<dyn TransactionSource>, options: FetchOptions) -> Self {
        let cache = FetchCache::new(options.cache_ttl);
        Self {
            source,
            cache,
            options,
        }
    }

    /// Fetch events for `pin` over the inclusive `[start, end]` day window.
    pub async fn fetch(&self, pin: &Pin, start: NaiveDate, end: NaiveDate) -> Vec<RawEvent> {
        if let Some(cached) = self.cache.get(pin, start, end).await {
            debug!(
                "fetch cache hit for {} {}..{} ({} events)",
                pin,
                start,
                end,
                cached.len()
            );
            return cached;
        }

        match self.fetch_with_retry(pin, start, end).await {
            Ok(events) => {
                self.cache.put(pin, start, end, events.clone()).await;
                events
            }
            Err(err) => {
                warn!("giving up on events for {} {}..{}: {}", pin, start, end, err);
                Vec::new()
            }
        }
    }

    async fn fetch_with_retry(
        &self,
        pin: &Pin,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawEvent>, AccessEventError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let call = self.source.fetch_window(pin, start, end);
            let result = match timeout(self.options.request_timeout, call).await {
                Ok(result) => result,
                Err(_) => Err(AccessEventError::Timeout {
                    pin: pin.to_string(),
                }),
            };

            match result {
                Ok(events) => return Ok(events),
                Err(err)
                    if attempt < self.options.max_attempts
                        && err.retry_class() == RetryClass::WithBackoff =>
                {
                    let delay = self.backoff_delay(attempt);
                    debug!(
                        "retrying {} {}..{} in {:?} after attempt {}: {}",
                        pin, start, end, delay, attempt, err
                    );
                    sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponential = self.options.base_backoff.saturating_mul(1 << (attempt - 1));
        let jitter_ms = self.options.backoff_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        exponential + Duration::from_millis(jitter)
    }
}
