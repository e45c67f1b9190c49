//! Fan-out of per-employee fetches under a fixed concurrency cap.

use chrono::NaiveDate;
use futures::future::join_all;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{timeout_at, Instant};

use crate::fetcher::EventFetcher;
use crate::models::{Pin, RawEvent};

/// Default number of in-flight upstream calls.
pub const DEFAULT_FETCH_CONCURRENCY: usize = 6;

/// Runs one [`EventFetcher`] call per employee, at most `concurrency` at a
/// time, and assembles the results into a map.
///
/// No ordering between employees is implied or needed. A slow employee only
/// occupies its own permit; everyone else keeps moving.
pub struct FetchCoordinator {
    fetcher: Arc<EventFetcher>,
    permits: Arc<Semaphore>,
}

impl FetchCoordinator {
    pub fn new(fetcher: Arc<EventFetcher>, concurrency: usize) -> Self {
        Self {
            fetcher,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Fetch every pin's window over the inclusive `[start, end]` day range.
    ///
    /// The result holds exactly one entry per distinct input pin, possibly an
    /// empty list; no pin is ever dropped. With a `deadline`, any fetch still
    /// pending when it expires resolves to an empty list so the batch can
    /// proceed.
    pub async fn fetch_all(
        &self,
        pins: &[Pin],
        start: NaiveDate,
        end: NaiveDate,
        deadline: Option<Duration>,
    ) -> HashMap<Pin, Vec<RawEvent>> {
        let cutoff = deadline.map(|budget| Instant::now() + budget);

        let mut seen = HashSet::new();
        let tasks: Vec<_> = pins
            .iter()
            .filter(|pin| seen.insert((*pin).clone()))
            .map(|pin| {
                let pin = pin.clone();
                let fetcher = Arc::clone(&self.fetcher);
                let permits = Arc::clone(&self.permits);
                async move {
                    let gated = async {
                        let _permit = match permits.acquire().await {
                            Ok(permit) => permit,
                            Err(_) => return Vec::new(),
                        };
                        fetcher.fetch(&pin, start, end).await
                    };
                    let events = match cutoff {
                        Some(at) => timeout_at(at, gated).await.unwrap_or_default(),
                        None => gated.await,
                    };
                    (pin, events)
                }
            })
            .collect();

        let results: HashMap<Pin, Vec<RawEvent>> = join_all(tasks).await.into_iter().collect();
        debug!(
            "fetched {} employee windows for {}..{}",
            results.len(),
            start,
            end
        );
        results
    }
}
