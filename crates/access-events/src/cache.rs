//! Short-lived response cache for transaction windows.

use chrono::NaiveDate;
use moka::future::Cache;
use std::time::Duration;

use crate::models::{Pin, RawEvent};

/// Default TTL for cached windows.
pub const FETCH_CACHE_TTL: Duration = Duration::from_secs(600);

const FETCH_CACHE_CAPACITY: u64 = 10_000;

type WindowKey = (Pin, NaiveDate, NaiveDate);

/// TTL cache keyed by `(pin, start, end)`.
///
/// Purely a load shedder: a miss costs one upstream call, never correctness.
/// Empty lists are cached like any other result, "no events in the window"
/// is itself a valid answer. Failed fetches are never written here, so the
/// next run gets a fresh try.
pub struct FetchCache {
    entries: Cache<WindowKey, Vec<RawEvent>>,
}

impl FetchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(FETCH_CACHE_CAPACITY)
                .build(),
        }
    }

    pub async fn get(&self, pin: &Pin, start: NaiveDate, end: NaiveDate) -> Option<Vec<RawEvent>> {
        self.entries.get(&(pin.clone(), start, end)).await
    }

    pub async fn put(&self, pin: &Pin, start: NaiveDate, end: NaiveDate, events: Vec<RawEvent>) {
        self.entries.insert((pin.clone(), start, end), events).await;
    }
}

impl Default for FetchCache {
    fn default() -> Self {
        Self::new(FETCH_CACHE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn event(pin: &str) -> RawEvent {
        RawEvent {
            pin: Pin::new(pin),
            event_time: Utc.with_ymd_and_hms(2024, 6, 1, 8, 55, 0).unwrap(),
            area_name: Some("Main Gate".to_string()),
        }
    }

    #[tokio::test]
    async fn test_cache_put_get() {
        let cache = FetchCache::default();
        let pin = Pin::new("10042");

        cache.put(&pin, day(1), day(1), vec![event("10042")]).await;

        let hit = cache.get(&pin, day(1), day(1)).await;
        assert_eq!(hit.map(|events| events.len()), Some(1));
    }

    #[tokio::test]
    async fn test_cache_miss() {
        let cache = FetchCache::default();
        assert!(cache.get(&Pin::new("99999"), day(1), day(1)).await.is_none());
    }

    #[tokio::test]
    async fn test_empty_window_is_a_cached_outcome() {
        let cache = FetchCache::default();
        let pin = Pin::new("10042");

        cache.put(&pin, day(1), day(1), Vec::new()).await;

        assert_eq!(cache.get(&pin, day(1), day(1)).await, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_windows_are_keyed_separately() {
        let cache = FetchCache::default();
        let pin = Pin::new("10042");

        cache.put(&pin, day(1), day(1), vec![event("10042")]).await;

        assert!(cache.get(&pin, day(2), day(2)).await.is_none());
        assert!(cache.get(&Pin::new("10043"), day(1), day(1)).await.is_none());
    }
}
