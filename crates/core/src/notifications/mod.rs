//! Live fan-out of new check-ins to subscribed viewers, grouped by day.
//!
//! Each calendar day is a topic backed by a `tokio::sync::broadcast`
//! channel. Publishing is fire-and-forget: the writer never blocks on slow
//! viewers, lagging viewers lose messages rather than backpressure the
//! system, and a viewer that subscribes after a publish recovers through the
//! snapshot it receives on subscribe. Messages are delivered in publish
//! order within a topic; nothing is ordered across topics and nothing is
//! persisted.

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use log::debug;
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::checkins::{CheckInSession, CheckInStore};
use crate::constants::{SNAPSHOT_TTL_SECS, TOPIC_CHANNEL_CAPACITY};
use crate::errors::Result;

/// Denormalized payload published for each new check-in. Carries what a
/// viewer needs to render the row without a follow-up read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInNotice {
    pub session_id: String,
    pub employee_id: String,
    pub employee_name: String,
    pub department: Option<String>,
    pub photo_ref: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl CheckInNotice {
    /// The topic this notice belongs to: the session's start day.
    pub fn day(&self) -> NaiveDate {
        self.started_at.date_naive()
    }
}

/// Live handle for one viewer on one day topic.
///
/// Dropping the subscription (or passing it to
/// [`NotificationHub::disconnect`]) unregisters the viewer.
pub struct Subscription {
    day: NaiveDate,
    receiver: broadcast::Receiver<CheckInNotice>,
}

impl Subscription {
    pub fn day(&self) -> NaiveDate {
        self.day
    }

    /// Next notice in publish order. Returns `None` once the topic is gone.
    /// A lagging viewer silently skips what it missed; the next snapshot is
    /// the recovery path, not redelivery.
    pub async fn recv(&mut self) -> Option<CheckInNotice> {
        loop {
            match self.receiver.recv().await {
                Ok(notice) => return Some(notice),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("check-in subscriber lagged, skipped {skipped} notices");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<CheckInNotice> {
        loop {
            match self.receiver.try_recv() {
                Ok(notice) => return Some(notice),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    log::warn!("check-in subscriber lagged, skipped {skipped} notices");
                }
                Err(_) => return None,
            }
        }
    }
}

/// Tuning for the hub's snapshot cache and topic channels.
#[derive(Debug, Clone)]
pub struct HubSettings {
    /// How long a day's snapshot may be served before re-reading storage.
    /// Absorbs bursts of simultaneous subscribers without hammering the
    /// database.
    pub snapshot_ttl: Duration,
    /// Buffered notices per topic before slow viewers start lagging.
    pub channel_capacity: usize,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            snapshot_ttl: Duration::from_secs(SNAPSHOT_TTL_SECS),
            channel_capacity: TOPIC_CHANNEL_CAPACITY,
        }
    }
}

/// Topic registry plus snapshot reads for newly-subscribed viewers.
///
/// Publishing is an explicit call on the check-in write path, not a storage
/// hook; see [`CheckInService`](crate::checkins::CheckInService).
pub struct NotificationHub<C: CheckInStore> {
    store: Arc<C>,
    topics: DashMap<NaiveDate, broadcast::Sender<CheckInNotice>>,
    snapshots: Cache<NaiveDate, Arc<Vec<CheckInSession>>>,
    channel_capacity: usize,
}

impl<C: CheckInStore> NotificationHub<C> {
    pub fn new(store: Arc<C>, settings: HubSettings) -> Self {
        Self {
            store,
            topics: DashMap::new(),
            snapshots: Cache::builder()
                .time_to_live(settings.snapshot_ttl)
                .max_capacity(64)
                .build(),
            channel_capacity: settings.channel_capacity,
        }
    }

    /// Register a viewer on `day` and hand back the day's current sessions
    /// plus the live subscription.
    ///
    /// Registration happens before the snapshot read, so a publish racing
    /// this call lands in the snapshot, the live stream, or both, never in
    /// neither.
    pub fn subscribe(&self, day: NaiveDate) -> Result<(Vec<CheckInSession>, Subscription)> {
        let receiver = self.topic_sender(day).subscribe();
        let snapshot = self.snapshot(day)?;
        debug!("viewer subscribed to {day} ({} sessions)", snapshot.len());
        Ok((snapshot, Subscription { day, receiver }))
    }

    /// Move an existing viewer to a new day: the old topic registration is
    /// replaced and a fresh snapshot returned.
    pub fn resubscribe(
        &self,
        subscription: &mut Subscription,
        day: NaiveDate,
    ) -> Result<Vec<CheckInSession>> {
        let old_day = subscription.day;
        subscription.receiver = self.topic_sender(day).subscribe();
        subscription.day = day;
        self.prune(old_day);
        self.snapshot(day)
    }

    /// Drop a viewer. The topic disappears with its last viewer.
    pub fn disconnect(&self, subscription: Subscription) {
        let day = subscription.day;
        drop(subscription);
        self.prune(day);
    }

    /// Fire-and-forget fan-out to the notice's day topic. Viewers on other
    /// days see nothing; with no viewers at all the notice is dropped.
    pub fn publish(&self, notice: CheckInNotice) {
        let day = notice.day();

        // The next snapshot for this day must include the session behind
        // this notice, so late subscribers can recover it.
        self.snapshots.invalidate(&day);

        let sender = self.topics.get(&day).map(|entry| entry.value().clone());
        match sender.map(|s| s.send(notice)) {
            Some(Ok(delivered)) => {
                debug!("published check-in notice to {delivered} viewers on {day}");
            }
            _ => debug!("no viewers on {day}, check-in notice dropped"),
        }
        self.prune(day);
    }

    fn topic_sender(&self, day: NaiveDate) -> broadcast::Sender<CheckInNotice> {
        self.topics
            .entry(day)
            .or_insert_with(|| broadcast::channel(self.channel_capacity).0)
            .value()
            .clone()
    }

    fn snapshot(&self, day: NaiveDate) -> Result<Vec<CheckInSession>> {
        if let Some(cached) = self.snapshots.get(&day) {
            return Ok(cached.as_ref().clone());
        }
        let sessions = self.store.list_for_day(day)?;
        self.snapshots.insert(day, Arc::new(sessions.clone()));
        Ok(sessions)
    }

    /// Drop a day topic once its last receiver is gone.
    fn prune(&self, day: NaiveDate) {
        self.topics
            .remove_if(&day, |_, sender| sender.receiver_count() == 0);
    }
}
