//! Auto-close of check-in sessions that never saw a check-out.

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use std::sync::Arc;

use super::model::{stale_close_time, SessionClosure};
use super::store::CheckInStore;
use crate::constants::MAX_OPEN_SESSION_HOURS;
use crate::errors::Result;

/// How long a session may stay open before correction closes it.
#[derive(Debug, Clone)]
pub struct CorrectorSettings {
    pub max_open: Duration,
}

impl Default for CorrectorSettings {
    fn default() -> Self {
        Self {
            max_open: Duration::hours(MAX_OPEN_SESSION_HOURS),
        }
    }
}

/// Closes stale open sessions in one atomic batch.
///
/// Runs on a timer owned by the trigger surface; the interval is
/// configuration, not logic that lives here. Idempotent: a run that finds
/// nothing stale is a no-op, and an already-closed session is never selected
/// again.
pub struct SessionCorrector<C: CheckInStore> {
    store: Arc<C>,
    settings: CorrectorSettings,
}

impl<C: CheckInStore> SessionCorrector<C> {
    pub fn new(store: Arc<C>, settings: CorrectorSettings) -> Self {
        Self { store, settings }
    }

    /// Close every open session older than the allowed duration, computing
    /// each end time as start + max-open clamped to the start day's 23:59:59.
    /// Returns the number of sessions closed.
    pub async fn close_stale_open_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = now - self.settings.max_open;
        let stale = self.store.list_stale_open(cutoff)?;
        if stale.is_empty() {
            debug!("no stale open sessions at {now}");
            return Ok(0);
        }

        let closures: Vec<SessionClosure> = stale
            .iter()
            .map(|session| SessionClosure {
                session_id: session.id.clone(),
                ended_at: stale_close_time(session.started_at, self.settings.max_open),
            })
            .collect();

        let closed = self.store.close_batch(closures).await?;
        info!("auto-closed {closed} stale check-in sessions");
        Ok(closed)
    }
}
