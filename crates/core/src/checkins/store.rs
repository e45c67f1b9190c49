//! Check-in session storage trait.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use super::model::{CheckInSession, NewCheckInSession, SessionClosure};
use crate::errors::Result;

/// Storage interface for check-in sessions.
#[async_trait]
pub trait CheckInStore: Send + Sync {
    /// Persist a new session and return it with storage timestamps filled in.
    async fn insert(&self, session: NewCheckInSession) -> Result<CheckInSession>;

    /// All sessions that started on `day`, oldest first.
    fn list_for_day(&self, day: NaiveDate) -> Result<Vec<CheckInSession>>;

    /// Open sessions that started at or before `cutoff`. Sessions with an
    /// end time are never returned, which is what makes correction runs
    /// idempotent.
    fn list_stale_open(&self, cutoff: DateTime<Utc>) -> Result<Vec<CheckInSession>>;

    /// Close the given sessions in one transaction. A session that was
    /// closed in the meantime is left untouched and not counted.
    async fn close_batch(&self, closures: Vec<SessionClosure>) -> Result<usize>;
}
