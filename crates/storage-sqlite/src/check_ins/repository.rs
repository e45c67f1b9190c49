use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, Utc};
use diesel::prelude::*;
use std::sync::Arc;

use super::model::CheckInSessionDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::check_in_sessions::dsl as sessions_dsl;
use crate::utils::{format_day, format_timestamp};
use rollcall_core::checkins::{CheckInSession, CheckInStore, NewCheckInSession, SessionClosure};
use rollcall_core::Result;

pub struct CheckInRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl CheckInRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl CheckInStore for CheckInRepository {
    async fn insert(&self, session: NewCheckInSession) -> Result<CheckInSession> {
        let row = CheckInSessionDB::from(&session);
        let created = row.clone();

        self.writer
            .exec(move |conn| {
                diesel::insert_into(sessions_dsl::check_in_sessions)
                    .values(&row)
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await?;

        Ok(CheckInSession::from(created))
    }

    fn list_for_day(&self, day: NaiveDate) -> Result<Vec<CheckInSession>> {
        let mut conn = get_connection(&self.pool)?;

        // Timestamps are uniform RFC 3339 text, so the day's sessions fall
        // lexicographically between the day's start and the next day's.
        let from = format!("{}T00:00:00", format_day(day));
        let to = format!("{}T00:00:00", format_day(day + Days::new(1)));

        let rows = sessions_dsl::check_in_sessions
            .filter(sessions_dsl::started_at.ge(&from))
            .filter(sessions_dsl::started_at.lt(&to))
            .order(sessions_dsl::started_at.asc())
            .select(CheckInSessionDB::as_select())
            .load::<CheckInSessionDB>(&mut conn)
            .into_core()?;

        Ok(rows.into_iter().map(CheckInSession::from).collect())
    }

    fn list_stale_open(&self, cutoff: DateTime<Utc>) -> Result<Vec<CheckInSession>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = sessions_dsl::check_in_sessions
            .filter(sessions_dsl::ended_at.is_null())
            .filter(sessions_dsl::started_at.le(format_timestamp(cutoff)))
            .order(sessions_dsl::started_at.asc())
            .select(CheckInSessionDB::as_select())
            .load::<CheckInSessionDB>(&mut conn)
            .into_core()?;

        Ok(rows.into_iter().map(CheckInSession::from).collect())
    }

    async fn close_batch(&self, closures: Vec<SessionClosure>) -> Result<usize> {
        if closures.is_empty() {
            return Ok(0);
        }

        self.writer
            .exec(move |conn| {
                let now = format_timestamp(Utc::now());
                let mut closed = 0;

                // The `ended_at IS NULL` guard keeps the batch idempotent: a
                // session closed since selection is skipped, not re-closed.
                for closure in &closures {
                    closed += diesel::update(
                        sessions_dsl::check_in_sessions
                            .filter(sessions_dsl::id.eq(&closure.session_id))
                            .filter(sessions_dsl::ended_at.is_null()),
                    )
                    .set((
                        sessions_dsl::ended_at.eq(Some(format_timestamp(closure.ended_at))),
                        sessions_dsl::updated_at.eq(&now),
                    ))
                    .execute(conn)
                    .into_core()?;
                }

                Ok(closed)
            })
            .await
    }
}
