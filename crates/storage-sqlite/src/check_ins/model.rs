//! Database model for check-in sessions.

use chrono::Utc;
use diesel::prelude::*;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::utils::{format_timestamp, parse_timestamp, parse_timestamp_opt};
use rollcall_core::checkins::{CheckInSession, NewCheckInSession};

#[derive(
    Queryable,
    Identifiable,
    Selectable,
    Insertable,
    AsChangeset,
    Debug,
    Clone,
    Serialize,
    Deserialize,
    PartialEq,
)]
#[diesel(table_name = crate::schema::check_in_sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct CheckInSessionDB {
    pub id: String,
    pub employee_id: String,
    pub started_at: String,
    pub ended_at: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo_ref: Option<String>,
    /// Arbitrary capture metadata, stored as a JSON string.
    pub metadata: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<CheckInSessionDB> for CheckInSession {
    fn from(db: CheckInSessionDB) -> Self {
        let metadata = db.metadata.as_deref().and_then(|raw| {
            serde_json::from_str(raw)
                .map_err(|e| warn!("dropping unreadable session metadata: {e}"))
                .ok()
        });

        CheckInSession {
            id: db.id,
            employee_id: db.employee_id,
            started_at: parse_timestamp(&db.started_at),
            ended_at: parse_timestamp_opt(db.ended_at.as_deref()),
            latitude: db.latitude,
            longitude: db.longitude,
            photo_ref: db.photo_ref,
            metadata,
            created_at: parse_timestamp(&db.created_at),
            updated_at: parse_timestamp(&db.updated_at),
        }
    }
}

impl From<&NewCheckInSession> for CheckInSessionDB {
    fn from(session: &NewCheckInSession) -> Self {
        let now = format_timestamp(Utc::now());
        CheckInSessionDB {
            id: session.id.clone(),
            employee_id: session.employee_id.clone(),
            started_at: format_timestamp(session.started_at),
            ended_at: None,
            latitude: session.latitude,
            longitude: session.longitude,
            photo_ref: session.photo_ref.clone(),
            metadata: session
                .metadata
                .as_ref()
                .and_then(|value| serde_json::to_string(value).ok()),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
