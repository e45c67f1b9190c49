use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::UNKNOWN_AREA;
use rollcall_access_events::RawEvent;

/// One employee's reconciled presence for a calendar day.
///
/// Exactly one record exists per (employee, day); the storage layer enforces
/// the uniqueness. Records are created or overwritten wholesale by the
/// reconciliation batch, never field-patched by any other writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub employee_id: String,
    pub day: NaiveDate,
    pub first_in: Option<DateTime<Utc>>,
    pub last_out: Option<DateTime<Utc>>,
    pub area_in: String,
    pub area_out: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a day with no existing record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttendanceRecord {
    pub id: String,
    pub employee_id: String,
    pub day: NaiveDate,
    pub first_in: Option<DateTime<Utc>>,
    pub last_out: Option<DateTime<Utc>>,
    pub area_in: String,
    pub area_out: String,
}

/// Wholesale replacement of an existing record's derived fields.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceOverwrite {
    pub id: String,
    pub first_in: Option<DateTime<Utc>>,
    pub last_out: Option<DateTime<Utc>>,
    pub area_in: String,
    pub area_out: String,
}

/// Counts reported by one reconciliation batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileCounts {
    pub created: usize,
    pub updated: usize,
}

/// The attendance fields derived from one employee's scans for a day.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedDay {
    pub first_in: Option<DateTime<Utc>>,
    pub last_out: Option<DateTime<Utc>>,
    pub area_in: String,
    pub area_out: String,
}

impl DerivedDay {
    /// Derive the day's bounds from raw scans.
    ///
    /// The upstream claims newest-first ordering but never guarantees it, so
    /// events are sorted by timestamp here instead of trusting position.
    /// A single scan yields `first_in == last_out`.
    pub fn from_events(events: &[RawEvent]) -> Self {
        if events.is_empty() {
            return Self::absent();
        }

        let mut ordered: Vec<&RawEvent> = events.iter().collect();
        ordered.sort_by_key(|event| event.event_time);
        let earliest = ordered[0];
        let latest = ordered[ordered.len() - 1];

        Self {
            first_in: Some(earliest.event_time),
            last_out: Some(latest.event_time),
            area_in: area_or_unknown(&earliest.area_name),
            area_out: area_or_unknown(&latest.area_name),
        }
    }

    /// The no-data shape: both timestamps absent, both areas the sentinel.
    pub fn absent() -> Self {
        Self {
            first_in: None,
            last_out: None,
            area_in: UNKNOWN_AREA.to_string(),
            area_out: UNKNOWN_AREA.to_string(),
        }
    }
}

fn area_or_unknown(area: &Option<String>) -> String {
    area.clone().unwrap_or_else(|| UNKNOWN_AREA.to_string())
}
