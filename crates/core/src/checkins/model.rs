use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ad-hoc "lesson" check-in captured from a face-recognition photo event.
///
/// One row per physical check-in; no uniqueness against the date. A session
/// is open while `ended_at` is null. The writer never closes sessions; the
/// [`SessionCorrector`](super::SessionCorrector) does, bounded by the maximum
/// open duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInSession {
    pub id: String,
    pub employee_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo_ref: Option<String>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CheckInSession {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// The calendar day the session belongs to, its start day.
    pub fn day(&self) -> NaiveDate {
        self.started_at.date_naive()
    }
}

/// Insert payload for a new check-in.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCheckInSession {
    pub id: String,
    pub employee_id: String,
    pub started_at: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo_ref: Option<String>,
    pub metadata: Option<Value>,
}

/// Identity-resolver output, consumed as an opaque input. How the identity
/// was established from the photo is out of scope here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionMatch {
    pub employee_id: String,
    pub confidence: f64,
}

/// Close instruction produced by the session corrector.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionClosure {
    pub session_id: String,
    pub ended_at: DateTime<Utc>,
}

/// Where a stale session gets closed: start plus the allowed duration,
/// clamped to 23:59:59 of the start day. A session never closes on a later
/// calendar day than it began, and clock skew clamps the same way instead of
/// propagating.
pub fn stale_close_time(started_at: DateTime<Utc>, max_open: Duration) -> DateTime<Utc> {
    let end_of_day =
        Utc.from_utc_datetime(&started_at.date_naive().and_hms_opt(23, 59, 59).unwrap());
    (started_at + max_open).min(end_of_day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_close_time_within_same_day() {
        let closed = stale_close_time(ts(1, 10, 0), Duration::hours(3));
        assert_eq!(closed, ts(1, 13, 0));
    }

    #[test]
    fn test_close_time_clamps_to_end_of_start_day() {
        // 22:30 + 3h would be 01:30 the next day.
        let closed = stale_close_time(ts(1, 22, 30), Duration::hours(3));
        assert_eq!(closed, Utc.with_ymd_and_hms(2024, 6, 1, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_close_time_exactly_at_midnight_clamps() {
        // 21:00 + 3h lands exactly on midnight, still next day.
        let closed = stale_close_time(ts(1, 21, 0), Duration::hours(3));
        assert_eq!(closed, Utc.with_ymd_and_hms(2024, 6, 1, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_session_day_is_start_day() {
        let session = CheckInSession {
            id: "s1".to_string(),
            employee_id: "e1".to_string(),
            started_at: ts(1, 21, 0),
            ended_at: None,
            latitude: None,
            longitude: None,
            photo_ref: None,
            metadata: None,
            created_at: ts(1, 21, 0),
            updated_at: ts(1, 21, 0),
        };
        assert!(session.is_open());
        assert_eq!(session.day(), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    }
}
