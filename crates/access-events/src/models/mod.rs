//! Wire models for the access-control transaction API.
//!
//! The upstream returns an envelope of the form
//! `{ "data": [ { "eventTime": ..., "areaName": ..., "personPin": ... } ] }`
//! for a `(pin, startDate, endDate)` window. Only the fields the
//! reconciliation needs are decoded; everything else is ignored.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Pin
// =============================================================================

/// Stable external employee key used by the access-control hardware.
///
/// This is the upstream's identity for a person, not our database id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Pin(pub String);

impl Pin {
    pub fn new(pin: impl Into<String>) -> Self {
        Self(pin.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Pin {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Pin {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for Pin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// RawEvent
// =============================================================================

/// One badge/turnstile scan as reported by the transaction API.
///
/// Never persisted; consumed only to derive the daily attendance fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub pin: Pin,
    pub event_time: DateTime<Utc>,
    pub area_name: Option<String>,
}

// =============================================================================
// Wire envelope
// =============================================================================

/// Envelope returned by the transactions endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct TransactionPage {
    #[serde(default)]
    pub data: Vec<TransactionRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransactionRow {
    #[serde(default)]
    pub event_time: Option<String>,
    #[serde(default)]
    pub area_name: Option<String>,
    #[serde(default)]
    pub person_pin: Option<String>,
}

impl TransactionPage {
    /// Decode the page into events for `pin`.
    ///
    /// Rows with a missing or malformed timestamp are dropped and logged; a
    /// bad row never fails the page. The upstream's claimed newest-first
    /// ordering is preserved as-is here and ignored downstream, where events
    /// are sorted by timestamp before use.
    pub(crate) fn into_events(self, pin: &Pin) -> Vec<RawEvent> {
        self.data
            .into_iter()
            .filter_map(|row| {
                let raw_time = match row.event_time {
                    Some(ref raw) => raw,
                    None => {
                        warn!("dropping transaction row for {} without eventTime", pin);
                        return None;
                    }
                };
                let Some(event_time) = parse_event_time(raw_time) else {
                    warn!(
                        "dropping transaction row for {} with malformed eventTime {:?}",
                        pin, raw_time
                    );
                    return None;
                };
                Some(RawEvent {
                    pin: row.person_pin.map(Pin::new).unwrap_or_else(|| pin.clone()),
                    event_time,
                    area_name: row.area_name.filter(|a| !a.is_empty()),
                })
            })
            .collect()
    }
}

/// Parse the upstream's timestamp, RFC 3339 first, then the
/// `YYYY-MM-DD HH:MM:SS` form older device firmware emits (taken as UTC).
fn parse_event_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|ndt| Utc.from_utc_datetime(&ndt))
        })
}
