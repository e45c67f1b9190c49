//! Database models for daily attendance records.

use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::utils::{
    format_day, format_timestamp, parse_day, parse_timestamp, parse_timestamp_opt,
};
use rollcall_core::attendance::{AttendanceOverwrite, AttendanceRecord, NewAttendanceRecord};

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
#[diesel(table_name = crate::schema::attendance_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecordDB {
    pub id: String,
    pub employee_id: String,
    pub day: String,
    pub first_in: Option<String>,
    pub last_out: Option<String>,
    pub area_in: String,
    pub area_out: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Wholesale replacement of the derived fields. Every field is always
/// written, the double `Option` on the timestamps is what lets an update
/// set them back to NULL.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = crate::schema::attendance_records)]
pub struct AttendanceOverwriteDB {
    pub first_in: Option<Option<String>>,
    pub last_out: Option<Option<String>>,
    pub area_in: String,
    pub area_out: String,
    pub updated_at: String,
}

impl From<AttendanceRecordDB> for AttendanceRecord {
    fn from(db: AttendanceRecordDB) -> Self {
        AttendanceRecord {
            id: db.id,
            employee_id: db.employee_id,
            day: parse_day(&db.day),
            first_in: parse_timestamp_opt(db.first_in.as_deref()),
            last_out: parse_timestamp_opt(db.last_out.as_deref()),
            area_in: db.area_in,
            area_out: db.area_out,
            created_at: parse_timestamp(&db.created_at),
            updated_at: parse_timestamp(&db.updated_at),
        }
    }
}

impl From<&NewAttendanceRecord> for AttendanceRecordDB {
    fn from(record: &NewAttendanceRecord) -> Self {
        let now = format_timestamp(Utc::now());
        AttendanceRecordDB {
            id: record.id.clone(),
            employee_id: record.employee_id.clone(),
            day: format_day(record.day),
            first_in: record.first_in.map(format_timestamp),
            last_out: record.last_out.map(format_timestamp),
            area_in: record.area_in.clone(),
            area_out: record.area_out.clone(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

impl From<&AttendanceOverwrite> for AttendanceOverwriteDB {
    fn from(overwrite: &AttendanceOverwrite) -> Self {
        AttendanceOverwriteDB {
            first_in: Some(overwrite.first_in.map(format_timestamp)),
            last_out: Some(overwrite.last_out.map(format_timestamp)),
            area_in: overwrite.area_in.clone(),
            area_out: overwrite.area_out.clone(),
            updated_at: format_timestamp(Utc::now()),
        }
    }
}
