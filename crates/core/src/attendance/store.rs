//! Attendance storage trait.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::model::{AttendanceOverwrite, AttendanceRecord, NewAttendanceRecord, ReconcileCounts};
use crate::errors::Result;

/// Storage interface for daily attendance records.
///
/// The implementation must uphold the (employee, day) uniqueness constraint
/// and apply `apply_batch` transactionally.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Existing records for `day`, restricted to the given employees.
    fn list_for_day(&self, employee_ids: &[String], day: NaiveDate) -> Result<Vec<AttendanceRecord>>;

    /// Apply the whole batch in one transaction: every create and overwrite
    /// commits together or not at all. A concurrent duplicate create fails
    /// the batch with a unique-violation error.
    async fn apply_batch(
        &self,
        creates: Vec<NewAttendanceRecord>,
        overwrites: Vec<AttendanceOverwrite>,
    ) -> Result<ReconcileCounts>;
}
