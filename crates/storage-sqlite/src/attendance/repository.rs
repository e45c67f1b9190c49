use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use std::sync::Arc;

use super::model::{AttendanceOverwriteDB, AttendanceRecordDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::attendance_records::dsl as attendance_dsl;
use crate::utils::format_day;
use rollcall_core::attendance::{
    AttendanceOverwrite, AttendanceRecord, AttendanceStore, NewAttendanceRecord, ReconcileCounts,
};
use rollcall_core::Result;

const INSERT_CHUNK_SIZE: usize = 500;

pub struct AttendanceRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl AttendanceRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl AttendanceStore for AttendanceRepository {
    fn list_for_day(
        &self,
        employee_ids: &[String],
        day: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>> {
        if employee_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = get_connection(&self.pool)?;
        let day_str = format_day(day);

        let rows = attendance_dsl::attendance_records
            .filter(attendance_dsl::day.eq(&day_str))
            .filter(attendance_dsl::employee_id.eq_any(employee_ids))
            .select(AttendanceRecordDB::as_select())
            .load::<AttendanceRecordDB>(&mut conn)
            .into_core()?;

        Ok(rows.into_iter().map(AttendanceRecord::from).collect())
    }

    async fn apply_batch(
        &self,
        creates: Vec<NewAttendanceRecord>,
        overwrites: Vec<AttendanceOverwrite>,
    ) -> Result<ReconcileCounts> {
        if creates.is_empty() && overwrites.is_empty() {
            return Ok(ReconcileCounts::default());
        }

        let create_rows: Vec<AttendanceRecordDB> =
            creates.iter().map(AttendanceRecordDB::from).collect();
        let overwrite_rows: Vec<(String, AttendanceOverwriteDB)> = overwrites
            .iter()
            .map(|o| (o.id.clone(), AttendanceOverwriteDB::from(o)))
            .collect();

        // The writer actor wraps this job in one immediate transaction, so a
        // duplicate (employee, day) insert rolls back the whole batch and
        // surfaces as a unique-violation error.
        self.writer
            .exec(move |conn| {
                let mut counts = ReconcileCounts::default();

                for chunk in create_rows.chunks(INSERT_CHUNK_SIZE) {
                    counts.created += diesel::insert_into(attendance_dsl::attendance_records)
                        .values(chunk)
                        .execute(conn)
                        .into_core()?;
                }
                for (id, changes) in &overwrite_rows {
                    counts.updated += diesel::update(
                        attendance_dsl::attendance_records.filter(attendance_dsl::id.eq(id)),
                    )
                    .set(changes)
                    .execute(conn)
                    .into_core()?;
                }

                Ok(counts)
            })
            .await
    }
}
