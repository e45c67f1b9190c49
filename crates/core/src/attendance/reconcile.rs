//! Reconciliation of fetched events into daily attendance records.

use chrono::NaiveDate;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::model::{
    AttendanceOverwrite, AttendanceRecord, DerivedDay, NewAttendanceRecord, ReconcileCounts,
};
use super::store::AttendanceStore;
use crate::employees::Employee;
use crate::errors::Result;
use rollcall_access_events::{Pin, RawEvent};

/// Turns a per-employee event map into one atomic create/update batch.
///
/// Downstream reports assume a sync run is a snapshot as of one instant, so
/// the batch either commits whole or not at all; a half-applied run would
/// leave some employees stale while others were refreshed.
pub struct ReconciliationEngine<A: AttendanceStore> {
    store: Arc<A>,
}

impl<A: AttendanceStore> ReconciliationEngine<A> {
    pub fn new(store: Arc<A>) -> Self {
        Self { store }
    }

    /// Reconcile `target_day` for the given employees.
    ///
    /// Employees with an existing record get a wholesale overwrite of the
    /// derived fields; the rest get a fresh record. An employee missing from
    /// the event map is treated the same as one with an empty list.
    pub async fn reconcile(
        &self,
        employees: &[Employee],
        events_by_pin: &HashMap<Pin, Vec<RawEvent>>,
        target_day: NaiveDate,
    ) -> Result<ReconcileCounts> {
        if employees.is_empty() {
            return Ok(ReconcileCounts::default());
        }

        let employee_ids: Vec<String> = employees.iter().map(|e| e.id.clone()).collect();
        let existing = self.store.list_for_day(&employee_ids, target_day)?;
        let existing_by_employee: HashMap<&str, &AttendanceRecord> = existing
            .iter()
            .map(|record| (record.employee_id.as_str(), record))
            .collect();

        let mut creates = Vec::new();
        let mut overwrites = Vec::new();

        for employee in employees {
            let events = events_by_pin
                .get(&employee.pin)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let derived = DerivedDay::from_events(events);

            match existing_by_employee.get(employee.id.as_str()) {
                Some(record) => overwrites.push(AttendanceOverwrite {
                    id: record.id.clone(),
                    first_in: derived.first_in,
                    last_out: derived.last_out,
                    area_in: derived.area_in,
                    area_out: derived.area_out,
                }),
                None => creates.push(NewAttendanceRecord {
                    id: Uuid::new_v4().to_string(),
                    employee_id: employee.id.clone(),
                    day: target_day,
                    first_in: derived.first_in,
                    last_out: derived.last_out,
                    area_in: derived.area_in,
                    area_out: derived.area_out,
                }),
            }
        }

        debug!(
            "reconciling {} for {} employees: {} creates, {} overwrites",
            target_day,
            employees.len(),
            creates.len(),
            overwrites.len()
        );

        self.store.apply_batch(creates, overwrites).await
    }
}
