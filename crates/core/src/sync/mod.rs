//! Daily attendance synchronization.
//!
//! One run per target day: list active employees, pull each one's event
//! window through the bounded coordinator, and hand the map to the
//! reconciliation engine as a single atomic batch.

use chrono::NaiveDate;
use log::{debug, info};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::attendance::{AttendanceStore, ReconciliationEngine};
use crate::employees::EmployeeRepositoryTrait;
use crate::errors::Result;
use rollcall_access_events::{FetchCoordinator, Pin};

/// Outcome of one sync run.
///
/// Zero counts are a normal result (a holiday has no scans). Storage being
/// unreachable surfaces as `Err`, never as an empty `Completed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed {
        employees: usize,
        created: usize,
        updated: usize,
    },
    /// Another run for the same day holds the lock; nothing was done.
    AlreadyRunning,
}

/// Day-keyed advisory locks: one active run per target day, while distinct
/// days proceed independently. Owned by the service rather than living in
/// process-global state, so tests and embedders get isolated lock sets.
#[derive(Clone, Default)]
struct DayLocks {
    held: Arc<Mutex<HashSet<NaiveDate>>>,
}

impl DayLocks {
    fn try_acquire(&self, day: NaiveDate) -> Option<DayLockGuard> {
        let mut held = self.held.lock().unwrap();
        if held.contains(&day) {
            None
        } else {
            held.insert(day);
            Some(DayLockGuard {
                day,
                held: Arc::clone(&self.held),
            })
        }
    }
}

/// RAII guard that releases the day lock when dropped.
struct DayLockGuard {
    day: NaiveDate,
    held: Arc<Mutex<HashSet<NaiveDate>>>,
}

impl Drop for DayLockGuard {
    fn drop(&mut self) {
        self.held.lock().unwrap().remove(&self.day);
    }
}

/// Orchestrates the fetch → reconcile path for one day at a time.
pub struct AttendanceSyncService<A, E>
where
    A: AttendanceStore,
    E: EmployeeRepositoryTrait,
{
    coordinator: Arc<FetchCoordinator>,
    engine: ReconciliationEngine<A>,
    employees: Arc<E>,
    locks: DayLocks,
    /// Optional overall budget for the fetch fan-out; a fetch still pending
    /// when it expires contributes an empty list instead of stalling the run.
    fetch_deadline: Option<Duration>,
}

impl<A, E> AttendanceSyncService<A, E>
where
    A: AttendanceStore + 'static,
    E: EmployeeRepositoryTrait + 'static,
{
    pub fn new(
        coordinator: Arc<FetchCoordinator>,
        store: Arc<A>,
        employees: Arc<E>,
        fetch_deadline: Option<Duration>,
    ) -> Self {
        Self {
            coordinator,
            engine: ReconciliationEngine::new(store),
            employees,
            locks: DayLocks::default(),
            fetch_deadline,
        }
    }

    /// Sync every active employee's attendance for `day`.
    ///
    /// Concurrent calls for the same day are serialized by skipping: the
    /// second caller gets [`SyncOutcome::AlreadyRunning`] instead of racing
    /// the first into a uniqueness conflict. A conflict can still surface
    /// from a second process; callers should treat
    /// [`Error::is_unique_violation`](crate::Error::is_unique_violation)
    /// as retry-after-backoff.
    pub async fn sync_attendance(&self, day: NaiveDate) -> Result<SyncOutcome> {
        let Some(_guard) = self.locks.try_acquire(day) else {
            debug!("skipping attendance sync for {day}: already running");
            return Ok(SyncOutcome::AlreadyRunning);
        };

        let employees = self.employees.list_active()?;
        if employees.is_empty() {
            debug!("no active employees, nothing to sync for {day}");
            return Ok(SyncOutcome::Completed {
                employees: 0,
                created: 0,
                updated: 0,
            });
        }

        let pins: Vec<Pin> = employees.iter().map(|e| e.pin.clone()).collect();
        let events = self
            .coordinator
            .fetch_all(&pins, day, day, self.fetch_deadline)
            .await;

        let counts = self.engine.reconcile(&employees, &events, day).await?;
        info!(
            "attendance sync for {}: {} employees, {} created, {} updated",
            day,
            employees.len(),
            counts.created,
            counts.updated
        );

        Ok(SyncOutcome::Completed {
            employees: employees.len(),
            created: counts.created,
            updated: counts.updated,
        })
    }
}
