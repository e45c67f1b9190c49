//! End-to-end attendance sync against a real SQLite database: scripted
//! upstream events flow through the coordinator into one reconciled record
//! per (employee, day).

mod common;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::{seed_employee, setup};
use rollcall_access_events::{
    AccessEventError, EventFetcher, FetchCoordinator, FetchOptions, Pin, RawEvent,
    TransactionSource,
};
use rollcall_core::attendance::{AttendanceStore, NewAttendanceRecord};
use rollcall_core::constants::UNKNOWN_AREA;
use rollcall_core::employees::EmployeeRepositoryTrait;
use rollcall_core::sync::{AttendanceSyncService, SyncOutcome};
use rollcall_storage_sqlite::attendance::AttendanceRepository;
use rollcall_storage_sqlite::employees::EmployeeRepository;

fn target_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

/// Replays a fixed per-pin event list, newest first, as the upstream does.
struct ScriptedSource {
    windows: HashMap<Pin, Vec<RawEvent>>,
}

#[async_trait]
impl TransactionSource for ScriptedSource {
    async fn fetch_window(
        &self,
        pin: &Pin,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<RawEvent>, AccessEventError> {
        Ok(self.windows.get(pin).cloned().unwrap_or_default())
    }
}

fn scan(pin: &str, hour: u32, minute: u32, area: Option<&str>) -> RawEvent {
    RawEvent {
        pin: Pin::new(pin),
        event_time: Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, 0).unwrap(),
        area_name: area.map(str::to_string),
    }
}

fn coordinator(windows: HashMap<Pin, Vec<RawEvent>>) -> Arc<FetchCoordinator> {
    let options = FetchOptions {
        max_attempts: 1,
        base_backoff: Duration::from_millis(1),
        backoff_jitter: Duration::ZERO,
        request_timeout: Duration::from_secs(5),
        cache_ttl: Duration::from_millis(1),
    };
    let fetcher = Arc::new(EventFetcher::new(
        Arc::new(ScriptedSource { windows }),
        options,
    ));
    Arc::new(FetchCoordinator::new(fetcher, 4))
}

#[tokio::test]
async fn test_sync_reconciles_scanned_and_absent_employees() {
    let db = setup().await;
    seed_employee(&db, "e1", "10001", "Dana Ruiz").await;
    seed_employee(&db, "e2", "10002", "Kim Osei").await;

    // Newest-first, as the upstream orders its response.
    let windows = HashMap::from([
        (
            Pin::new("10001"),
            vec![
                scan("10001", 14, 3, Some("areaA")),
                scan("10001", 8, 55, Some("areaB")),
            ],
        ),
        (Pin::new("10002"), Vec::new()),
    ]);

    let store = Arc::new(AttendanceRepository::new(db.pool.clone(), db.writer.clone()));
    let employees = Arc::new(EmployeeRepository::new(db.pool.clone(), db.writer.clone()));
    let service = AttendanceSyncService::new(coordinator(windows), store.clone(), employees, None);

    let outcome = service.sync_attendance(target_day()).await.unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Completed {
            employees: 2,
            created: 2,
            updated: 0
        }
    );

    let records = store
        .list_for_day(&["e1".to_string(), "e2".to_string()], target_day())
        .unwrap();
    assert_eq!(records.len(), 2);

    let e1 = records.iter().find(|r| r.employee_id == "e1").unwrap();
    assert_eq!(
        e1.first_in,
        Some(Utc.with_ymd_and_hms(2024, 6, 1, 8, 55, 0).unwrap())
    );
    assert_eq!(
        e1.last_out,
        Some(Utc.with_ymd_and_hms(2024, 6, 1, 14, 3, 0).unwrap())
    );
    assert_eq!(e1.area_in, "areaB");
    assert_eq!(e1.area_out, "areaA");

    let e2 = records.iter().find(|r| r.employee_id == "e2").unwrap();
    assert_eq!(e2.first_in, None);
    assert_eq!(e2.last_out, None);
    assert_eq!(e2.area_in, UNKNOWN_AREA);
    assert_eq!(e2.area_out, UNKNOWN_AREA);
}

#[tokio::test]
async fn test_second_sync_updates_in_place() {
    let db = setup().await;
    seed_employee(&db, "e1", "10001", "Dana Ruiz").await;

    let windows = HashMap::from([(
        Pin::new("10001"),
        vec![
            scan("10001", 14, 3, Some("areaA")),
            scan("10001", 8, 55, Some("areaB")),
        ],
    )]);

    let store = Arc::new(AttendanceRepository::new(db.pool.clone(), db.writer.clone()));
    let employees = Arc::new(EmployeeRepository::new(db.pool.clone(), db.writer.clone()));
    let service = AttendanceSyncService::new(coordinator(windows), store.clone(), employees, None);

    service.sync_attendance(target_day()).await.unwrap();
    let first = store.list_for_day(&["e1".to_string()], target_day()).unwrap();

    let outcome = service.sync_attendance(target_day()).await.unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Completed {
            employees: 1,
            created: 0,
            updated: 1
        }
    );

    let second = store.list_for_day(&["e1".to_string()], target_day()).unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].id, first[0].id);
    assert_eq!(second[0].first_in, first[0].first_in);
    assert_eq!(second[0].last_out, first[0].last_out);
    assert_eq!(second[0].area_in, first[0].area_in);
    assert_eq!(second[0].area_out, first[0].area_out);
}

#[tokio::test]
async fn test_duplicate_create_rolls_back_whole_batch() {
    let db = setup().await;
    let employee = seed_employee(&db, "e1", "10001", "Dana Ruiz").await;
    seed_employee(&db, "e2", "10002", "Kim Osei").await;

    let store = AttendanceRepository::new(db.pool.clone(), db.writer.clone());

    let fresh = |id: &str, employee_id: &str| NewAttendanceRecord {
        id: id.to_string(),
        employee_id: employee_id.to_string(),
        day: target_day(),
        first_in: None,
        last_out: None,
        area_in: UNKNOWN_AREA.to_string(),
        area_out: UNKNOWN_AREA.to_string(),
    };

    store
        .apply_batch(vec![fresh("a1", &employee.id)], Vec::new())
        .await
        .unwrap();

    // One valid create, one duplicate day: atomicity demands neither lands.
    let err = store
        .apply_batch(
            vec![fresh("b1", "e2"), fresh("b2", &employee.id)],
            Vec::new(),
        )
        .await
        .unwrap_err();
    assert!(err.is_unique_violation());

    let records = store
        .list_for_day(&["e1".to_string(), "e2".to_string()], target_day())
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "a1");
}

#[tokio::test]
async fn test_overwrite_can_null_out_timestamps() {
    let db = setup().await;
    seed_employee(&db, "e1", "10001", "Dana Ruiz").await;

    let store = Arc::new(AttendanceRepository::new(db.pool.clone(), db.writer.clone()));
    let employees = Arc::new(EmployeeRepository::new(db.pool.clone(), db.writer.clone()));

    let with_scans = HashMap::from([(
        Pin::new("10001"),
        vec![scan("10001", 8, 55, Some("areaB"))],
    )]);
    let service =
        AttendanceSyncService::new(coordinator(with_scans), store.clone(), employees.clone(), None);
    service.sync_attendance(target_day()).await.unwrap();

    // A later run that fetched nothing overwrites wholesale, back to nulls.
    let without_scans = HashMap::from([(Pin::new("10001"), Vec::new())]);
    let service =
        AttendanceSyncService::new(coordinator(without_scans), store.clone(), employees, None);
    service.sync_attendance(target_day()).await.unwrap();

    let records = store.list_for_day(&["e1".to_string()], target_day()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].first_in, None);
    assert_eq!(records[0].last_out, None);
    assert_eq!(records[0].area_in, UNKNOWN_AREA);
}

#[tokio::test]
async fn test_employee_repository_reads() {
    let db = setup().await;
    let dana = seed_employee(&db, "e1", "10001", "Dana Ruiz").await;

    let repo = EmployeeRepository::new(db.pool.clone(), db.writer.clone());

    let active = repo.list_active().unwrap();
    assert_eq!(active, vec![dana.clone()]);

    assert_eq!(repo.get_by_id("e1").unwrap(), Some(dana.clone()));
    assert_eq!(repo.get_by_pin(&Pin::new("10001")).unwrap(), Some(dana));
    assert_eq!(repo.get_by_id("missing").unwrap(), None);
}
