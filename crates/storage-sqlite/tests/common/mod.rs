//! Shared test database setup.

use std::sync::Arc;
use tempfile::TempDir;

use rollcall_access_events::Pin;
use rollcall_core::employees::Employee;
use rollcall_storage_sqlite::employees::EmployeeRepository;
use rollcall_storage_sqlite::{init, spawn_writer, DbPool, WriteHandle};

pub struct TestDb {
    pub pool: Arc<DbPool>,
    pub writer: WriteHandle,
    _dir: TempDir,
}

/// Fresh on-disk database with migrations applied and a writer actor
/// running.
pub async fn setup() -> TestDb {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("rollcall-test.db");
    let pool = Arc::new(init(path.to_str().expect("utf-8 path")).expect("init database"));
    let writer = spawn_writer(pool.as_ref().clone());

    TestDb {
        pool,
        writer,
        _dir: dir,
    }
}

pub async fn seed_employee(db: &TestDb, id: &str, pin: &str, name: &str) -> Employee {
    let employee = Employee {
        id: id.to_string(),
        pin: Pin::new(pin),
        display_name: name.to_string(),
        department: Some("Mathematics".to_string()),
        is_active: true,
    };

    EmployeeRepository::new(db.pool.clone(), db.writer.clone())
        .insert(&employee)
        .await
        .expect("seed employee");

    employee
}
