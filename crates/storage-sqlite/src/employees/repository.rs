use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;

use super::model::EmployeeDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::employees::dsl as employees_dsl;
use crate::utils::format_timestamp;
use rollcall_access_events::Pin;
use rollcall_core::employees::{Employee, EmployeeRepositoryTrait};
use rollcall_core::Result;

pub struct EmployeeRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl EmployeeRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    /// Provisioning hook for the HR subsystem (and tests). The core itself
    /// never writes employees; its trait is read-only.
    pub async fn insert(&self, employee: &Employee) -> Result<()> {
        let now = format_timestamp(Utc::now());
        let row = EmployeeDB {
            id: employee.id.clone(),
            pin: employee.pin.as_str().to_string(),
            display_name: employee.display_name.clone(),
            department: employee.department.clone(),
            is_active: employee.is_active,
            created_at: now.clone(),
            updated_at: now,
        };

        self.writer
            .exec(move |conn| {
                diesel::insert_into(employees_dsl::employees)
                    .values(&row)
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await
    }
}

impl EmployeeRepositoryTrait for EmployeeRepository {
    fn list_active(&self) -> Result<Vec<Employee>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = employees_dsl::employees
            .filter(employees_dsl::is_active.eq(true))
            .order(employees_dsl::display_name.asc())
            .select(EmployeeDB::as_select())
            .load::<EmployeeDB>(&mut conn)
            .into_core()?;

        Ok(rows.into_iter().map(Employee::from).collect())
    }

    fn get_by_id(&self, id: &str) -> Result<Option<Employee>> {
        let mut conn = get_connection(&self.pool)?;

        let row = employees_dsl::employees
            .find(id)
            .select(EmployeeDB::as_select())
            .first::<EmployeeDB>(&mut conn)
            .optional()
            .into_core()?;

        Ok(row.map(Employee::from))
    }

    fn get_by_pin(&self, pin: &Pin) -> Result<Option<Employee>> {
        let mut conn = get_connection(&self.pool)?;

        let row = employees_dsl::employees
            .filter(employees_dsl::pin.eq(pin.as_str()))
            .select(EmployeeDB::as_select())
            .first::<EmployeeDB>(&mut conn)
            .optional()
            .into_core()?;

        Ok(row.map(Employee::from))
    }
}
