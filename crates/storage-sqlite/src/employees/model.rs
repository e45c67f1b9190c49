//! Database model for employees.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use rollcall_access_events::Pin;
use rollcall_core::employees::Employee;

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
#[diesel(table_name = crate::schema::employees)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDB {
    pub id: String,
    pub pin: String,
    pub display_name: String,
    pub department: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<EmployeeDB> for Employee {
    fn from(db: EmployeeDB) -> Self {
        Employee {
            id: db.id,
            pin: Pin::new(db.pin),
            display_name: db.display_name,
            department: db.department,
            is_active: db.is_active,
        }
    }
}
