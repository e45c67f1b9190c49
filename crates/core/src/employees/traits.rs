use super::Employee;
use crate::errors::Result;
use rollcall_access_events::Pin;

/// Read-only employee lookups.
///
/// Writes belong to the HR admin subsystem and are deliberately absent here.
pub trait EmployeeRepositoryTrait: Send + Sync {
    /// All employees currently eligible for attendance tracking.
    fn list_active(&self) -> Result<Vec<Employee>>;

    fn get_by_id(&self, id: &str) -> Result<Option<Employee>>;

    fn get_by_pin(&self, pin: &Pin) -> Result<Option<Employee>>;
}
