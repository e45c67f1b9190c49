//! Daily attendance records and their reconciliation.

pub mod model;
pub mod reconcile;
pub mod store;

pub use model::{
    AttendanceOverwrite, AttendanceRecord, DerivedDay, NewAttendanceRecord, ReconcileCounts,
};
pub use reconcile::ReconciliationEngine;
pub use store::AttendanceStore;
