pub mod model;
pub mod repository;

pub use model::{AttendanceOverwriteDB, AttendanceRecordDB};
pub use repository::AttendanceRepository;
