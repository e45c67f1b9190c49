pub mod model;
pub mod repository;

pub use model::EmployeeDB;
pub use repository::EmployeeRepository;
