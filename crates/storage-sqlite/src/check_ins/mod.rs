pub mod model;
pub mod repository;

pub use model::CheckInSessionDB;
pub use repository::CheckInRepository;
