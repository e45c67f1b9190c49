//! Rollcall Core - domain entities, services, and traits.
//!
//! This crate contains the attendance business logic: reconciling fetched
//! access-control events into daily records, correcting stale check-in
//! sessions, and fanning out new check-ins to live viewers. It is
//! database-agnostic and defines traits that are implemented by the
//! `rollcall-storage-sqlite` crate.

pub mod attendance;
pub mod checkins;
pub mod constants;
pub mod employees;
pub mod errors;
pub mod notifications;
pub mod sync;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
