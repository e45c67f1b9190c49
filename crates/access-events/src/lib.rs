//! Client for the access-control transaction API.
//!
//! This crate owns everything that talks to the upstream badge/turnstile
//! event source: the wire models, the error taxonomy with its retry
//! classification, a short-lived response cache, and the bounded fan-out
//! used to pull one window per employee.
//!
//! # Architecture
//!
//! ```text
//! FetchCoordinator (semaphore-bounded fan-out)
//!       │
//!       └─► EventFetcher (cache + retry + fail-open)
//!                 │
//!                 └─► TransactionSource (HTTP GET, access token)
//! ```
//!
//! The upstream is treated as unreliable by design: every failure path
//! degrades to "no events for this employee" so one outage never sinks a
//! whole sync run.

pub mod cache;
pub mod coordinator;
pub mod errors;
pub mod fetcher;
pub mod models;
pub mod source;

pub use cache::FetchCache;
pub use coordinator::{FetchCoordinator, DEFAULT_FETCH_CONCURRENCY};
pub use errors::{AccessEventError, RetryClass};
pub use fetcher::{EventFetcher, FetchOptions};
pub use models::{Pin, RawEvent};
pub use source::{HttpTransactionSource, TransactionSource};
