//! Error types and retry classification for the transaction API client.

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors from one outbound call to the transaction API.
///
/// Each variant maps to a [`RetryClass`] via [`retry_class`](Self::retry_class),
/// which drives the fetcher's retry loop. None of these ever escape the
/// fetcher as hard failures; after the retry budget they all degrade to an
/// empty event list.
#[derive(Error, Debug)]
pub enum AccessEventError {
    /// The call exceeded its total timeout budget.
    #[error("Request timed out for pin {pin}")]
    Timeout {
        /// The employee pin whose window was being fetched
        pin: String,
    },

    /// The upstream rate limited the request (HTTP 429).
    #[error("Rate limited by the transaction API")]
    RateLimited,

    /// The upstream returned a non-success status.
    /// Server-side errors (5xx) are retried; client errors are not.
    #[error("Transaction API returned HTTP {status}")]
    Http {
        /// The HTTP status code
        status: u16,
    },

    /// A network-level error occurred before a response arrived.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body did not match the expected envelope.
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl AccessEventError {
    /// Returns the retry classification for this error.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Timeout { .. } | Self::RateLimited | Self::Network(_) => RetryClass::WithBackoff,
            Self::Http { status } if *status >= 500 => RetryClass::WithBackoff,
            Self::Http { .. } | Self::Decode(_) => RetryClass::Never,
        }
    }
}
