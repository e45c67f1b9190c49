//! Outbound surface of the transaction API.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use std::time::Duration;

use crate::errors::AccessEventError;
use crate::models::{Pin, RawEvent, TransactionPage};

/// Default total timeout for one transactions request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One employee's event history over an inclusive day window.
///
/// Implementations return the upstream's list as-is (including its claimed
/// newest-first ordering); retry, caching, and degradation live in the
/// [`EventFetcher`](crate::fetcher::EventFetcher) on top of this trait.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn fetch_window(
        &self,
        pin: &Pin,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawEvent>, AccessEventError>;
}

/// HTTP implementation backed by the access-control transaction endpoint.
///
/// Queries `GET {base_url}/transaction/list` with an access token and the
/// window expanded to `[start 00:00:00, end 23:59:59]`, the granularity the
/// upstream expects.
pub struct HttpTransactionSource {
    client: Client,
    base_url: String,
    access_token: String,
}

impl HttpTransactionSource {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
            access_token: access_token.into(),
        }
    }
}

#[async_trait]
impl TransactionSource for HttpTransactionSource {
    async fn fetch_window(
        &self,
        pin: &Pin,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawEvent>, AccessEventError> {
        let url = format!("{}/transaction/list", self.base_url.trim_end_matches('/'));
        let start_param = format!("{} 00:00:00", start.format("%Y-%m-%d"));
        let end_param = format!("{} 23:59:59", end.format("%Y-%m-%d"));

        let response = self
            .client
            .get(&url)
            .query(&[
                ("personPin", pin.as_str()),
                ("startDate", start_param.as_str()),
                ("endDate", end_param.as_str()),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AccessEventError::Timeout {
                        pin: pin.to_string(),
                    }
                } else {
                    AccessEventError::Network(e)
                }
            })?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AccessEventError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(AccessEventError::Http {
                status: response.status().as_u16(),
            });
        }

        let page = response.json::<TransactionPage>().await.map_err(|e| {
            if e.is_timeout() {
                AccessEventError::Timeout {
                    pin: pin.to_string(),
                }
            } else {
                AccessEventError::Decode(e.to_string())
            }
        })?;

        Ok(page.into_events(pin))
    }
}
