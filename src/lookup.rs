//! Remote lookup client: one retried HTTP GET per row id

use crate::config::LookupConfig;
use crate::error::LookupError;
use crate::retry::call_with_retry;
use crate::types::LookupResult;
use async_trait::async_trait;
use serde_json::Value;

/// Per-row lookup abstraction used by the fetch coordinator
///
/// Production code uses [`HttpLookupClient`]; coordinator tests substitute
/// scripted implementations so concurrency and cancellation behavior can be
/// exercised without a network.
#[async_trait]
pub trait LookupService: Send + Sync {
    /// Resolve one row id to its lookup result, retrying transient failures
    ///
    /// An `Err` return is terminal: the retry budget is exhausted or the
    /// failure class is not retryable.
    async fn lookup(&self, id: &str) -> Result<LookupResult, LookupError>;
}

/// HTTP lookup client issuing `GET {base_url}?id={id}`
///
/// A 2xx response with a JSON object body yields a [`LookupResult`]. Network
/// errors and non-2xx statuses are retried per the configured policy; a
/// malformed success body is terminal immediately since it would replay
/// identically on every attempt.
pub struct HttpLookupClient {
    http: reqwest::Client,
    config: LookupConfig,
}

impl HttpLookupClient {
    /// Create a client for the configured endpoint
    pub fn new(config: LookupConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a client reusing an existing HTTP connection pool
    pub fn with_client(http: reqwest::Client, config: LookupConfig) -> Self {
        Self { http, config }
    }

    async fn fetch_once(&self, id: &str) -> Result<LookupResult, LookupError> {
        let response = self
            .http
            .get(&self.config.base_url)
            .query(&[("id", id)])
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| LookupError::Request {
                id: id.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status {
                id: id.to_string(),
                status,
            });
        }

        let body: Value = response.json().await.map_err(|e| LookupError::MalformedBody {
            id: id.to_string(),
            source: e,
        })?;

        match body {
            Value::Object(fields) => Ok(LookupResult::from_fields(fields)),
            _ => Err(LookupError::NotAnObject { id: id.to_string() }),
        }
    }
}

#[async_trait]
impl LookupService for HttpLookupClient {
    async fn lookup(&self, id: &str) -> Result<LookupResult, LookupError> {
        tracing::debug!(id = %id, "dispatching lookup");
        call_with_retry(&self.config.retry, || self.fetch_once(id)).await
    }
}
