//! The data client.
//!
//! [`DataClient::fetch_all`] issues one GET against the configured URL on a
//! spawned task and hands back a [`FetchHandle`], a future that resolves
//! exactly once with either the records or a [`ClientError`]. There is no
//! retry, caching or deduplication: every call is one request.

pub mod view;

pub use view::{RecordView, ViewStatus};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::{ErrorBody, Record};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Clone)]
pub struct DataClient {
    http: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl DataClient {
    /// Build a client for the configured URL and timeout.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let endpoint = config.endpoint()?;
        let timeout = config.timeout_duration();

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ClientError::invalid_config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Start fetching all records without waiting for the result.
    ///
    /// Must be called from within a tokio runtime. Dropping the handle does
    /// not cancel the request.
    pub fn fetch_all(&self) -> FetchHandle {
        let client = self.clone();
        FetchHandle {
            inner: tokio::spawn(async move { client.get_all().await }),
        }
    }

    /// Perform the GET and decode the body, on the caller's task.
    pub async fn get_all(&self) -> ClientResult<Vec<Record>> {
        let url = self.endpoint.to_string();
        debug!(url = %url, "Fetching records");

        let response = self
            .http
            .get(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(ClientError::status(
                status.as_u16(),
                error_message(status, &body),
            ));
        }

        let records = parse_records(&body)?;
        info!(url = %url, rows = records.len(), "Fetched records");
        Ok(records)
    }

    fn transport_error(&self, err: reqwest::Error) -> ClientError {
        let url = self.endpoint.to_string();
        if err.is_timeout() {
            ClientError::Timeout {
                url,
                elapsed_secs: self.timeout.as_secs(),
            }
        } else {
            ClientError::Network { url, source: err }
        }
    }
}

/// Decode a gateway response body into records.
///
/// Anything other than a JSON array of objects (including `null`) is a
/// decode error.
pub fn parse_records(body: &[u8]) -> ClientResult<Vec<Record>> {
    serde_json::from_slice::<Vec<Record>>(body).map_err(|e| ClientError::decode(e.to_string()))
}

/// Pull a readable message out of an error response.
fn error_message(status: reqwest::StatusCode, body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        return parsed.error.message;
    }
    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown status")
            .to_string()
    } else {
        text
    }
}

/// Pending result of [`DataClient::fetch_all`].
///
/// Resolves once; awaiting consumes it.
#[derive(Debug)]
pub struct FetchHandle {
    inner: JoinHandle<ClientResult<Vec<Record>>>,
}

impl Future for FetchHandle {
    type Output = ClientResult<Vec<Record>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.inner).poll(cx).map(|joined| match joined {
            Ok(outcome) => outcome,
            Err(e) => Err(ClientError::Task {
                message: e.to_string(),
            }),
        })
    }
}
