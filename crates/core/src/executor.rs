use std::error::Error as StdError;
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{Map, Value};
use thiserror::Error;

const USER_AGENT: &str = concat!("policy-mcp/", env!("CARGO_PKG_VERSION"));

pub type QueryParams = Map<String, Value>;

/// Why a GET did not produce a JSON value. Variants are listed in the order
/// they are checked.
#[derive(Debug, Error)]
pub enum RequestFailure {
    #[error("request timeout after {timeout:?} for URL: {url}")]
    Timeout { url: String, timeout: Duration },
    #[error("connection error for URL: {url} - {reason}")]
    Connection { url: String, reason: String },
    #[error("HTTP error {status} for URL: {url}")]
    Status { url: String, status: u16 },
    #[error("JSON decode error for URL: {url} - invalid JSON response: {reason}")]
    MalformedBody { url: String, reason: String },
    #[error("unexpected error for URL: {url} - {reason}")]
    Unclassified { url: String, reason: String },
}

impl RequestFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Connection { .. } => "connection",
            Self::Status { .. } => "http_status",
            Self::MalformedBody { .. } => "malformed_body",
            Self::Unclassified { .. } => "unclassified",
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url, .. }
            | Self::Connection { url, .. }
            | Self::Status { url, .. }
            | Self::MalformedBody { url, .. }
            | Self::Unclassified { url, .. } => url,
        }
    }

    fn from_transport(url: &str, timeout: Duration, err: reqwest::Error) -> Self {
        // The query string carries the API key, keep it out of diagnostics.
        let err = err.without_url();
        let url = url.to_string();

        if err.is_timeout() {
            Self::Timeout { url, timeout }
        } else if err.is_connect() {
            Self::Connection {
                url,
                reason: describe(&err),
            }
        } else if let Some(status) = err.status() {
            Self::Status {
                url,
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            Self::MalformedBody {
                url,
                reason: describe(&err),
            }
        } else {
            Self::Unclassified {
                url,
                reason: describe(&err),
            }
        }
    }
}

fn describe(err: &dyn StdError) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ")
}

/// Performs single blocking GET requests and decodes JSON responses.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: Client,
}

impl RequestExecutor {
    pub fn new() -> reqwest::Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }

    /// Fetches `url` and returns the decoded body, or `None` after logging
    /// the failure. Never panics or propagates an error.
    pub fn execute(&self, url: &str, params: &QueryParams, timeout: Duration) -> Option<Value> {
        match self.try_execute(url, params, timeout) {
            Ok(value) => Some(value),
            Err(failure) => {
                tracing::warn!(kind = failure.kind(), url = failure.url(), "{}", failure);
                None
            }
        }
    }

    pub fn try_execute(
        &self,
        url: &str,
        params: &QueryParams,
        timeout: Duration,
    ) -> Result<Value, RequestFailure> {
        let response = self
            .client
            .get(url)
            .query(params)
            .timeout(timeout)
            .send()
            .map_err(|e| RequestFailure::from_transport(url, timeout, e))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(RequestFailure::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .map_err(|e| RequestFailure::from_transport(url, timeout, e))?;

        serde_json::from_slice(&body).map_err(|e| RequestFailure::MalformedBody {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}
