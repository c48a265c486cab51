use std::time::Duration;

use serde_json::{json, Value};

use crate::config::GatewayConfig;
use crate::executor::{QueryParams, RequestExecutor};
use crate::secrets::ApiKey;

pub const FETCH_FAILED: &str = "Failed to fetch policy details";

/// Looks up policy details from the configured upstream endpoint.
#[derive(Debug, Clone)]
pub struct PolicyDetails {
    config: GatewayConfig,
    api_key: ApiKey,
    executor: RequestExecutor,
}

impl PolicyDetails {
    pub fn new(config: GatewayConfig, api_key: ApiKey) -> reqwest::Result<Self> {
        Ok(Self {
            config,
            api_key,
            executor: RequestExecutor::new()?,
        })
    }

    /// Returns the upstream payload unchanged, or `{"error": FETCH_FAILED}`.
    ///
    /// The caller's `url` and `params` are accepted for compatibility with
    /// existing tool clients but are not forwarded: the request always goes
    /// to the configured endpoint with `api_key` as its only parameter.
    /// `timeout_secs` falls back to the configured default; a value that is
    /// not a positive, representable duration counts as a failed fetch.
    pub fn get_policy_details(
        &self,
        url: &str,
        params: &QueryParams,
        timeout_secs: Option<f64>,
    ) -> Value {
        if !url.is_empty() || !params.is_empty() {
            tracing::debug!(
                requested_url = url,
                ignored_params = params.len(),
                "caller url and params are not forwarded"
            );
        }

        let timeout = match self.resolve_timeout(timeout_secs) {
            Ok(timeout) => timeout,
            Err(reason) => {
                tracing::warn!(url = %self.config.policy_details_url, "{}", reason);
                return fetch_failed();
            }
        };

        let mut query = QueryParams::new();
        query.insert(
            "api_key".to_string(),
            Value::String(self.api_key.expose().to_string()),
        );

        match self
            .executor
            .execute(&self.config.policy_details_url, &query, timeout)
        {
            // A literal `null` body carries no payload.
            Some(Value::Null) | None => fetch_failed(),
            Some(payload) => payload,
        }
    }

    fn resolve_timeout(&self, secs: Option<f64>) -> Result<Duration, String> {
        let Some(secs) = secs else {
            return Ok(self.config.default_timeout());
        };
        if secs <= 0.0 {
            return Err(format!("timeout must be positive, got {}", secs));
        }
        Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid timeout {}: {}", secs, e))
    }
}

fn fetch_failed() -> Value {
    json!({ "error": FETCH_FAILED })
}
