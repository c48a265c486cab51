use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_SECRET_NAME: &str = "MCP_Secrets";
pub const DEFAULT_API_KEY_FIELD: &str = "AA_INTERNAL_API_KEY";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("policy details URL is not configured")]
    MissingUrl,
    #[error("invalid policy details URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
}

/// Static settings for the gateway, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub policy_details_url: String,
    pub secret_name: String,
    pub api_key_field: String,
    pub default_timeout_secs: u64,
    pub aws_region: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            policy_details_url: String::new(),
            secret_name: DEFAULT_SECRET_NAME.to_string(),
            api_key_field: DEFAULT_API_KEY_FIELD.to_string(),
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
            aws_region: None,
        }
    }
}

/// Values that take precedence over the config file, usually from CLI flags
/// or the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub policy_details_url: Option<String>,
    pub secret_name: Option<String>,
    pub api_key_field: Option<String>,
    pub default_timeout_secs: Option<u64>,
    pub aws_region: Option<String>,
}

impl GatewayConfig {
    pub fn new(policy_details_url: impl Into<String>) -> Self {
        Self {
            policy_details_url: policy_details_url.into(),
            ..Self::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(url) = overrides.policy_details_url {
            self.policy_details_url = url;
        }
        if let Some(name) = overrides.secret_name {
            self.secret_name = name;
        }
        if let Some(field) = overrides.api_key_field {
            self.api_key_field = field;
        }
        if let Some(secs) = overrides.default_timeout_secs {
            self.default_timeout_secs = secs;
        }
        if overrides.aws_region.is_some() {
            self.aws_region = overrides.aws_region;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let raw = self.policy_details_url.trim();
        if raw.is_empty() {
            return Err(ConfigError::MissingUrl);
        }

        let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url: raw.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        if self.default_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }
}
