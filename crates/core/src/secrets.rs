use std::collections::HashMap;
use std::fmt;

use aws_config::BehaviorVersion;
use aws_sdk_secretsmanager::config::Region;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("failed to start secrets runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("failed to fetch secret '{name}': {reason}")]
    Fetch { name: String, reason: String },
    #[error("secret '{0}' has no string value")]
    NoStringValue(String),
    #[error("secret '{name}' is not a JSON object: {reason}")]
    InvalidJson { name: String, reason: String },
    #[error("secret '{name}' has no string field '{field}'")]
    MissingField { name: String, field: String },
    #[error("environment variable {0} is not set")]
    MissingEnv(String),
}

/// The upstream API key. Held for the lifetime of the process and never
/// printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn from_env(var: &str) -> Result<Self, SecretError> {
        match std::env::var(var) {
            Ok(value) if !value.is_empty() => Ok(Self(value)),
            _ => Err(SecretError::MissingEnv(var.to_string())),
        }
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

pub trait SecretSource {
    fn name(&self) -> &'static str;
    fn secret_string(&self, secret_id: &str) -> Result<String, SecretError>;
}

/// Reads secrets from AWS Secrets Manager using the default credential chain.
pub struct AwsSecretsManager {
    region: Option<String>,
}

impl AwsSecretsManager {
    pub fn new() -> Self {
        Self { region: None }
    }

    pub fn with_region(region: impl Into<String>) -> Self {
        Self {
            region: Some(region.into()),
        }
    }

    async fn fetch(&self, secret_id: &str) -> Result<String, SecretError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;
        let client = aws_sdk_secretsmanager::Client::new(&sdk_config);

        let output = client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| SecretError::Fetch {
                name: secret_id.to_string(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        output
            .secret_string()
            .map(str::to_string)
            .ok_or_else(|| SecretError::NoStringValue(secret_id.to_string()))
    }
}

impl Default for AwsSecretsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretSource for AwsSecretsManager {
    fn name(&self) -> &'static str {
        "aws-secrets-manager"
    }

    fn secret_string(&self, secret_id: &str) -> Result<String, SecretError> {
        // Startup is synchronous; the SDK needs a runtime only for this one call.
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.fetch(secret_id))
    }
}

/// In-memory secrets, keyed by secret name.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretSource {
    secrets: HashMap<String, String>,
}

impl StaticSecretSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }
}

impl SecretSource for StaticSecretSource {
    fn name(&self) -> &'static str {
        "static"
    }

    fn secret_string(&self, secret_id: &str) -> Result<String, SecretError> {
        self.secrets
            .get(secret_id)
            .cloned()
            .ok_or_else(|| SecretError::Fetch {
                name: secret_id.to_string(),
                reason: "secret not found".to_string(),
            })
    }
}

/// Fetches the secret bundle `secret_name`, decodes it as a JSON object and
/// returns the string stored under `field`.
pub fn load_api_key(
    source: &dyn SecretSource,
    secret_name: &str,
    field: &str,
) -> Result<ApiKey, SecretError> {
    tracing::debug!(source = source.name(), secret = secret_name, "fetching secret");
    let raw = source.secret_string(secret_name)?;

    let bundle: Value = serde_json::from_str(&raw).map_err(|e| SecretError::InvalidJson {
        name: secret_name.to_string(),
        reason: e.to_string(),
    })?;
    let object = bundle.as_object().ok_or_else(|| SecretError::InvalidJson {
        name: secret_name.to_string(),
        reason: "expected an object".to_string(),
    })?;

    object
        .get(field)
        .and_then(Value::as_str)
        .map(ApiKey::new)
        .ok_or_else(|| SecretError::MissingField {
            name: secret_name.to_string(),
            field: field.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(bundle: &str) -> StaticSecretSource {
        StaticSecretSource::new().with_secret("MCP_Secrets", bundle)
    }

    #[test]
    fn extracts_key_from_bundle() {
        let source = source(r#"{"AA_INTERNAL_API_KEY": "abc123", "OTHER": "x"}"#);
        let key = load_api_key(&source, "MCP_Secrets", "AA_INTERNAL_API_KEY").unwrap();
        assert_eq!(key.expose(), "abc123");
    }

    #[test]
    fn unknown_secret_fails_fetch() {
        let source = source("{}");
        let err = load_api_key(&source, "Missing", "AA_INTERNAL_API_KEY").unwrap_err();
        assert!(matches!(err, SecretError::Fetch { .. }));
    }

    #[test]
    fn rejects_invalid_json() {
        let source = source("abc123");
        let err = load_api_key(&source, "MCP_Secrets", "AA_INTERNAL_API_KEY").unwrap_err();
        assert!(matches!(err, SecretError::InvalidJson { .. }));
    }

    #[test]
    fn rejects_non_object_bundle() {
        let source = source(r#"["abc123"]"#);
        let err = load_api_key(&source, "MCP_Secrets", "AA_INTERNAL_API_KEY").unwrap_err();
        assert!(matches!(err, SecretError::InvalidJson { .. }));
    }

    #[test]
    fn rejects_missing_field() {
        let source = source(r#"{"SOMETHING_ELSE": "abc123"}"#);
        let err = load_api_key(&source, "MCP_Secrets", "AA_INTERNAL_API_KEY").unwrap_err();
        assert!(matches!(err, SecretError::MissingField { .. }));
    }

    #[test]
    fn rejects_non_string_field() {
        let source = source(r#"{"AA_INTERNAL_API_KEY": 42}"#);
        let err = load_api_key(&source, "MCP_Secrets", "AA_INTERNAL_API_KEY").unwrap_err();
        assert!(matches!(err, SecretError::MissingField { .. }));
    }

    #[test]
    fn debug_output_is_redacted() {
        let key = ApiKey::new("abc123");
        assert_eq!(format!("{:?}", key), "ApiKey(***)");
    }

    #[test]
    fn from_env_requires_variable() {
        let err = ApiKey::from_env("POLICY_MCP_TEST_UNSET_VARIABLE").unwrap_err();
        assert!(matches!(err, SecretError::MissingEnv(_)));
    }
}
