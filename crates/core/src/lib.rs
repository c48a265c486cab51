pub mod config;
pub mod executor;
pub mod policy;
pub mod secrets;

pub use config::{ConfigError, ConfigOverrides, GatewayConfig};
pub use executor::{QueryParams, RequestExecutor, RequestFailure};
pub use policy::{PolicyDetails, FETCH_FAILED};
pub use secrets::{
    load_api_key, ApiKey, AwsSecretsManager, SecretError, SecretSource, StaticSecretSource,
};
