use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use policy_mcp::server::McpServer;
use policy_mcp::tools::Tools;
use policy_mcp_core::{
    load_api_key, ApiKey, AwsSecretsManager, ConfigOverrides, GatewayConfig, PolicyDetails,
};

#[derive(Parser)]
#[command(name = "policy-mcp")]
#[command(version)]
#[command(about = "MCP server exposing policy details lookup over stdio")]
struct Cli {
    #[arg(long, env = "POLICY_MCP_CONFIG", help = "JSON config file")]
    config: Option<PathBuf>,
    #[arg(long, env = "GET_POLICY_DETAILS_URL", help = "Policy details endpoint")]
    policy_details_url: Option<String>,
    #[arg(long, env = "POLICY_MCP_SECRET_NAME", help = "Secrets Manager secret name [default: MCP_Secrets]")]
    secret_name: Option<String>,
    #[arg(long, env = "POLICY_MCP_API_KEY_FIELD", help = "Field holding the API key [default: AA_INTERNAL_API_KEY]")]
    api_key_field: Option<String>,
    #[arg(long, help = "Read the API key from this environment variable instead of Secrets Manager")]
    api_key_env: Option<String>,
    #[arg(long, env = "POLICY_MCP_TIMEOUT", help = "Default request timeout in seconds [default: 10]")]
    timeout: Option<u64>,
    #[arg(long, env = "AWS_REGION", help = "AWS region for Secrets Manager")]
    aws_region: Option<String>,
    #[arg(long, env = "POLICY_MCP_LOG", default_value = "info", help = "Log filter")]
    log_level: String,
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries the protocol
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(false),
        )
        .init();
}

fn load_config(cli: &Cli) -> Result<GatewayConfig> {
    let base = match &cli.config {
        Some(path) => GatewayConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => GatewayConfig::default(),
    };

    let config = base.with_overrides(ConfigOverrides {
        policy_details_url: cli.policy_details_url.clone(),
        secret_name: cli.secret_name.clone(),
        api_key_field: cli.api_key_field.clone(),
        default_timeout_secs: cli.timeout,
        aws_region: cli.aws_region.clone(),
    });
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn load_key(cli: &Cli, config: &GatewayConfig) -> Result<ApiKey> {
    if let Some(var) = &cli.api_key_env {
        tracing::info!(var = %var, "reading API key from environment");
        return ApiKey::from_env(var).context("failed to read API key");
    }

    let source = match &config.aws_region {
        Some(region) => AwsSecretsManager::with_region(region),
        None => AwsSecretsManager::new(),
    };
    load_api_key(&source, &config.secret_name, &config.api_key_field)
        .context("failed to load API key from Secrets Manager")
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let api_key = load_key(&cli, &config)?;
    tracing::info!(
        endpoint = %config.policy_details_url,
        timeout_secs = config.default_timeout_secs,
        "policy-mcp ready"
    );

    let policy = PolicyDetails::new(config, api_key).context("failed to build HTTP client")?;
    let mut server = McpServer::new(Tools::new(policy));
    server.serve(io::stdin().lock(), io::stdout())?;

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    run(cli).inspect_err(|e| tracing::error!("policy-mcp failed: {:#}", e))
}
