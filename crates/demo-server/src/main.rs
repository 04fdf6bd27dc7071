mod middleware;
mod tools;

use anyhow::Context as _;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use unrelated_mcp_config::{RuntimeConfig, TransportKind};
use unrelated_mcp_runtime::logging::{LogFormat, init_tracing};
use unrelated_mcp_runtime::{ApiKeyVerifier, AuthOptions, McpApp, ServerIdentity};

/// Variables injected at build time from `unrelated-mcp.config.yaml`.
const EMBEDDED_ARTIFACT: &str = include_str!(concat!(env!("OUT_DIR"), "/injected.json"));

#[derive(Debug, Parser)]
#[command(name = "unrelated-mcp-demo", version, about = "Example Unrelated MCP tool server")]
struct Args {
    /// Injected-variables artifact to load instead of the embedded one.
    #[arg(long, env = "UNRELATED_MCP_ARTIFACT")]
    artifact: Option<PathBuf>,

    /// Serving mode (`http` or `stdio`). Defaults to HTTP when enabled.
    #[arg(long, env = "UNRELATED_MCP_TRANSPORT")]
    transport: Option<TransportKind>,

    /// Require this API key (`x-api-key` or bearer) on HTTP requests.
    #[arg(long, env = "UNRELATED_MCP_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Log level / filter (overridden by `RUST_LOG`).
    #[arg(long, env = "UNRELATED_MCP_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// `text` or `json`.
    #[arg(long, env = "UNRELATED_MCP_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(Some(&args.log_level), args.log_format);

    let config = match &args.artifact {
        Some(path) => RuntimeConfig::load(path)
            .with_context(|| format!("load artifact {}", path.display()))?,
        None => RuntimeConfig::from_json_str(EMBEDDED_ARTIFACT)
            .context("decode embedded artifact")?,
    };

    let catalog = tools::catalog(&config.tools_path);
    let mut app = McpApp::new(Arc::new(config), catalog)
        .with_identity(ServerIdentity {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
        .with_middleware(middleware::module());

    if let Some(key) = args.api_key {
        app = app.with_verifier(
            Arc::new(ApiKeyVerifier::new().with_key(key, "demo-client")),
            AuthOptions::default(),
        );
    }

    app.run(args.transport).await.context("server failed")?;
    Ok(())
}
