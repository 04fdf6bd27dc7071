#![allow(dead_code)]

use anyhow::Context as _;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use unrelated_mcp_config::injection::{BuildMode, project, write_artifact};
use unrelated_mcp_config::{ResolvedConfig, ResolvedPathsConfig, defaults};

pub use unrelated_test_support::{
    KillOnDrop, McpClient, pick_unused_port, read_json_rpc, wait_http_ok,
};

pub const BIN: &str = env!("CARGO_BIN_EXE_unrelated-mcp-demo");

/// Write an artifact with HTTP on `port` and stdio enabled.
pub fn write_test_artifact(dir: &Path, port: u16) -> anyhow::Result<PathBuf> {
    let mut http = defaults::http();
    http.port = port;
    let resolved = ResolvedConfig {
        http: Some(http),
        cors: Some(defaults::cors()),
        stdio: Some(defaults::stdio()),
        paths: ResolvedPathsConfig {
            tools: "src/tools".into(),
        },
        oauth: None,
    };
    let vars = project(&resolved, BuildMode::Development)?;
    Ok(write_artifact(dir, &vars)?)
}

pub fn spawn_http(artifact: &Path, extra_args: &[&str]) -> anyhow::Result<KillOnDrop> {
    let child: Child = Command::new(BIN)
        .arg("--artifact")
        .arg(artifact)
        .arg("--transport")
        .arg("http")
        .arg("--log-level")
        .arg("info")
        .args(extra_args)
        .env_remove("UNRELATED_MCP_API_KEY")
        .stdout(Stdio::null())
        .spawn()
        .context("spawn demo server")?;
    Ok(KillOnDrop(child))
}
