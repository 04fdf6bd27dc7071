mod common;

use serde_json::{Value, json};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader};
use tokio::process::Command;

async fn send(stdin: &mut tokio::process::ChildStdin, msg: Value) -> anyhow::Result<()> {
    stdin.write_all(format!("{msg}\n").as_bytes()).await?;
    stdin.flush().await?;
    Ok(())
}

async fn next_with_id(
    lines: &mut tokio::io::Lines<BufReader<tokio::process::ChildStdout>>,
    id: u64,
) -> anyhow::Result<Value> {
    loop {
        let line = tokio::time::timeout(Duration::from_secs(15), lines.next_line())
            .await??
            .ok_or_else(|| anyhow::anyhow!("stdout closed"))?;
        let msg: Value = serde_json::from_str(&line)?;
        if msg.get("id") == Some(&json!(id)) {
            return Ok(msg);
        }
    }
}

#[tokio::test]
async fn stdio_round_trip() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let artifact = common::write_test_artifact(dir.path(), common::pick_unused_port()?)?;

    let mut child = Command::new(common::BIN)
        .arg("--artifact")
        .arg(&artifact)
        .arg("--transport")
        .arg("stdio")
        .env_remove("UNRELATED_MCP_API_KEY")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()?;
    let mut stdin = child.stdin.take().ok_or_else(|| anyhow::anyhow!("no stdin"))?;
    let stdout = child.stdout.take().ok_or_else(|| anyhow::anyhow!("no stdout"))?;
    let mut lines = BufReader::new(stdout).lines();

    send(
        &mut stdin,
        json!({
            "jsonrpc": "2.0", "id": 1, "method": "initialize",
            "params": unrelated_test_support::initialize_params()
        }),
    )
    .await?;
    let init = next_with_id(&mut lines, 1).await?;
    assert_eq!(init["result"]["serverInfo"]["name"], "unrelated-mcp-demo");

    send(
        &mut stdin,
        json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
    )
    .await?;
    send(
        &mut stdin,
        json!({
            "jsonrpc": "2.0", "id": 2, "method": "tools/call",
            "params": { "name": "greet", "arguments": { "name": "Lin" } }
        }),
    )
    .await?;
    let call = next_with_id(&mut lines, 2).await?;
    assert_eq!(call["result"]["content"][0]["text"], "Hello, Lin!");

    // Closing stdin ends the session and the process exits cleanly.
    drop(stdin);
    let status = tokio::time::timeout(Duration::from_secs(15), child.wait()).await??;
    assert!(status.success());
    Ok(())
}
