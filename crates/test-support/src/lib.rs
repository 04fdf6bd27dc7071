use anyhow::Context as _;
use futures::StreamExt as _;
use serde_json::{Value, json};
use std::net::TcpListener;
use std::process::Child;
use std::time::{Duration, Instant};

pub struct KillOnDrop(pub Child);

impl Drop for KillOnDrop {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

/// Pick an unused TCP port on localhost.
///
/// Note: this does not reserve the port; it's still possible for another process to bind it
/// before you do.
///
/// # Errors
///
/// Returns an error if binding an ephemeral localhost port fails or if the bound socket's
/// local address cannot be read.
pub fn pick_unused_port() -> anyhow::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").context("bind ephemeral port")?;
    Ok(listener.local_addr()?.port())
}

/// Poll an HTTP URL until it returns a success status (2xx/3xx).
///
/// # Errors
///
/// Returns an error if the timeout elapses before the endpoint returns a success status.
pub async fn wait_http_ok(url: &str, timeout_dur: Duration) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let start = Instant::now();
    loop {
        if start.elapsed() > timeout_dur {
            anyhow::bail!("timed out waiting for {url}");
        }

        match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            _ => tokio::time::sleep(Duration::from_millis(200)).await,
        }
    }
}

/// Read one JSON-RPC message from a streamable HTTP response, which may be plain JSON or an
/// event stream.
///
/// # Errors
///
/// Returns an error if the body is neither, or the stream ends without a message.
pub async fn read_json_rpc(resp: reqwest::Response) -> anyhow::Result<Value> {
    let is_sse = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/event-stream"));
    if !is_sse {
        return resp.json().await.context("parse JSON response");
    }

    let mut stream = sse_stream::SseStream::from_byte_stream(resp.bytes_stream());
    while let Some(evt) = stream.next().await {
        let evt = evt.context("read SSE event")?;
        let payload = evt.data.unwrap_or_default();
        if payload.trim().is_empty() {
            continue;
        }
        return serde_json::from_str(&payload).context("parse SSE data as JSON");
    }
    anyhow::bail!("event-stream ended without a JSON message")
}

/// Minimal client for a stateless streamable HTTP endpoint.
pub struct McpClient {
    http: reqwest::Client,
    url: String,
    auth_header: Option<String>,
}

impl McpClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            auth_header: None,
        }
    }

    #[must_use]
    pub fn with_bearer(mut self, token: &str) -> Self {
        self.auth_header = Some(format!("Bearer {token}"));
        self
    }

    /// POST a raw JSON-RPC message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent.
    pub async fn post(&self, body: &Value) -> anyhow::Result<reqwest::Response> {
        let mut req = self
            .http
            .post(&self.url)
            .header(reqwest::header::ACCEPT, "application/json, text/event-stream")
            .json(body);
        if let Some(h) = &self.auth_header {
            req = req.header(reqwest::header::AUTHORIZATION, h);
        }
        req.send().await.context("POST mcp")
    }

    /// Send a request and read its JSON-RPC response.
    ///
    /// # Errors
    ///
    /// Returns an error on a non-2xx status or an unreadable response.
    pub async fn request(&self, id: u64, method: &str, params: Value) -> anyhow::Result<Value> {
        let resp = self
            .post(&json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }))
            .await?;
        anyhow::ensure!(
            resp.status().is_success(),
            "{method} failed with HTTP {}",
            resp.status()
        );
        read_json_rpc(resp).await
    }

    /// # Errors
    ///
    /// See [`McpClient::request`].
    pub async fn initialize(&self) -> anyhow::Result<Value> {
        self.request(0, "initialize", initialize_params()).await
    }
}

/// `initialize` params for a test client.
#[must_use]
pub fn initialize_params() -> Value {
    json!({
        "protocolVersion": "2025-03-26",
        "capabilities": {},
        "clientInfo": { "name": "unrelated-mcp-integration-tests", "version": "0" }
    })
}
