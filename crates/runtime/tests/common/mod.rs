#![allow(dead_code)]

use anyhow::Context as _;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use unrelated_mcp_runtime::McpApp;
use unrelated_mcp_runtime::transport::serve_router;

pub use unrelated_test_support::{McpClient, read_json_rpc};

/// A running in-process server. Cancelled on drop.
pub struct TestServer {
    pub addr: SocketAddr,
    ct: CancellationToken,
    task: Option<JoinHandle<unrelated_mcp_runtime::Result<()>>>,
}

impl TestServer {
    pub async fn start(app: McpApp) -> anyhow::Result<Self> {
        let tools = app.load_tools().await?;
        let router = app.build_router(tools).await?;
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let ct = CancellationToken::new();
        let task = tokio::spawn(serve_router(listener, router, ct.clone()));
        Ok(Self {
            addr,
            ct,
            task: Some(task),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn stop(mut self) -> anyhow::Result<()> {
        self.ct.cancel();
        if let Some(task) = self.task.take() {
            task.await.context("join server")??;
        }
        Ok(())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.ct.cancel();
    }
}
