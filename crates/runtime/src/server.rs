//! Protocol-engine adapter: exposes a [`ToolTable`] through `rmcp`.

use crate::auth::AuthInfo;
use crate::registry::ToolTable;
use crate::tool::ToolExtra;
use rmcp::{
    ErrorData, RoleServer, ServerHandler,
    model::{
        CallToolRequestParams, CallToolResult, Implementation, ListToolsResult,
        PaginatedRequestParams, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
};
use std::sync::Arc;

pub const DEFAULT_SERVER_NAME: &str = "MCP Server";
pub const DEFAULT_SERVER_VERSION: &str = "0.0.1";

/// Name and version reported during initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerIdentity {
    pub name: String,
    pub version: String,
}

impl Default for ServerIdentity {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVER_NAME.to_string(),
            version: DEFAULT_SERVER_VERSION.to_string(),
        }
    }
}

/// One protocol server over a shared, read-only tool table.
///
/// Cheap to clone; the HTTP transport creates one per request.
#[derive(Clone)]
pub struct ToolServer {
    tools: Arc<ToolTable>,
    identity: ServerIdentity,
}

impl ToolServer {
    pub fn new(tools: Arc<ToolTable>, identity: ServerIdentity) -> Self {
        Self { tools, identity }
    }

    #[must_use]
    pub fn tools(&self) -> &ToolTable {
        &self.tools
    }
}

fn auth_info(context: &RequestContext<RoleServer>) -> Option<AuthInfo> {
    context
        .extensions
        .get::<axum::http::request::Parts>()
        .and_then(|parts| parts.extensions.get::<AuthInfo>())
        .cloned()
}

impl ServerHandler for ToolServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.identity.name.clone(),
                version: self.identity.version.clone(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.tools.list_tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let extra = ToolExtra {
            auth_info: auth_info(&context),
            ct: context.ct.clone(),
            request_id: context.id.clone(),
        };
        tracing::debug!(tool = %request.name, "tools/call");
        self.tools.call(&request.name, request.arguments, extra).await
    }
}
