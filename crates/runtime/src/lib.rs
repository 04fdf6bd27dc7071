//! Runtime for Unrelated MCP tool servers.
//!
//! A server binary hands [`McpApp`] its injected [`RuntimeConfig`](unrelated_mcp_config::RuntimeConfig)
//! and a [`ToolCatalog`]; the app loads and registers every tool, then serves them over stdio or
//! stateless streamable HTTP.

pub mod auth;
pub mod compose;
pub mod cors;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod oauth;
pub mod port;
pub mod registry;
pub mod server;
pub mod tool;
pub mod transport;
pub mod validator;

pub use auth::{ApiKeyVerifier, AuthInfo, AuthOptions, JwtVerifier, TokenVerifier, UserInfoVerifier};
pub use error::{ComposeError, PortError, RegistryError, Result, RuntimeError, TransportError};
pub use middleware::{Middleware, MiddlewareModule};
pub use registry::{RegistrationReport, ToolTable};
pub use server::{ServerIdentity, ToolServer};
pub use tool::{
    Export, ToolCatalog, ToolExtra, ToolHandler, ToolMetadata, ToolModule, ToolSource, handler_fn,
    source_fn,
};
pub use transport::McpApp;

/// Everything a tool author usually needs.
pub mod prelude {
    pub use crate::tool::{
        Export, ToolCatalog, ToolExtra, ToolMetadata, ToolModule, handler_fn, source_fn,
    };
    pub use crate::validator::{
        ValidatorExt as _, array, boolean, enumeration, integer, number, object, string,
    };
    pub use rmcp::model::{CallToolResult, Content, JsonObject, ToolAnnotations};
}
