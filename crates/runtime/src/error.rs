//! Error types for the runtime.

use thiserror::Error;
use unrelated_mcp_config::ConfigError;

/// Main error type for the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Injected config could not be decoded, or is inconsistent.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Tool loading or registration failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The HTTP request chain could not be assembled.
    #[error(transparent)]
    Compose(#[from] ComposeError),

    /// No port could be allocated.
    #[error(transparent)]
    Port(#[from] PortError),

    /// Serving failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Error, Debug)]
pub enum RegistryError {
    /// A tool source failed to load. Reported for the first failing source in source order.
    #[error("Failed to load tool `{path}`: {source}")]
    Load {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    /// Two tools resolved to the same registration name.
    #[error("Duplicate tool name `{name}` (registered by `{first}` and `{second}`)")]
    DuplicateName {
        name: String,
        first: String,
        second: String,
    },
}

#[derive(Error, Debug)]
pub enum ComposeError {
    /// The middleware module's export is neither one operation nor a list.
    #[error("Middleware module does not export a valid middleware or list of middlewares")]
    InvalidMiddlewareExport,

    /// The middleware module has no default export.
    #[error("Middleware module does not export a default middleware")]
    MissingMiddlewareExport,

    /// A configured CORS value cannot be used in a header.
    #[error("Invalid CORS {field}: {value}")]
    InvalidCors { field: &'static str, value: String },

    /// The protocol endpoint is not a routable path.
    #[error("Invalid HTTP endpoint `{0}`: expected a path starting with `/`")]
    InvalidEndpoint(String),

    /// The protocol endpoint collides with a built-in route.
    #[error("HTTP endpoint `{path}` conflicts with the {owner} route")]
    ReservedPath { path: String, owner: &'static str },
}

#[derive(Error, Debug)]
pub enum PortError {
    /// Every scanned port was in use.
    #[error("No available port on {host} in {start}..{end} ({attempts} attempts)")]
    Exhausted {
        host: String,
        start: u16,
        end: u32,
        attempts: u16,
    },

    /// A bind error other than "address in use"; never retried.
    #[error("Failed to bind port {port} on {host}: {source}")]
    Bind {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum TransportError {
    /// The protocol server could not be connected to the transport.
    #[error("Failed to connect {transport} transport: {message}")]
    Connect {
        transport: &'static str,
        message: String,
    },

    /// Listening or serving HTTP failed.
    #[error("HTTP server error: {0}")]
    Http(#[source] std::io::Error),
}

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;
