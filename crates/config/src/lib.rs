//! Config resolution and build-time variable injection for Unrelated MCP servers.
//!
//! Pipeline: config file -> [`shape::check`] -> [`UserConfig`] -> [`UserConfig::resolve`] ->
//! [`injection::project`] -> `injected.json` -> [`RuntimeConfig`].

pub mod defaults;
pub mod domain;
pub mod error;
pub mod file;
pub mod injection;
pub mod runtime;
pub mod shape;

pub use domain::{
    ConfigurationDomain, CorsOrigin, DomainKind, OAuthConfig, OAuthEndpoints, OAuthSettings,
    ResolvedConfig, ResolvedCorsConfig, ResolvedHttpConfig, ResolvedPathsConfig,
    ResolvedStdioConfig, StringList, Toggle, UserConfig,
};
pub use error::{ConfigError, Result};
pub use file::{find_config_file, load_config};
pub use injection::{BuildMode, InjectedVariables, project};
pub use runtime::{RuntimeConfig, TransportKind};
