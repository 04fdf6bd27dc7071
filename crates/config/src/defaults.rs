//! Documented defaults for every configuration domain.

use crate::domain::{
    CorsOrigin, ResolvedCorsConfig, ResolvedHttpConfig, ResolvedPathsConfig, ResolvedStdioConfig,
    StringList,
};

pub const DEFAULT_HTTP_PORT: u16 = 3001;
pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
/// 10 MiB.
pub const DEFAULT_HTTP_BODY_SIZE_LIMIT: u64 = 1024 * 1024 * 10;
pub const DEFAULT_HTTP_ENDPOINT: &str = "/mcp";
pub const DEFAULT_TOOLS_DIR: &str = "src/tools";

pub const DEFAULT_CORS_ORIGIN: &str = "*";
pub const DEFAULT_CORS_METHODS: &[&str] = &["GET", "POST"];
pub const DEFAULT_CORS_ALLOWED_HEADERS: &[&str] = &[
    "Content-Type",
    "Authorization",
    "mcp-session-id",
    "mcp-protocol-version",
];
pub const DEFAULT_CORS_EXPOSED_HEADERS: &[&str] = &["Content-Type", "Authorization", "mcp-session-id"];
pub const DEFAULT_CORS_MAX_AGE: u64 = 86_400;

pub const DEFAULT_OAUTH_PATH_PREFIX: &str = "/oauth2";
pub const DEFAULT_OAUTH_SCOPES: &[&str] = &["openid", "profile", "email"];

fn owned(items: &[&str]) -> StringList {
    StringList::Many(items.iter().map(|s| (*s).to_string()).collect())
}

#[must_use]
pub fn http() -> ResolvedHttpConfig {
    ResolvedHttpConfig {
        port: DEFAULT_HTTP_PORT,
        host: DEFAULT_HTTP_HOST.to_string(),
        body_size_limit: DEFAULT_HTTP_BODY_SIZE_LIMIT,
        endpoint: DEFAULT_HTTP_ENDPOINT.to_string(),
        stateless: true,
        debug: false,
    }
}

#[must_use]
pub fn cors() -> ResolvedCorsConfig {
    ResolvedCorsConfig {
        origin: CorsOrigin::One(DEFAULT_CORS_ORIGIN.to_string()),
        methods: owned(DEFAULT_CORS_METHODS),
        allowed_headers: owned(DEFAULT_CORS_ALLOWED_HEADERS),
        exposed_headers: owned(DEFAULT_CORS_EXPOSED_HEADERS),
        credentials: false,
        max_age: DEFAULT_CORS_MAX_AGE,
    }
}

#[must_use]
pub fn stdio() -> ResolvedStdioConfig {
    ResolvedStdioConfig { debug: false }
}

#[must_use]
pub fn paths() -> ResolvedPathsConfig {
    ResolvedPathsConfig {
        tools: DEFAULT_TOOLS_DIR.to_string(),
    }
}
