//! Transport bootstrap: picks one serving mode and runs it until shutdown.

use crate::auth::{AuthOptions, AuthState, TokenVerifier, UserInfoVerifier};
use crate::compose::{ComposeOptions, check_endpoint, compose};
use crate::error::{Result, TransportError};
use crate::middleware::{MiddlewareModule, resolve_middleware};
use crate::oauth::{oauth_router, resource_metadata_url};
use crate::port::find_available;
use crate::registry::{ToolTable, build_tool_table};
use crate::server::{ServerIdentity, ToolServer};
use crate::tool::ToolCatalog;
use axum::Router;
use rmcp::{
    RoleServer, ServiceExt as _,
    transport::{
        IntoTransport,
        streamable_http_server::{
            StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
        },
    },
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use unrelated_mcp_config::{ConfigError, RuntimeConfig, TransportKind};

/// Stdio lifecycle events are raised to `info` when `stdio.debug` is set.
macro_rules! lifecycle {
    ($debug:expr, $($arg:tt)+) => {
        if $debug {
            tracing::info!($($arg)+)
        } else {
            tracing::debug!($($arg)+)
        }
    };
}

/// Resolves on SIGINT or (on unix) SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received SIGINT"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}

/// Everything a server process needs besides its injected config.
pub struct McpApp {
    config: Arc<RuntimeConfig>,
    catalog: ToolCatalog,
    middleware: Option<MiddlewareModule>,
    verifier: Option<Arc<dyn TokenVerifier>>,
    auth_options: AuthOptions,
    identity: ServerIdentity,
    http: reqwest::Client,
}

impl McpApp {
    /// The catalog is re-rooted under the configured tools directory.
    pub fn new(config: Arc<RuntimeConfig>, catalog: ToolCatalog) -> Self {
        let catalog = catalog.rooted_at(&config.tools_path);
        Self {
            config,
            catalog,
            middleware: None,
            verifier: None,
            auth_options: AuthOptions::default(),
            identity: ServerIdentity::default(),
            http: reqwest::Client::new(),
        }
    }

    #[must_use]
    pub fn with_middleware(mut self, module: MiddlewareModule) -> Self {
        self.middleware = Some(module);
        self
    }

    #[must_use]
    pub fn with_verifier(mut self, verifier: Arc<dyn TokenVerifier>, options: AuthOptions) -> Self {
        self.verifier = Some(verifier);
        self.auth_options = options;
        self
    }

    #[must_use]
    pub fn with_identity(mut self, identity: ServerIdentity) -> Self {
        self.identity = identity;
        self
    }

    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    #[must_use]
    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Load every tool and build the shared table.
    pub async fn load_tools(&self) -> Result<Arc<ToolTable>> {
        let (table, report) = build_tool_table(&self.catalog).await?;
        for w in &report.warnings {
            tracing::debug!(tool = %w.tool, path = %w.path, "tool registered with an empty input shape");
        }
        Ok(table)
    }

    /// Serve until SIGINT/SIGTERM.
    pub async fn run(self, requested: Option<TransportKind>) -> Result<()> {
        let kind = self.config.select_transport(requested)?;
        let ct = CancellationToken::new();
        let signal_ct = ct.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            signal_ct.cancel();
        });

        match kind {
            TransportKind::Stdio => self.serve_stdio(ct).await,
            TransportKind::Http => self.serve_http(ct).await,
        }
    }

    pub async fn serve_stdio(&self, ct: CancellationToken) -> Result<()> {
        if !self.config.is_enabled(TransportKind::Stdio) {
            return Err(ConfigError::TransportDisabled(TransportKind::Stdio.as_str()).into());
        }
        let debug = self.config.stdio.as_ref().is_some_and(|s| s.debug);
        let server = ToolServer::new(self.load_tools().await?, self.identity.clone());
        serve_stream(server, rmcp::transport::stdio(), ct, debug).await
    }

    /// The composed HTTP application. Fails before anything is bound if the middleware export or
    /// the OAuth declaration is malformed.
    pub async fn build_router(&self, tools: Arc<ToolTable>) -> Result<Router> {
        let http = self
            .config
            .http
            .as_ref()
            .ok_or(ConfigError::TransportDisabled(TransportKind::Http.as_str()))?;

        let oauth = self
            .config
            .oauth
            .as_ref()
            .map(|o| o.validate().map(Arc::new))
            .transpose()?;
        check_endpoint(&http.endpoint, oauth.as_deref())?;

        let middleware = match &self.middleware {
            Some(module) => resolve_middleware(module)?,
            None => Vec::new(),
        };

        let mut auth_options = self.auth_options.clone();
        let verifier = match (&self.verifier, &oauth) {
            (Some(v), _) => Some(v.clone()),
            (None, Some(settings)) => settings.user_info_url.as_ref().map(|url| {
                Arc::new(UserInfoVerifier::new(self.http.clone(), url.clone()))
                    as Arc<dyn TokenVerifier>
            }),
            (None, None) => None,
        };
        if let Some(settings) = &oauth
            && auth_options.resource_metadata_url.is_none()
        {
            auth_options.resource_metadata_url = Some(resource_metadata_url(settings));
        }
        let auth = verifier.map(|v| Arc::new(AuthState::new(v, auth_options)));

        let server = ToolServer::new(tools, self.identity.clone());
        let service = StreamableHttpService::new(
            move || Ok(server.clone()),
            Arc::new(LocalSessionManager::default()),
            StreamableHttpServerConfig {
                stateful_mode: false,
                ..Default::default()
            },
        );
        let base = Router::new().route_service(&http.endpoint, service);

        let router = compose(
            base,
            ComposeOptions {
                cors: self.config.cors.clone(),
                middleware,
                auth,
                oauth: oauth.map(|settings| oauth_router(settings, self.http.clone())),
                body_size_limit: usize::try_from(http.body_size_limit).ok(),
                debug: http.debug,
            },
        )?;
        Ok(router)
    }

    pub async fn serve_http(&self, ct: CancellationToken) -> Result<()> {
        let http = self
            .config
            .http
            .clone()
            .ok_or(ConfigError::TransportDisabled(TransportKind::Http.as_str()))?;

        let tools = self.load_tools().await?;
        let router = self.build_router(tools).await?;

        let port = find_available(http.port, &http.host).await?;
        let listener = TcpListener::bind((http.host.as_str(), port))
            .await
            .map_err(TransportError::Http)?;
        let addr = listener.local_addr().map_err(TransportError::Http)?;
        tracing::info!(
            url = %format!("http://{addr}{}", http.endpoint),
            "MCP server listening"
        );
        serve_router(listener, router, ct).await
    }
}

/// Connect `server` to a byte-stream transport and run until the peer closes or `ct` fires.
///
/// Only a failed connect is an error. With `debug` the startup, connect-failure and shutdown
/// diagnostics are logged at `info`/`error` instead of `debug`.
pub async fn serve_stream<T, E, A>(
    server: ToolServer,
    transport: T,
    ct: CancellationToken,
    debug: bool,
) -> Result<()>
where
    T: IntoTransport<RoleServer, E, A> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let running = match server.serve_with_ct(transport, ct).await {
        Ok(running) => running,
        Err(e) => {
            if debug {
                tracing::error!(error = %e, "error starting stdio transport");
            }
            return Err(TransportError::Connect {
                transport: TransportKind::Stdio.as_str(),
                message: e.to_string(),
            }
            .into());
        }
    };
    lifecycle!(debug, "MCP server running with stdio transport");

    match running.waiting().await {
        Ok(reason) => lifecycle!(debug, ?reason, "shutting down stdio transport"),
        Err(e) => lifecycle!(debug, error = %e, "stdio service task failed"),
    }
    Ok(())
}

/// Serve an already-bound listener with graceful shutdown on `ct`.
pub async fn serve_router(listener: TcpListener, router: Router, ct: CancellationToken) -> Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(TransportError::Http)?;
    tracing::info!("HTTP server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ComposeError, RuntimeError};
    use crate::tool::{Export, ToolModule, handler_fn};
    use rmcp::model::{CallToolResult, Content};
    use serde_json::{Value, json};
    use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader};
    use tower::ServiceExt as _;
    use unrelated_mcp_config::{OAuthConfig, OAuthEndpoints, defaults};

    fn greet_catalog() -> ToolCatalog {
        let greet = ToolModule::new(handler_fn(|args, _| async move {
            let name = args.get("name").and_then(Value::as_str).unwrap_or("world");
            Ok(CallToolResult::success(vec![Content::text(format!(
                "Hello, {name}!"
            ))]))
        }));
        ToolCatalog::new("src/tools").with("greet.rs", Arc::new(greet))
    }

    fn config(http: bool, stdio: bool) -> Arc<RuntimeConfig> {
        Arc::new(RuntimeConfig {
            http: http.then(defaults::http),
            cors: http.then(defaults::cors),
            stdio: stdio.then(defaults::stdio),
            tools_path: "src/tools".into(),
            oauth: None,
        })
    }

    async fn read_response(
        lines: &mut tokio::io::Lines<BufReader<tokio::io::ReadHalf<tokio::io::DuplexStream>>>,
        id: u64,
    ) -> Value {
        loop {
            let line = lines
                .next_line()
                .await
                .expect("read line")
                .expect("stream open");
            let msg: Value = serde_json::from_str(&line).expect("json line");
            if msg.get("id") == Some(&json!(id)) {
                return msg;
            }
        }
    }

    #[tokio::test]
    async fn stdio_round_trip_over_a_duplex() {
        let app = McpApp::new(config(false, true), greet_catalog());
        let server = ToolServer::new(app.load_tools().await.expect("tools"), ServerIdentity::default());

        let (client, server_io) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server_io);
        let ct = CancellationToken::new();
        let task = tokio::spawn(serve_stream(
            server,
            (server_read, server_write),
            ct.clone(),
            false,
        ));

        let (client_read, mut client_write) = tokio::io::split(client);
        let mut lines = BufReader::new(client_read).lines();
        let send = |msg: Value| format!("{msg}\n");

        client_write
            .write_all(
                send(json!({
                    "jsonrpc": "2.0", "id": 1, "method": "initialize",
                    "params": {
                        "protocolVersion": "2025-03-26",
                        "capabilities": {},
                        "clientInfo": { "name": "duplex-test", "version": "0" }
                    }
                }))
                .as_bytes(),
            )
            .await
            .expect("write");
        let init = read_response(&mut lines, 1).await;
        assert_eq!(init["result"]["serverInfo"]["name"], "MCP Server");

        client_write
            .write_all(
                send(json!({ "jsonrpc": "2.0", "method": "notifications/initialized" })).as_bytes(),
            )
            .await
            .expect("write");
        client_write
            .write_all(send(json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" })).as_bytes())
            .await
            .expect("write");
        let list = read_response(&mut lines, 2).await;
        assert_eq!(list["result"]["tools"][0]["name"], "greet");

        client_write
            .write_all(
                send(json!({
                    "jsonrpc": "2.0", "id": 3, "method": "tools/call",
                    "params": { "name": "greet", "arguments": { "name": "Ada" } }
                }))
                .as_bytes(),
            )
            .await
            .expect("write");
        let call = read_response(&mut lines, 3).await;
        assert_eq!(call["result"]["content"][0]["text"], "Hello, Ada!");

        ct.cancel();
        task.await.expect("join").expect("clean shutdown");
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().expect("lock")).into_owned()
        }
    }

    /// Info-level events on this thread, for the lifetime of the guard.
    fn capture_info() -> (Captured, tracing::subscriber::DefaultGuard) {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        (captured, tracing::subscriber::set_default(subscriber))
    }

    /// Initialize over a duplex, then hang up.
    async fn stdio_session(debug: bool) -> Result<()> {
        let app = McpApp::new(config(false, true), greet_catalog());
        let server = ToolServer::new(app.load_tools().await?, ServerIdentity::default());
        let (client, server_io) = tokio::io::duplex(64 * 1024);
        let serve = serve_stream(server, tokio::io::split(server_io), CancellationToken::new(), debug);

        let drive = async move {
            let (client_read, mut client_write) = tokio::io::split(client);
            let mut lines = BufReader::new(client_read).lines();
            let init = json!({
                "jsonrpc": "2.0", "id": 1, "method": "initialize",
                "params": {
                    "protocolVersion": "2025-03-26",
                    "capabilities": {},
                    "clientInfo": { "name": "duplex-test", "version": "0" }
                }
            });
            client_write
                .write_all(format!("{init}\n").as_bytes())
                .await
                .expect("write");
            read_response(&mut lines, 1).await;
            let initialized = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" });
            client_write
                .write_all(format!("{initialized}\n").as_bytes())
                .await
                .expect("write");
        };

        let (result, ()) = tokio::join!(serve, drive);
        result
    }

    #[tokio::test]
    async fn stdio_debug_raises_lifecycle_diagnostics() {
        let (captured, _guard) = capture_info();
        stdio_session(true).await.expect("clean exit");
        let text = captured.text();
        assert!(text.contains("MCP server running with stdio transport"), "{text}");
        assert!(text.contains("shutting down stdio transport"), "{text}");
    }

    #[tokio::test]
    async fn stdio_lifecycle_stays_at_debug_level_by_default() {
        let (captured, _guard) = capture_info();
        stdio_session(false).await.expect("clean exit");
        let text = captured.text();
        assert!(!text.contains("MCP server running with stdio transport"), "{text}");
        assert!(!text.contains("shutting down stdio transport"), "{text}");
    }

    #[tokio::test]
    async fn stdio_connect_failure_is_reported_when_debugging() {
        let (captured, _guard) = capture_info();
        let (client, server_io) = tokio::io::duplex(1024);
        drop(client);
        let server = ToolServer::new(Arc::new(ToolTable::default()), ServerIdentity::default());
        let err = serve_stream(server, tokio::io::split(server_io), CancellationToken::new(), true)
            .await
            .expect_err("peer hung up before initialize");
        assert!(matches!(
            err,
            RuntimeError::Transport(TransportError::Connect { transport: "stdio", .. })
        ));
        assert!(captured.text().contains("error starting stdio transport"));
    }

    #[tokio::test]
    async fn disabled_transports_are_refused() {
        let app = McpApp::new(config(true, false), greet_catalog());
        let err = app
            .serve_stdio(CancellationToken::new())
            .await
            .expect_err("stdio disabled");
        assert!(matches!(
            err,
            RuntimeError::Config(ConfigError::TransportDisabled("stdio"))
        ));

        let app = McpApp::new(config(false, true), greet_catalog());
        let err = app
            .build_router(Arc::new(ToolTable::default()))
            .await
            .expect_err("http disabled");
        assert!(matches!(
            err,
            RuntimeError::Config(ConfigError::TransportDisabled("http"))
        ));
    }

    #[tokio::test]
    async fn malformed_middleware_export_aborts_startup() {
        let app = McpApp::new(config(true, false), greet_catalog())
            .with_middleware(MiddlewareModule::new(Export::Value(json!({ "not": "a fn" }))));
        let err = app
            .build_router(Arc::new(ToolTable::default()))
            .await
            .expect_err("invalid middleware");
        assert!(matches!(
            err,
            RuntimeError::Compose(ComposeError::InvalidMiddlewareExport)
        ));
    }

    #[tokio::test]
    async fn incomplete_oauth_aborts_startup() {
        let mut cfg = (*config(true, false)).clone();
        cfg.oauth = Some(OAuthConfig {
            issuer_url: Some("https://idp.example".into()),
            ..OAuthConfig::default()
        });
        let app = McpApp::new(Arc::new(cfg), greet_catalog());
        let err = app
            .build_router(Arc::new(ToolTable::default()))
            .await
            .expect_err("incomplete oauth");
        assert!(matches!(
            err,
            RuntimeError::Config(ConfigError::IncompleteOAuth(_))
        ));
    }

    fn complete_oauth(path_prefix: &str) -> OAuthConfig {
        OAuthConfig {
            endpoints: Some(OAuthEndpoints {
                authorization_url: Some("https://idp.example/authorize".into()),
                token_url: Some("https://idp.example/token".into()),
                register_url: Some("https://idp.example/register".into()),
                ..OAuthEndpoints::default()
            }),
            issuer_url: Some("https://idp.example".into()),
            base_url: Some("http://127.0.0.1:3001".into()),
            path_prefix: Some(path_prefix.into()),
            ..OAuthConfig::default()
        }
    }

    #[tokio::test]
    async fn oauth_prefix_without_leading_slash_still_mounts() {
        let mut cfg = (*config(true, false)).clone();
        cfg.oauth = Some(complete_oauth("oauth2"));
        let app = McpApp::new(Arc::new(cfg), greet_catalog());
        let router = app
            .build_router(Arc::new(ToolTable::default()))
            .await
            .expect("router builds");

        let resp = router
            .oneshot(
                axum::extract::Request::get("/oauth2/authorize?client_id=c")
                    .body(axum::body::Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(resp.status(), axum::http::StatusCode::TEMPORARY_REDIRECT);
    }

    #[tokio::test]
    async fn endpoint_colliding_with_builtin_routes_aborts_startup() {
        let mut cfg = (*config(true, false)).clone();
        if let Some(http) = cfg.http.as_mut() {
            http.endpoint = "/health".into();
        }
        let app = McpApp::new(Arc::new(cfg), greet_catalog());
        let err = app
            .build_router(Arc::new(ToolTable::default()))
            .await
            .expect_err("reserved endpoint");
        assert!(matches!(
            err,
            RuntimeError::Compose(ComposeError::ReservedPath { owner: "health", .. })
        ));

        let mut cfg = (*config(true, false)).clone();
        if let Some(http) = cfg.http.as_mut() {
            http.endpoint = "/oauth2/token".into();
        }
        cfg.oauth = Some(complete_oauth("/oauth2"));
        let app = McpApp::new(Arc::new(cfg), greet_catalog());
        let err = app
            .build_router(Arc::new(ToolTable::default()))
            .await
            .expect_err("reserved endpoint");
        assert!(matches!(
            err,
            RuntimeError::Compose(ComposeError::ReservedPath { owner: "OAuth", .. })
        ));
    }

    #[test]
    fn catalog_follows_the_configured_tools_path() {
        let mut cfg = (*config(true, false)).clone();
        cfg.tools_path = "lib/tools".into();
        let app = McpApp::new(Arc::new(cfg), greet_catalog());
        let paths: Vec<&str> = app.catalog().entries().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["lib/tools/greet.rs"]);
    }
}
