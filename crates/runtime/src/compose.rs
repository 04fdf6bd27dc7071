//! Assembles the HTTP request chain around the protocol endpoint.
//!
//! Outermost to innermost: trace (debug only), CORS, authentication, user middleware in declared
//! order, body limit, protocol handler. `/health` and the OAuth routes sit inside CORS but outside
//! authentication.

use crate::auth::{AuthState, authenticate};
use crate::cors::cors_layer;
use crate::error::ComposeError;
use crate::middleware::Middleware;
use axum::{
    Json, Router,
    extract::Request,
    middleware::{Next, from_fn, from_fn_with_state},
    routing::get,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use crate::oauth::oauth_paths;
use unrelated_mcp_config::{OAuthSettings, ResolvedCorsConfig};

pub const HEALTH_PATH: &str = "/health";

#[derive(Default)]
pub struct ComposeOptions {
    pub cors: Option<ResolvedCorsConfig>,
    /// Declared order; the first entry runs first.
    pub middleware: Vec<Middleware>,
    pub auth: Option<Arc<AuthState>>,
    pub oauth: Option<Router>,
    pub body_size_limit: Option<usize>,
    pub debug: bool,
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Reject a protocol endpoint that cannot be mounted next to the built-in routes.
///
/// # Errors
///
/// Returns [`ComposeError::InvalidEndpoint`] for a path without a leading `/` and
/// [`ComposeError::ReservedPath`] when it collides with `/health` or an OAuth route.
pub fn check_endpoint(endpoint: &str, oauth: Option<&OAuthSettings>) -> Result<(), ComposeError> {
    if !endpoint.starts_with('/') {
        return Err(ComposeError::InvalidEndpoint(endpoint.to_string()));
    }
    let reserved = |owner| ComposeError::ReservedPath {
        path: endpoint.to_string(),
        owner,
    };
    if endpoint == HEALTH_PATH {
        return Err(reserved("health"));
    }
    if let Some(settings) = oauth
        && oauth_paths(settings).iter().any(|p| p == endpoint)
    {
        return Err(reserved("OAuth"));
    }
    Ok(())
}

/// Wrap `base` in the configured stages. Absent stages leave the base handler untouched.
pub fn compose(base: Router, opts: ComposeOptions) -> Result<Router, ComposeError> {
    let mut app = base;

    if let Some(limit) = opts.body_size_limit {
        app = app.layer(RequestBodyLimitLayer::new(limit));
    }

    // Each `layer` call wraps everything added so far, so apply in reverse.
    for mw in opts.middleware.into_iter().rev() {
        app = app.layer(from_fn(move |req: Request, next: Next| {
            let mw = mw.clone();
            async move { mw.run(req, next).await }
        }));
    }

    if let Some(auth) = opts.auth {
        app = app.layer(from_fn_with_state(auth, authenticate));
    }

    app = app.route(HEALTH_PATH, get(health));
    if let Some(oauth) = opts.oauth {
        app = app.merge(oauth);
    }

    if let Some(cors) = &opts.cors {
        app = app.layer(cors_layer(cors)?);
    }

    if opts.debug {
        app = app.layer(TraceLayer::new_for_http());
    }

    Ok(app)
}
