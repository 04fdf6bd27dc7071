//! User-supplied request middleware.

use crate::error::ComposeError;
use crate::tool::Export;
use axum::{extract::Request, middleware::Next, response::Response};
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

type MiddlewareFn = dyn Fn(Request, Next) -> BoxFuture<'static, Response> + Send + Sync;

/// One request interceptor: it may short-circuit with its own response or call `next`.
#[derive(Clone)]
pub struct Middleware(Arc<MiddlewareFn>);

impl Middleware {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Self(Arc::new(move |req, next| Box::pin(f(req, next))))
    }

    pub async fn run(&self, req: Request, next: Next) -> Response {
        (self.0)(req, next).await
    }
}

impl std::fmt::Debug for Middleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Middleware(..)")
    }
}

/// The project's middleware module, as loaded.
#[derive(Debug, Clone, Default)]
pub struct MiddlewareModule {
    pub default: Option<Export>,
}

impl MiddlewareModule {
    pub fn new(default: Export) -> Self {
        Self {
            default: Some(default),
        }
    }
}

/// Normalize a middleware module's default export into an ordered list.
///
/// List entries that are not middleware are dropped.
pub fn resolve_middleware(module: &MiddlewareModule) -> Result<Vec<Middleware>, ComposeError> {
    let Some(export) = &module.default else {
        return Err(ComposeError::MissingMiddlewareExport);
    };
    match export {
        Export::Middleware(m) => Ok(vec![m.clone()]),
        Export::List(items) => {
            let resolved: Vec<Middleware> = items
                .iter()
                .filter_map(|item| match item {
                    Export::Middleware(m) => Some(m.clone()),
                    _ => None,
                })
                .collect();
            if resolved.len() != items.len() {
                tracing::debug!(
                    dropped = items.len() - resolved.len(),
                    "ignoring non-middleware entries in middleware list"
                );
            }
            Ok(resolved)
        }
        _ => Err(ComposeError::InvalidMiddlewareExport),
    }
}
