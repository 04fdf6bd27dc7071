use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use std::time::Instant;
use unrelated_mcp_runtime::{Export, Middleware, MiddlewareModule};

fn access_log() -> Middleware {
    Middleware::new(|req: Request, next: Next| async move {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let started = Instant::now();
        let resp = next.run(req).await;
        tracing::info!(
            %method,
            %path,
            status = resp.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis(),
            "request"
        );
        resp
    })
}

fn server_header() -> Middleware {
    Middleware::new(|req: Request, next: Next| async move {
        let mut resp = next.run(req).await;
        resp.headers_mut().insert(
            "x-mcp-server",
            HeaderValue::from_static(env!("CARGO_PKG_NAME")),
        );
        resp
    })
}

pub fn module() -> MiddlewareModule {
    MiddlewareModule::new(Export::List(vec![
        Export::Middleware(access_log()),
        Export::Middleware(server_header()),
    ]))
}
