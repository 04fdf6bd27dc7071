//! OAuth proxy routes: discovery documents plus pass-through to the upstream provider.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, Uri, header},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;
use unrelated_mcp_config::OAuthSettings;

pub const AUTHORIZATION_SERVER_METADATA_PATH: &str = "/.well-known/oauth-authorization-server";
pub const PROTECTED_RESOURCE_METADATA_PATH: &str = "/.well-known/oauth-protected-resource";

#[derive(Clone)]
struct OAuthProxy {
    settings: Arc<OAuthSettings>,
    http: reqwest::Client,
}

fn join(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

fn local_path(settings: &OAuthSettings, name: &str) -> String {
    format!("{}/{name}", settings.path_prefix.trim_end_matches('/'))
}

fn local_endpoint(settings: &OAuthSettings, name: &str) -> String {
    join(&settings.base_url, &local_path(settings, name))
}

/// Every path [`oauth_router`] mounts for `settings`.
#[must_use]
pub fn oauth_paths(settings: &OAuthSettings) -> Vec<String> {
    let mut paths = vec![
        AUTHORIZATION_SERVER_METADATA_PATH.to_string(),
        PROTECTED_RESOURCE_METADATA_PATH.to_string(),
        local_path(settings, "authorize"),
        local_path(settings, "token"),
        local_path(settings, "register"),
    ];
    if settings.revocation_url.is_some() {
        paths.push(local_path(settings, "revoke"));
    }
    paths
}

/// Absolute URL of the protected-resource document, as advertised in auth challenges.
#[must_use]
pub fn resource_metadata_url(settings: &OAuthSettings) -> String {
    join(&settings.base_url, PROTECTED_RESOURCE_METADATA_PATH)
}

fn authorization_server_metadata(settings: &OAuthSettings) -> Value {
    let mut doc = json!({
        "issuer": settings.issuer_url,
        "authorization_endpoint": local_endpoint(settings, "authorize"),
        "token_endpoint": local_endpoint(settings, "token"),
        "registration_endpoint": local_endpoint(settings, "register"),
        "scopes_supported": settings.default_scopes,
        "response_types_supported": ["code"],
        "grant_types_supported": ["authorization_code", "refresh_token"],
        "code_challenge_methods_supported": ["S256"],
        "token_endpoint_auth_methods_supported": ["client_secret_post", "none"],
    });
    if let Some(obj) = doc.as_object_mut() {
        if settings.revocation_url.is_some() {
            obj.insert(
                "revocation_endpoint".into(),
                Value::String(local_endpoint(settings, "revoke")),
            );
        }
        if let Some(url) = &settings.user_info_url {
            obj.insert("userinfo_endpoint".into(), Value::String(url.clone()));
        }
        if let Some(url) = &settings.service_documentation_url {
            obj.insert("service_documentation".into(), Value::String(url.clone()));
        }
    }
    doc
}

fn protected_resource_metadata(settings: &OAuthSettings) -> Value {
    let mut doc = json!({
        "resource": settings.base_url,
        "authorization_servers": [settings.base_url],
        "scopes_supported": settings.default_scopes,
        "bearer_methods_supported": ["header"],
    });
    if let (Some(obj), Some(url)) = (doc.as_object_mut(), &settings.service_documentation_url) {
        obj.insert("resource_documentation".into(), Value::String(url.clone()));
    }
    doc
}

async fn authorization_server(State(proxy): State<OAuthProxy>) -> Json<Value> {
    Json(authorization_server_metadata(&proxy.settings))
}

async fn protected_resource(State(proxy): State<OAuthProxy>) -> Json<Value> {
    Json(protected_resource_metadata(&proxy.settings))
}

async fn authorize(State(proxy): State<OAuthProxy>, uri: Uri) -> Redirect {
    let upstream = &proxy.settings.authorization_url;
    let target = match uri.query() {
        Some(q) if !q.is_empty() => {
            let sep = if upstream.contains('?') { '&' } else { '?' };
            format!("{upstream}{sep}{q}")
        }
        _ => upstream.clone(),
    };
    Redirect::temporary(&target)
}

async fn forward(proxy: &OAuthProxy, upstream: &str, headers: &HeaderMap, body: Bytes) -> Response {
    let mut req = proxy.http.post(upstream).body(body);
    for name in [header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT] {
        if let Some(v) = headers.get(&name) {
            req = req.header(name, v.clone());
        }
    }

    let resp = match req.send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(upstream = %upstream, error = %e, "OAuth upstream request failed");
            return (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "server_error", "error_description": "Upstream unavailable" })),
            )
                .into_response();
        }
    };

    let status = resp.status();
    let content_type = resp.headers().get(header::CONTENT_TYPE).cloned();
    let bytes = match resp.bytes().await {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(upstream = %upstream, error = %e, "failed to read OAuth upstream response");
            return StatusCode::BAD_GATEWAY.into_response();
        }
    };

    let mut out = (status, bytes).into_response();
    out.headers_mut().insert(
        header::CONTENT_TYPE,
        content_type.unwrap_or_else(|| HeaderValue::from_static("application/json")),
    );
    out.headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    out
}

async fn token(State(proxy): State<OAuthProxy>, headers: HeaderMap, body: Bytes) -> Response {
    let upstream = proxy.settings.token_url.clone();
    forward(&proxy, &upstream, &headers, body).await
}

async fn register(State(proxy): State<OAuthProxy>, headers: HeaderMap, body: Bytes) -> Response {
    let upstream = proxy.settings.register_url.clone();
    forward(&proxy, &upstream, &headers, body).await
}

async fn revoke(State(proxy): State<OAuthProxy>, headers: HeaderMap, body: Bytes) -> Response {
    let Some(upstream) = proxy.settings.revocation_url.clone() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    forward(&proxy, &upstream, &headers, body).await
}

/// Routes served in front of authentication when OAuth is configured.
pub fn oauth_router(settings: Arc<OAuthSettings>, http: reqwest::Client) -> Router {
    let mut router = Router::new()
        .route(AUTHORIZATION_SERVER_METADATA_PATH, get(authorization_server))
        .route(PROTECTED_RESOURCE_METADATA_PATH, get(protected_resource))
        .route(&local_path(&settings, "authorize"), get(authorize))
        .route(&local_path(&settings, "token"), post(token))
        .route(&local_path(&settings, "register"), post(register));
    if settings.revocation_url.is_some() {
        router = router.route(&local_path(&settings, "revoke"), post(revoke));
    }
    router.with_state(OAuthProxy { settings, http })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, extract::Request};
    use tower::ServiceExt as _;

    fn settings(upstream: &str) -> OAuthSettings {
        OAuthSettings {
            authorization_url: format!("{upstream}/authorize"),
            token_url: format!("{upstream}/token"),
            register_url: format!("{upstream}/register"),
            revocation_url: None,
            user_info_url: None,
            issuer_url: upstream.to_string(),
            base_url: "http://127.0.0.1:3001/".to_string(),
            service_documentation_url: None,
            path_prefix: "/oauth2".to_string(),
            default_scopes: vec!["openid".into(), "profile".into(), "email".into()],
        }
    }

    async fn json_body(resp: Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn metadata_points_at_local_endpoints() {
        let router = oauth_router(
            Arc::new(settings("https://idp.example")),
            reqwest::Client::new(),
        );
        let resp = router
            .clone()
            .oneshot(
                Request::get(AUTHORIZATION_SERVER_METADATA_PATH)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let doc = json_body(resp).await;
        assert_eq!(doc["issuer"], "https://idp.example");
        assert_eq!(
            doc["authorization_endpoint"],
            "http://127.0.0.1:3001/oauth2/authorize"
        );
        assert_eq!(doc["token_endpoint"], "http://127.0.0.1:3001/oauth2/token");
        assert!(doc.get("revocation_endpoint").is_none());

        let resp = router
            .oneshot(
                Request::get(PROTECTED_RESOURCE_METADATA_PATH)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let doc = json_body(resp).await;
        assert_eq!(doc["resource"], "http://127.0.0.1:3001/");
        assert_eq!(doc["scopes_supported"], json!(["openid", "profile", "email"]));
    }

    #[test]
    fn mounted_paths_follow_the_prefix() {
        let mut s = settings("https://idp.example");
        assert_eq!(
            oauth_paths(&s),
            vec![
                AUTHORIZATION_SERVER_METADATA_PATH,
                PROTECTED_RESOURCE_METADATA_PATH,
                "/oauth2/authorize",
                "/oauth2/token",
                "/oauth2/register",
            ]
        );
        s.path_prefix = "/auth".into();
        s.revocation_url = Some("https://idp.example/revoke".into());
        assert_eq!(oauth_paths(&s).last().map(String::as_str), Some("/auth/revoke"));
    }

    #[tokio::test]
    async fn authorize_redirects_with_the_query_preserved() {
        let router = oauth_router(
            Arc::new(settings("https://idp.example")),
            reqwest::Client::new(),
        );
        let resp = router
            .oneshot(
                Request::get("/oauth2/authorize?client_id=abc&state=xyz")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            resp.headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok()),
            Some("https://idp.example/authorize?client_id=abc&state=xyz")
        );
    }

    #[tokio::test]
    async fn token_requests_are_proxied_upstream() -> anyhow::Result<()> {
        let upstream = Router::new().route(
            "/token",
            post(|body: String| async move {
                Json(json!({ "access_token": "tok", "echo": body }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, upstream).await;
        });

        let router = oauth_router(
            Arc::new(settings(&format!("http://{addr}"))),
            reqwest::Client::new(),
        );
        let resp = router
            .clone()
            .oneshot(
                Request::post("/oauth2/token")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from("grant_type=authorization_code&code=c1"))?,
            )
            .await?;
        assert_eq!(resp.status(), StatusCode::OK);
        let doc = json_body(resp).await;
        assert_eq!(doc["access_token"], "tok");
        assert_eq!(doc["echo"], "grant_type=authorization_code&code=c1");

        // Revocation is not routed when no upstream is configured.
        let resp = router
            .oneshot(Request::post("/oauth2/revoke").body(Body::empty())?)
            .await?;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        Ok(())
    }
}
