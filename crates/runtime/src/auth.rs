//! Bearer authentication for the HTTP transport.

use async_trait::async_trait;
use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse as _, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Identity attached to an authenticated request.
///
/// Inserted into the request extensions, where downstream middleware and tool handlers can read
/// it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthInfo {
    pub token: String,
    pub client_id: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AuthInfo {
    fn is_expired(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|exp| exp < now)
    }
}

/// Turns request credentials into an identity.
///
/// `Ok(None)` means "no valid credentials". An `Err` means the credentials could not be checked
/// (bad signature, unreachable provider); it is logged and always answered with 401.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(
        &self,
        bearer: Option<&str>,
        headers: &HeaderMap,
    ) -> anyhow::Result<Option<AuthInfo>>;
}

#[derive(Debug, Clone)]
pub struct AuthOptions {
    /// When false, requests the verifier answers with `Ok(None)` pass through unauthenticated.
    /// A verifier `Err` is still a 401 either way.
    pub required: bool,
    pub required_scopes: Vec<String>,
    /// Advertised in the `WWW-Authenticate` challenge.
    pub resource_metadata_url: Option<String>,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            required: true,
            required_scopes: Vec::new(),
            resource_metadata_url: None,
        }
    }
}

#[derive(Clone)]
pub struct AuthState {
    verifier: Arc<dyn TokenVerifier>,
    options: AuthOptions,
}

impl AuthState {
    pub fn new(verifier: Arc<dyn TokenVerifier>, options: AuthOptions) -> Self {
        Self { verifier, options }
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let authz = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;
    let (scheme, token) = authz.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn challenge(options: &AuthOptions, error: &str, description: &str) -> String {
    let mut value = format!(r#"Bearer error="{error}", error_description="{description}""#);
    if error == "insufficient_scope" && !options.required_scopes.is_empty() {
        value.push_str(&format!(r#", scope="{}""#, options.required_scopes.join(" ")));
    }
    if let Some(url) = &options.resource_metadata_url {
        value.push_str(&format!(r#", resource_metadata="{url}""#));
    }
    value
}

fn reject(options: &AuthOptions, status: StatusCode, error: &str, description: &str) -> Response {
    let mut resp = (
        status,
        Json(json!({ "error": error, "error_description": description })),
    )
        .into_response();
    if let Ok(v) = HeaderValue::from_str(&challenge(options, error, description)) {
        resp.headers_mut().insert(header::WWW_AUTHENTICATE, v);
    }
    resp
}

fn unauthorized(options: &AuthOptions, description: &str) -> Response {
    reject(options, StatusCode::UNAUTHORIZED, "invalid_token", description)
}

/// Authentication stage of the request chain.
pub async fn authenticate(
    State(auth): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let bearer = extract_bearer(req.headers());
    let verified = match auth.verifier.verify(bearer.as_deref(), req.headers()).await {
        Ok(info) => info,
        Err(e) => {
            tracing::warn!(error = %e, "token verification failed");
            return unauthorized(&auth.options, "Invalid token");
        }
    };

    let Some(info) = verified else {
        if auth.options.required {
            let description = if bearer.is_some() {
                "Invalid token"
            } else {
                "Missing Authorization header"
            };
            return unauthorized(&auth.options, description);
        }
        return next.run(req).await;
    };

    if info.is_expired(now_secs()) {
        return unauthorized(&auth.options, "Token has expired");
    }

    if let Some(missing) = auth
        .options
        .required_scopes
        .iter()
        .find(|s| !info.scopes.contains(s))
    {
        tracing::debug!(client_id = %info.client_id, scope = %missing, "missing required scope");
        return reject(
            &auth.options,
            StatusCode::FORBIDDEN,
            "insufficient_scope",
            "Insufficient scope",
        );
    }

    req.extensions_mut().insert(info);
    next.run(req).await
}

// ------------------------------------------------------------------------------------------------
// Built-in verifiers
// ------------------------------------------------------------------------------------------------

/// Static API keys, accepted from `x-api-key` or as a bearer token.
#[derive(Debug, Clone, Default)]
pub struct ApiKeyVerifier {
    /// key -> client id
    keys: HashMap<String, String>,
    scopes: Vec<String>,
}

impl ApiKeyVerifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>, client_id: impl Into<String>) -> Self {
        self.keys.insert(key.into(), client_id.into());
        self
    }

    #[must_use]
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }
}

#[async_trait]
impl TokenVerifier for ApiKeyVerifier {
    async fn verify(
        &self,
        bearer: Option<&str>,
        headers: &HeaderMap,
    ) -> anyhow::Result<Option<AuthInfo>> {
        let header_key = headers
            .get("x-api-key")
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        let Some(key) = header_key.or(bearer) else {
            return Ok(None);
        };
        Ok(self.keys.get(key).map(|client_id| AuthInfo {
            token: key.to_string(),
            client_id: client_id.clone(),
            scopes: self.scopes.clone(),
            ..AuthInfo::default()
        }))
    }
}

#[derive(Debug, Deserialize)]
struct JwtClaims {
    sub: Option<String>,
    client_id: Option<String>,
    azp: Option<String>,
    exp: Option<u64>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    scp: Option<Vec<String>>,
    #[serde(flatten)]
    rest: serde_json::Map<String, serde_json::Value>,
}

/// HS256 JWTs signed with a shared secret.
#[derive(Clone)]
pub struct JwtVerifier {
    key: jsonwebtoken::DecodingKey,
    validation: jsonwebtoken::Validation,
}

impl JwtVerifier {
    #[must_use]
    pub fn hs256(secret: &[u8]) -> Self {
        let mut validation = jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_aud = false;
        Self {
            key: jsonwebtoken::DecodingKey::from_secret(secret),
            validation,
        }
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.validation.set_issuer(&[issuer]);
        self
    }

    #[must_use]
    pub fn with_audience(mut self, audience: &str) -> Self {
        self.validation.set_audience(&[audience]);
        self.validation.validate_aud = true;
        self
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify(
        &self,
        bearer: Option<&str>,
        _headers: &HeaderMap,
    ) -> anyhow::Result<Option<AuthInfo>> {
        let Some(token) = bearer else {
            return Ok(None);
        };
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.key, &self.validation)?;
        let claims = data.claims;
        let client_id = claims
            .client_id
            .or(claims.azp)
            .or(claims.sub)
            .ok_or_else(|| anyhow::anyhow!("token has no subject or client id"))?;
        let scopes = match (claims.scope, claims.scp) {
            (Some(s), _) => s.split_whitespace().map(str::to_string).collect(),
            (None, Some(list)) => list,
            (None, None) => Vec::new(),
        };
        Ok(Some(AuthInfo {
            token: token.to_string(),
            client_id,
            scopes,
            expires_at: claims.exp,
            resource: None,
            extra: claims.rest,
        }))
    }
}

/// Forwards the bearer token to an OAuth `userinfo` endpoint.
#[derive(Clone)]
pub struct UserInfoVerifier {
    http: reqwest::Client,
    url: String,
}

impl UserInfoVerifier {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl TokenVerifier for UserInfoVerifier {
    async fn verify(
        &self,
        bearer: Option<&str>,
        _headers: &HeaderMap,
    ) -> anyhow::Result<Option<AuthInfo>> {
        let Some(token) = bearer else {
            return Ok(None);
        };
        let resp = self.http.get(&self.url).bearer_auth(token).send().await?;
        if matches!(
            resp.status(),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }
        let resp = resp.error_for_status()?;
        let body: serde_json::Map<String, serde_json::Value> = resp.json().await?;
        let client_id = body
            .get("sub")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("userinfo response has no `sub`"))?
            .to_string();
        let scopes = body
            .get("scope")
            .and_then(serde_json::Value::as_str)
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        Ok(Some(AuthInfo {
            token: token.to_string(),
            client_id,
            scopes,
            extra: body,
            ..AuthInfo::default()
        }))
    }
}
