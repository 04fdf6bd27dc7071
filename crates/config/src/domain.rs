//! Configuration domains: declared forms, resolved forms and the resolution rules between them.
//!
//! Every domain follows the same rule set:
//! - boolean-capable domains (`http`, `stdio`) resolve `false`/absent to "disabled" and `true` to
//!   the documented defaults
//! - an object is merged over the defaults field by field (shallow; nested domains such as CORS
//!   are resolved on their own, never merged recursively by the parent)
//!
//! Resolution is total for well-typed input. Type errors are caught earlier by
//! [`crate::shape::check`].

use crate::defaults;
use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The independently resolvable configuration areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainKind {
    HttpTransport,
    Cors,
    StdioTransport,
    Paths,
    OAuth,
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::HttpTransport => "http",
            Self::Cors => "http.cors",
            Self::StdioTransport => "stdio",
            Self::Paths => "paths",
            Self::OAuth => "experimental.oauth",
        };
        f.write_str(s)
    }
}

/// A domain with a declared form and a resolved form.
pub trait ConfigurationDomain {
    const KIND: DomainKind;

    /// What a user may write for this domain.
    type Declared;
    /// The fully populated form. Disable-able domains use `Option<_>`.
    type Resolved;

    fn resolve(declared: Option<&Self::Declared>) -> Self::Resolved;

    /// Express a resolved value in declared form again (used to re-resolve artifacts).
    fn declare(resolved: &Self::Resolved) -> Option<Self::Declared>;
}

/// Resolve one domain.
pub fn resolve<D: ConfigurationDomain>(declared: Option<&D::Declared>) -> D::Resolved {
    D::resolve(declared)
}

/// Boolean shorthand or a partial object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Toggle<T> {
    Flag(bool),
    Custom(T),
}

/// `string | string[]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringList {
    One(String),
    Many(Vec<String>),
}

impl StringList {
    /// Individual entries; a single string may carry a comma-separated list.
    #[must_use]
    pub fn items(&self) -> Vec<&str> {
        match self {
            Self::One(s) => s.split(',').map(str::trim).filter(|s| !s.is_empty()).collect(),
            Self::Many(v) => v.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).collect(),
        }
    }
}

/// `string | string[] | bool`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    Flag(bool),
    One(String),
    Many(Vec<String>),
}

// ------------------------------------------------------------------------------------------------
// Declared forms
// ------------------------------------------------------------------------------------------------

/// Top-level user config (`unrelated-mcp.config.{json,yaml}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<Toggle<HttpTransportConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdio: Option<Toggle<StdioTransportConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paths: Option<PathsConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimental: Option<ExperimentalConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpTransportConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_size_limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cors: Option<CorsConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<CorsOrigin>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<StringList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_headers: Option<StringList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposed_headers: Option<StringList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StdioTransportConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth: Option<OAuthConfig>,
}

/// OAuth declaration, carried verbatim into the artifact.
///
/// Required fields are optional here on purpose: an incomplete declaration must survive
/// resolution and fail in [`OAuthConfig::validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<OAuthEndpoints>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_documentation_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_scopes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthEndpoints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_info_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub register_url: Option<String>,
}

// ------------------------------------------------------------------------------------------------
// Resolved forms
// ------------------------------------------------------------------------------------------------

/// Resolved HTTP transport settings. Serialized as the `HTTP_CONFIG` bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedHttpConfig {
    pub port: u16,
    pub host: String,
    pub body_size_limit: u64,
    pub endpoint: String,
    /// Only stateless serving is implemented.
    pub stateless: bool,
    pub debug: bool,
}

/// Resolved CORS policy. Serialized as the `HTTP_CORS_CONFIG` bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedCorsConfig {
    pub origin: CorsOrigin,
    pub methods: StringList,
    pub allowed_headers: StringList,
    pub exposed_headers: StringList,
    pub credentials: bool,
    pub max_age: u64,
}

/// Serialized as the `STDIO_CONFIG` bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedStdioConfig {
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPathsConfig {
    pub tools: String,
}

/// Complete OAuth settings, produced by [`OAuthConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthSettings {
    pub authorization_url: String,
    pub token_url: String,
    pub register_url: String,
    pub revocation_url: Option<String>,
    pub user_info_url: Option<String>,
    pub issuer_url: String,
    pub base_url: String,
    pub service_documentation_url: Option<String>,
    pub path_prefix: String,
    pub default_scopes: Vec<String>,
}

/// Leading `/`, no trailing `/`; the root prefix becomes empty.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

impl OAuthConfig {
    /// Check required fields and fill the non-required ones.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::IncompleteOAuth`] naming the first missing required field.
    pub fn validate(&self) -> Result<OAuthSettings> {
        fn required(v: Option<&String>, field: &'static str) -> Result<String> {
            v.filter(|s| !s.trim().is_empty())
                .cloned()
                .ok_or(ConfigError::IncompleteOAuth(field))
        }

        let endpoints = self
            .endpoints
            .as_ref()
            .ok_or(ConfigError::IncompleteOAuth("endpoints"))?;

        Ok(OAuthSettings {
            authorization_url: required(
                endpoints.authorization_url.as_ref(),
                "endpoints.authorizationUrl",
            )?,
            token_url: required(endpoints.token_url.as_ref(), "endpoints.tokenUrl")?,
            register_url: required(endpoints.register_url.as_ref(), "endpoints.registerUrl")?,
            revocation_url: endpoints.revocation_url.clone(),
            user_info_url: endpoints.user_info_url.clone(),
            issuer_url: required(self.issuer_url.as_ref(), "issuerUrl")?,
            base_url: required(self.base_url.as_ref(), "baseUrl")?,
            service_documentation_url: self.service_documentation_url.clone(),
            path_prefix: normalize_prefix(
                self.path_prefix
                    .as_deref()
                    .unwrap_or(defaults::DEFAULT_OAUTH_PATH_PREFIX),
            ),
            default_scopes: self.default_scopes.clone().unwrap_or_else(|| {
                defaults::DEFAULT_OAUTH_SCOPES
                    .iter()
                    .map(|s| (*s).to_string())
                    .collect()
            }),
        })
    }
}

// ------------------------------------------------------------------------------------------------
// Domains
// ------------------------------------------------------------------------------------------------

pub struct HttpTransport;

impl ConfigurationDomain for HttpTransport {
    const KIND: DomainKind = DomainKind::HttpTransport;
    type Declared = Toggle<HttpTransportConfig>;
    type Resolved = Option<ResolvedHttpConfig>;

    fn resolve(declared: Option<&Self::Declared>) -> Self::Resolved {
        match declared? {
            Toggle::Flag(false) => None,
            Toggle::Flag(true) => Some(defaults::http()),
            Toggle::Custom(user) => {
                let base = defaults::http();
                Some(ResolvedHttpConfig {
                    port: user.port.unwrap_or(base.port),
                    host: user.host.clone().unwrap_or(base.host),
                    body_size_limit: user.body_size_limit.unwrap_or(base.body_size_limit),
                    endpoint: user.endpoint.clone().unwrap_or(base.endpoint),
                    stateless: base.stateless,
                    debug: user.debug.unwrap_or(base.debug),
                })
            }
        }
    }

    fn declare(resolved: &Self::Resolved) -> Option<Self::Declared> {
        let r = resolved.as_ref()?;
        Some(Toggle::Custom(HttpTransportConfig {
            port: Some(r.port),
            host: Some(r.host.clone()),
            body_size_limit: Some(r.body_size_limit),
            debug: Some(r.debug),
            endpoint: Some(r.endpoint.clone()),
            cors: None,
        }))
    }
}

/// Second-order domain: its declared input is the whole HTTP declaration.
pub struct Cors;

impl ConfigurationDomain for Cors {
    const KIND: DomainKind = DomainKind::Cors;
    type Declared = Toggle<HttpTransportConfig>;
    type Resolved = Option<ResolvedCorsConfig>;

    fn resolve(declared: Option<&Self::Declared>) -> Self::Resolved {
        let user = match declared? {
            Toggle::Flag(false) => return None,
            Toggle::Flag(true) => return Some(defaults::cors()),
            Toggle::Custom(http) => match &http.cors {
                Some(cors) => cors,
                None => return Some(defaults::cors()),
            },
        };

        let base = defaults::cors();
        Some(ResolvedCorsConfig {
            origin: user.origin.clone().unwrap_or(base.origin),
            methods: user.methods.clone().unwrap_or(base.methods),
            allowed_headers: user.allowed_headers.clone().unwrap_or(base.allowed_headers),
            exposed_headers: user.exposed_headers.clone().unwrap_or(base.exposed_headers),
            credentials: user.credentials.unwrap_or(base.credentials),
            max_age: user.max_age.unwrap_or(base.max_age),
        })
    }

    fn declare(resolved: &Self::Resolved) -> Option<Self::Declared> {
        let r = resolved.as_ref()?;
        Some(Toggle::Custom(HttpTransportConfig {
            cors: Some(CorsConfig {
                origin: Some(r.origin.clone()),
                methods: Some(r.methods.clone()),
                allowed_headers: Some(r.allowed_headers.clone()),
                exposed_headers: Some(r.exposed_headers.clone()),
                credentials: Some(r.credentials),
                max_age: Some(r.max_age),
            }),
            ..HttpTransportConfig::default()
        }))
    }
}

pub struct StdioTransport;

impl ConfigurationDomain for StdioTransport {
    const KIND: DomainKind = DomainKind::StdioTransport;
    type Declared = Toggle<StdioTransportConfig>;
    type Resolved = Option<ResolvedStdioConfig>;

    fn resolve(declared: Option<&Self::Declared>) -> Self::Resolved {
        match declared? {
            Toggle::Flag(false) => None,
            Toggle::Flag(true) => Some(defaults::stdio()),
            Toggle::Custom(user) => Some(ResolvedStdioConfig {
                debug: user.debug.unwrap_or(defaults::stdio().debug),
            }),
        }
    }

    fn declare(resolved: &Self::Resolved) -> Option<Self::Declared> {
        resolved.map(|r| {
            Toggle::Custom(StdioTransportConfig {
                debug: Some(r.debug),
            })
        })
    }
}

pub struct Paths;

impl ConfigurationDomain for Paths {
    const KIND: DomainKind = DomainKind::Paths;
    type Declared = PathsConfig;
    type Resolved = ResolvedPathsConfig;

    fn resolve(declared: Option<&Self::Declared>) -> Self::Resolved {
        let base = defaults::paths();
        ResolvedPathsConfig {
            tools: declared
                .and_then(|p| p.tools.clone())
                .unwrap_or(base.tools),
        }
    }

    fn declare(resolved: &Self::Resolved) -> Option<Self::Declared> {
        Some(PathsConfig {
            tools: Some(resolved.tools.clone()),
        })
    }
}

/// No defaulting at all: the declaration is carried as-is.
pub struct OAuth;

impl ConfigurationDomain for OAuth {
    const KIND: DomainKind = DomainKind::OAuth;
    type Declared = OAuthConfig;
    type Resolved = Option<OAuthConfig>;

    fn resolve(declared: Option<&Self::Declared>) -> Self::Resolved {
        declared.cloned()
    }

    fn declare(resolved: &Self::Resolved) -> Option<Self::Declared> {
        resolved.clone()
    }
}

/// Every domain resolved from one [`UserConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub http: Option<ResolvedHttpConfig>,
    pub cors: Option<ResolvedCorsConfig>,
    pub stdio: Option<ResolvedStdioConfig>,
    pub paths: ResolvedPathsConfig,
    pub oauth: Option<OAuthConfig>,
}

impl UserConfig {
    #[must_use]
    pub fn resolve(&self) -> ResolvedConfig {
        ResolvedConfig {
            http: resolve::<HttpTransport>(self.http.as_ref()),
            cors: resolve::<Cors>(self.http.as_ref()),
            stdio: resolve::<StdioTransport>(self.stdio.as_ref()),
            paths: resolve::<Paths>(self.paths.as_ref()),
            oauth: resolve::<OAuth>(self.experimental.as_ref().and_then(|e| e.oauth.as_ref())),
        }
    }
}

impl ResolvedConfig {
    /// At least one transport must be enabled for a build to be useful.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoTransport`] when both `http` and `stdio` are disabled.
    pub fn ensure_transport(&self) -> Result<()> {
        if self.http.is_none() && self.stdio.is_none() {
            return Err(ConfigError::NoTransport);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Debug;

    fn assert_idempotent<D>(declared: Option<&D::Declared>)
    where
        D: ConfigurationDomain,
        D::Resolved: PartialEq + Debug,
    {
        let once = resolve::<D>(declared);
        let again = resolve::<D>(D::declare(&once).as_ref());
        assert_eq!(once, again, "domain {} is not idempotent", D::KIND);
    }

    fn http(cfg: HttpTransportConfig) -> Toggle<HttpTransportConfig> {
        Toggle::Custom(cfg)
    }

    #[test]
    fn http_absent_or_false_is_disabled() {
        assert_eq!(resolve::<HttpTransport>(None), None);
        assert_eq!(resolve::<HttpTransport>(Some(&Toggle::Flag(false))), None);
    }

    #[test]
    fn http_true_is_exactly_the_defaults() {
        assert_eq!(
            resolve::<HttpTransport>(Some(&Toggle::Flag(true))),
            Some(defaults::http())
        );
    }

    #[test]
    fn http_partial_object_keeps_present_fields_and_defaults_the_rest() {
        let declared = http(HttpTransportConfig {
            port: Some(4000),
            endpoint: Some("/rpc".into()),
            ..Default::default()
        });
        let resolved = resolve::<HttpTransport>(Some(&declared)).expect("enabled");
        assert_eq!(resolved.port, 4000);
        assert_eq!(resolved.endpoint, "/rpc");
        assert_eq!(resolved.host, defaults::DEFAULT_HTTP_HOST);
        assert_eq!(resolved.body_size_limit, defaults::DEFAULT_HTTP_BODY_SIZE_LIMIT);
        assert!(!resolved.debug);
        assert!(resolved.stateless);
    }

    #[test]
    fn cors_only_resolves_under_an_enabled_http_domain() {
        assert_eq!(resolve::<Cors>(None), None);
        assert_eq!(resolve::<Cors>(Some(&Toggle::Flag(false))), None);
        assert_eq!(
            resolve::<Cors>(Some(&Toggle::Flag(true))),
            Some(defaults::cors())
        );
        assert_eq!(
            resolve::<Cors>(Some(&http(HttpTransportConfig::default()))),
            Some(defaults::cors())
        );
    }

    #[test]
    fn cors_merges_shallowly_over_its_own_defaults() {
        let declared = http(HttpTransportConfig {
            cors: Some(CorsConfig {
                origin: Some(CorsOrigin::Many(vec!["https://a.example".into()])),
                credentials: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        });
        let resolved = resolve::<Cors>(Some(&declared)).expect("enabled");
        assert_eq!(
            resolved.origin,
            CorsOrigin::Many(vec!["https://a.example".into()])
        );
        assert!(resolved.credentials);
        assert_eq!(resolved.methods, defaults::cors().methods);
        assert_eq!(resolved.max_age, defaults::DEFAULT_CORS_MAX_AGE);
    }

    #[test]
    fn stdio_follows_the_boolean_rules() {
        assert_eq!(resolve::<StdioTransport>(None), None);
        assert_eq!(resolve::<StdioTransport>(Some(&Toggle::Flag(false))), None);
        assert_eq!(
            resolve::<StdioTransport>(Some(&Toggle::Flag(true))),
            Some(ResolvedStdioConfig { debug: false })
        );
        assert_eq!(
            resolve::<StdioTransport>(Some(&Toggle::Custom(StdioTransportConfig {
                debug: Some(true)
            }))),
            Some(ResolvedStdioConfig { debug: true })
        );
    }

    #[test]
    fn paths_always_resolve() {
        assert_eq!(resolve::<Paths>(None).tools, defaults::DEFAULT_TOOLS_DIR);
        assert_eq!(
            resolve::<Paths>(Some(&PathsConfig::default())).tools,
            defaults::DEFAULT_TOOLS_DIR
        );
        assert_eq!(
            resolve::<Paths>(Some(&PathsConfig {
                tools: Some("tools".into())
            }))
            .tools,
            "tools"
        );
    }

    #[test]
    fn oauth_is_carried_without_defaulting() {
        assert_eq!(resolve::<OAuth>(None), None);
        let partial = OAuthConfig {
            issuer_url: Some("https://issuer.example".into()),
            ..Default::default()
        };
        assert_eq!(resolve::<OAuth>(Some(&partial)), Some(partial.clone()));
        assert!(matches!(
            partial.validate(),
            Err(ConfigError::IncompleteOAuth("endpoints"))
        ));
    }

    #[test]
    fn oauth_validate_fills_non_required_fields() {
        let cfg = OAuthConfig {
            endpoints: Some(OAuthEndpoints {
                authorization_url: Some("https://idp.example/authorize".into()),
                token_url: Some("https://idp.example/token".into()),
                register_url: Some("https://idp.example/register".into()),
                ..Default::default()
            }),
            issuer_url: Some("https://idp.example".into()),
            base_url: Some("http://127.0.0.1:3001".into()),
            ..Default::default()
        };
        let settings = cfg.validate().expect("complete");
        assert_eq!(settings.path_prefix, "/oauth2");
        assert_eq!(settings.default_scopes, vec!["openid", "profile", "email"]);

        for (declared, expected) in [("oauth2", "/oauth2"), ("/auth/", "/auth"), ("/", "")] {
            let cfg = OAuthConfig {
                path_prefix: Some(declared.into()),
                ..cfg.clone()
            };
            assert_eq!(cfg.validate().expect("complete").path_prefix, expected);
        }
    }

    #[test]
    fn resolution_is_idempotent_for_every_domain() {
        let partial_http = http(HttpTransportConfig {
            port: Some(8080),
            debug: Some(true),
            cors: Some(CorsConfig {
                max_age: Some(5),
                ..Default::default()
            }),
            ..Default::default()
        });
        for declared in [
            None,
            Some(Toggle::Flag(false)),
            Some(Toggle::Flag(true)),
            Some(partial_http),
        ] {
            assert_idempotent::<HttpTransport>(declared.as_ref());
            assert_idempotent::<Cors>(declared.as_ref());
        }

        for declared in [None, Some(Toggle::Flag(true)), Some(Toggle::Flag(false))] {
            assert_idempotent::<StdioTransport>(declared.as_ref());
        }

        assert_idempotent::<Paths>(None);
        assert_idempotent::<Paths>(Some(&PathsConfig {
            tools: Some("lib/tools".into()),
        }));
        assert_idempotent::<OAuth>(Some(&OAuthConfig::default()));
    }

    #[test]
    fn no_transport_is_rejected() {
        let resolved = UserConfig::default().resolve();
        assert!(matches!(
            resolved.ensure_transport(),
            Err(ConfigError::NoTransport)
        ));
    }

    #[test]
    fn string_list_splits_comma_separated_values() {
        assert_eq!(
            StringList::One("GET, POST".into()).items(),
            vec!["GET", "POST"]
        );
        assert_eq!(
            StringList::Many(vec!["a".into(), String::new()]).items(),
            vec!["a"]
        );
    }
}
