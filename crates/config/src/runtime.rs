//! Runtime view of the injected variables.

use crate::domain::{OAuthConfig, ResolvedCorsConfig, ResolvedHttpConfig, ResolvedStdioConfig};
use crate::error::{ConfigError, Result};
use crate::injection::{
    HTTP_CONFIG, HTTP_CORS_CONFIG, InjectedVariables, OAUTH_CONFIG, STDIO_CONFIG, TOOLS_PATH,
};
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// The two mutually exclusive serving modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Persistent stream over stdin/stdout.
    Stdio,
    /// Stateless HTTP, one protocol server per request.
    Http,
}

impl TransportKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            other => Err(format!("unknown transport `{other}` (expected `stdio` or `http`)")),
        }
    }
}

/// Immutable configuration the runtime boots from.
///
/// Built once from the injected variables and shared by reference afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub http: Option<ResolvedHttpConfig>,
    pub cors: Option<ResolvedCorsConfig>,
    pub stdio: Option<ResolvedStdioConfig>,
    pub tools_path: String,
    pub oauth: Option<OAuthConfig>,
}

fn decode<T: DeserializeOwned>(vars: &InjectedVariables, name: &'static str) -> Result<Option<T>> {
    vars.get(name)
        .map(|raw| {
            serde_json::from_str(raw).map_err(|source| ConfigError::InvalidVariable { name, source })
        })
        .transpose()
}

impl RuntimeConfig {
    /// Decode the injected variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVariable`] when `TOOLS_PATH` is absent or one of the HTTP
    /// bundles is present without its companion, and [`ConfigError::InvalidVariable`] when a value
    /// does not decode.
    pub fn from_injected(vars: &InjectedVariables) -> Result<Self> {
        let http: Option<ResolvedHttpConfig> = decode(vars, HTTP_CONFIG)?;
        let cors: Option<ResolvedCorsConfig> = decode(vars, HTTP_CORS_CONFIG)?;
        match (&http, &cors) {
            (Some(_), None) => return Err(ConfigError::MissingVariable(HTTP_CORS_CONFIG)),
            (None, Some(_)) => return Err(ConfigError::MissingVariable(HTTP_CONFIG)),
            _ => {}
        }

        let tools_path: String =
            decode(vars, TOOLS_PATH)?.ok_or(ConfigError::MissingVariable(TOOLS_PATH))?;

        for name in vars.keys() {
            if ![HTTP_CONFIG, HTTP_CORS_CONFIG, OAUTH_CONFIG, TOOLS_PATH, STDIO_CONFIG]
                .contains(&name.as_str())
            {
                tracing::debug!(variable = %name, "ignoring unknown injected variable");
            }
        }

        Ok(Self {
            http: http.map(|h| ResolvedHttpConfig {
                stateless: true,
                ..h
            }),
            cors,
            stdio: decode(vars, STDIO_CONFIG)?,
            tools_path,
            oauth: decode(vars, OAUTH_CONFIG)?,
        })
    }

    /// Decode an artifact's JSON text (e.g. embedded with `include_str!`).
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a JSON object of strings or fails
    /// [`RuntimeConfig::from_injected`].
    pub fn from_json_str(json: &str) -> Result<Self> {
        let vars: InjectedVariables = serde_json::from_str(json)?;
        Self::from_injected(&vars)
    }

    /// Read and decode an artifact file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn load(path: &Path) -> Result<Self> {
        let vars = crate::injection::read_artifact(path)?;
        let cfg = Self::from_injected(&vars)?;
        tracing::debug!(path = %path.display(), "loaded injected variables");
        Ok(cfg)
    }

    #[must_use]
    pub fn is_enabled(&self, kind: TransportKind) -> bool {
        match kind {
            TransportKind::Stdio => self.stdio.is_some(),
            TransportKind::Http => self.http.is_some(),
        }
    }

    /// Pick the serving mode: an explicit request must be enabled; otherwise HTTP wins over stdio.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TransportDisabled`] for an explicit request the build did not enable
    /// and [`ConfigError::NoTransport`] when nothing is enabled.
    pub fn select_transport(&self, requested: Option<TransportKind>) -> Result<TransportKind> {
        if let Some(kind) = requested {
            return if self.is_enabled(kind) {
                Ok(kind)
            } else {
                Err(ConfigError::TransportDisabled(kind.as_str()))
            };
        }
        if self.http.is_some() {
            Ok(TransportKind::Http)
        } else if self.stdio.is_some() {
            Ok(TransportKind::Stdio)
        } else {
            Err(ConfigError::NoTransport)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Toggle, UserConfig};
    use crate::injection::{BuildMode, project};

    fn both_transports() -> InjectedVariables {
        let cfg = UserConfig {
            http: Some(Toggle::Flag(true)),
            stdio: Some(Toggle::Flag(true)),
            ..Default::default()
        };
        project(&cfg.resolve(), BuildMode::Development).expect("project")
    }

    #[test]
    fn decodes_a_projected_artifact() {
        let cfg = RuntimeConfig::from_injected(&both_transports()).expect("decode");
        let http = cfg.http.as_ref().expect("http");
        assert_eq!(http.port, 3001);
        assert!(http.debug);
        assert!(http.stateless);
        assert_eq!(cfg.cors, Some(crate::defaults::cors()));
        assert_eq!(cfg.stdio, Some(ResolvedStdioConfig { debug: false }));
        assert_eq!(cfg.tools_path, "src/tools");
        assert_eq!(cfg.oauth, None);
    }

    #[test]
    fn missing_companion_bundle_is_rejected() {
        let mut vars = both_transports();
        vars.remove(HTTP_CORS_CONFIG);
        assert!(matches!(
            RuntimeConfig::from_injected(&vars),
            Err(ConfigError::MissingVariable(HTTP_CORS_CONFIG))
        ));

        let mut vars = both_transports();
        vars.remove(HTTP_CONFIG);
        assert!(matches!(
            RuntimeConfig::from_injected(&vars),
            Err(ConfigError::MissingVariable(HTTP_CONFIG))
        ));

        let mut vars = both_transports();
        vars.remove(TOOLS_PATH);
        assert!(matches!(
            RuntimeConfig::from_injected(&vars),
            Err(ConfigError::MissingVariable(TOOLS_PATH))
        ));
    }

    #[test]
    fn undecodable_values_name_the_variable() {
        let mut vars = both_transports();
        vars.insert(STDIO_CONFIG.to_string(), "{\"debug\":\"yes\"}".to_string());
        let err = RuntimeConfig::from_injected(&vars).expect_err("bad stdio bundle");
        assert!(matches!(err, ConfigError::InvalidVariable { name: STDIO_CONFIG, .. }));
    }

    #[test]
    fn from_json_str_reads_the_artifact_format() {
        let json = serde_json::to_string(&both_transports()).expect("json");
        let cfg = RuntimeConfig::from_json_str(&json).expect("decode");
        assert!(cfg.is_enabled(TransportKind::Http));
        assert!(cfg.is_enabled(TransportKind::Stdio));
    }

    #[test]
    fn transport_selection_prefers_http_and_honours_requests() {
        let mut cfg = RuntimeConfig::from_injected(&both_transports()).expect("decode");
        assert_eq!(cfg.select_transport(None).expect("auto"), TransportKind::Http);
        assert_eq!(
            cfg.select_transport(Some(TransportKind::Stdio)).expect("stdio"),
            TransportKind::Stdio
        );

        cfg.stdio = None;
        assert!(matches!(
            cfg.select_transport(Some(TransportKind::Stdio)),
            Err(ConfigError::TransportDisabled("stdio"))
        ));

        cfg.http = None;
        assert!(matches!(
            cfg.select_transport(None),
            Err(ConfigError::NoTransport)
        ));
    }

    #[test]
    fn transport_kind_parses_case_insensitively() {
        assert_eq!("HTTP".parse::<TransportKind>(), Ok(TransportKind::Http));
        assert_eq!(" stdio ".parse::<TransportKind>(), Ok(TransportKind::Stdio));
        assert!("sse".parse::<TransportKind>().is_err());
    }
}
