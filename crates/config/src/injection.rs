//! Build-time projection of the resolved config into named, serialized constants.
//!
//! The runtime never re-reads the user config: it only sees the variables produced here, embedded
//! in (or shipped next to) the build artifact.

use crate::domain::{ResolvedConfig, ResolvedHttpConfig};
use crate::error::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

pub const HTTP_CONFIG: &str = "HTTP_CONFIG";
pub const HTTP_CORS_CONFIG: &str = "HTTP_CORS_CONFIG";
pub const OAUTH_CONFIG: &str = "OAUTH_CONFIG";
pub const TOOLS_PATH: &str = "TOOLS_PATH";
pub const STDIO_CONFIG: &str = "STDIO_CONFIG";

/// File name of the artifact written by the build step.
pub const ARTIFACT_FILE_NAME: &str = "injected.json";

/// Name -> serialized (JSON) value. Ordered, so the artifact is byte-stable.
pub type InjectedVariables = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    Development,
    #[default]
    Production,
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}

fn put<T: Serialize + ?Sized>(vars: &mut InjectedVariables, name: &str, value: &T) -> Result<()> {
    vars.insert(name.to_string(), serde_json::to_string(value)?);
    Ok(())
}

/// Project a resolved config into injected variables.
///
/// - `HTTP_CONFIG` / `HTTP_CORS_CONFIG` only when HTTP is enabled; `debug` follows the build mode,
///   never the user's declared value
/// - `OAUTH_CONFIG` only when OAuth is declared
/// - `STDIO_CONFIG` only when stdio is enabled
/// - `TOOLS_PATH` always
///
/// # Errors
///
/// Returns an error if a bundle fails to serialize.
pub fn project(resolved: &ResolvedConfig, mode: BuildMode) -> Result<InjectedVariables> {
    let mut vars = InjectedVariables::new();

    if let Some(http) = &resolved.http {
        let bundle = ResolvedHttpConfig {
            stateless: true,
            debug: mode == BuildMode::Development,
            ..http.clone()
        };
        put(&mut vars, HTTP_CONFIG, &bundle)?;
        let cors = resolved
            .cors
            .clone()
            .unwrap_or_else(crate::defaults::cors);
        put(&mut vars, HTTP_CORS_CONFIG, &cors)?;
    }

    if let Some(oauth) = &resolved.oauth {
        put(&mut vars, OAUTH_CONFIG, oauth)?;
    }

    put(&mut vars, TOOLS_PATH, &resolved.paths.tools)?;

    if let Some(stdio) = &resolved.stdio {
        put(&mut vars, STDIO_CONFIG, stdio)?;
    }

    Ok(vars)
}

/// Write the artifact into `out_dir`, returning its path.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot be written.
pub fn write_artifact(out_dir: &Path, vars: &InjectedVariables) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(ARTIFACT_FILE_NAME);
    let mut bytes = serde_json::to_vec_pretty(vars)?;
    bytes.push(b'\n');
    std::fs::write(&path, bytes)?;
    Ok(path)
}

/// Read an artifact written by [`write_artifact`].
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a JSON object of strings.
pub fn read_artifact(path: &Path) -> Result<InjectedVariables> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
