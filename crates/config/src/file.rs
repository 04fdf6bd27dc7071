//! Config file discovery and parsing.

use crate::domain::UserConfig;
use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};

/// Searched in order inside the project directory.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    "unrelated-mcp.config.json",
    "unrelated-mcp.config.yaml",
    "unrelated-mcp.config.yml",
];

/// Find the config file in `project_dir`.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] if none of [`CONFIG_FILE_NAMES`] exists.
pub fn find_config_file(project_dir: &Path) -> Result<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|p| p.is_file())
        .ok_or_else(|| ConfigError::NotFound(project_dir.display().to_string()))
}

/// Parse a raw config document. YAML is converted to a JSON value first so that shape checking
/// sees the same structure for both formats.
///
/// # Errors
///
/// Returns an error if the document is not valid JSON/YAML or fails the shape check.
pub fn parse_config(contents: &str, format: ConfigFormat) -> Result<UserConfig> {
    let raw: serde_json::Value = match format {
        ConfigFormat::Json => serde_json::from_str(contents)?,
        ConfigFormat::Yaml => serde_yaml::from_str(contents)?,
    };
    // An empty YAML document is an empty config.
    let raw = if raw.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        raw
    };
    crate::shape::check(&raw)?;
    Ok(serde_json::from_value(raw)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// # Errors
    ///
    /// Returns [`ConfigError::Format`] for extensions other than `json`, `yaml` and `yml`.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            _ => Err(ConfigError::Format(path.display().to_string())),
        }
    }
}

/// Read and parse a config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, has an unsupported extension or is invalid.
pub fn load_config(path: &Path) -> Result<UserConfig> {
    let format = ConfigFormat::from_path(path)?;
    let contents = std::fs::read_to_string(path)?;
    let cfg = parse_config(&contents, format)?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(cfg)
}
