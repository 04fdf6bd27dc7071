//! Error types for config loading, shape checking and injected-variable decoding.

use thiserror::Error;

/// Main error type for the config crate.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A declared value has the wrong type (checked before any resolution happens).
    #[error("Invalid config at `{field}`: expected {expected}, found {found}")]
    Shape {
        field: String,
        expected: &'static str,
        found: String,
    },

    /// The config file could not be located.
    #[error("No config file found in {0} (looked for {names})", names = crate::file::CONFIG_FILE_NAMES.join(", "))]
    NotFound(String),

    /// Unsupported config file extension.
    #[error("Unsupported config file format: {0}")]
    Format(String),

    /// Neither transport is enabled, so the build would produce nothing to serve.
    #[error("No transport enabled: set `http` and/or `stdio` in the config")]
    NoTransport,

    /// A transport was requested explicitly but the build did not enable it.
    #[error("Transport `{0}` is not enabled in this build")]
    TransportDisabled(&'static str),

    /// A required injected variable is missing from the build artifact.
    #[error("Missing injected variable `{0}`")]
    MissingVariable(&'static str),

    /// An injected variable could not be decoded.
    #[error("Invalid injected variable `{name}`: {source}")]
    InvalidVariable {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// An OAuth declaration is present but incomplete.
    #[error("Invalid OAuth config: missing required field `{0}`")]
    IncompleteOAuth(&'static str),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
