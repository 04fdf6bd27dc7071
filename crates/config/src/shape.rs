//! Shape checking for raw config values.
//!
//! Runs before deserialization/resolution so that a wrongly-typed field is reported with its
//! path (`http.port`) instead of an opaque "did not match any variant" from serde.

use crate::error::{ConfigError, Result};
use serde_json::{Map, Value};

const TOP_LEVEL_KEYS: &[&str] = &["http", "stdio", "paths", "experimental"];

fn kind(v: &Value) -> String {
    match v {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean `{b}`"),
        Value::Number(n) => format!("number `{n}`"),
        Value::String(_) => "string".to_string(),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

fn shape_err(field: &str, expected: &'static str, found: &Value) -> ConfigError {
    ConfigError::Shape {
        field: field.to_string(),
        expected,
        found: kind(found),
    }
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn as_object<'a>(field: &str, v: &'a Value) -> Result<&'a Map<String, Value>> {
    v.as_object().ok_or_else(|| shape_err(field, "an object", v))
}

fn check_path(field: &str, v: &Value) -> Result<()> {
    match v.as_str() {
        Some(s) if s.starts_with('/') => Ok(()),
        _ => Err(shape_err(field, "a path starting with `/`", v)),
    }
}

fn check_string(field: &str, v: &Value) -> Result<()> {
    if v.is_string() {
        Ok(())
    } else {
        Err(shape_err(field, "a string", v))
    }
}

fn check_bool(field: &str, v: &Value) -> Result<()> {
    if v.is_boolean() {
        Ok(())
    } else {
        Err(shape_err(field, "a boolean", v))
    }
}

fn check_u64(field: &str, v: &Value) -> Result<()> {
    if v.is_u64() {
        Ok(())
    } else {
        Err(shape_err(field, "a non-negative integer", v))
    }
}

fn check_port(field: &str, v: &Value) -> Result<()> {
    match v.as_u64() {
        Some(p) if u16::try_from(p).is_ok() => Ok(()),
        _ => Err(shape_err(field, "an integer between 0 and 65535", v)),
    }
}

fn is_string_array(v: &Value) -> bool {
    v.as_array()
        .is_some_and(|items| items.iter().all(Value::is_string))
}

fn check_string_list(field: &str, v: &Value) -> Result<()> {
    if v.is_string() || is_string_array(v) {
        Ok(())
    } else {
        Err(shape_err(field, "a string or an array of strings", v))
    }
}

fn check_origin(field: &str, v: &Value) -> Result<()> {
    if v.is_string() || v.is_boolean() || is_string_array(v) {
        Ok(())
    } else {
        Err(shape_err(
            field,
            "a string, an array of strings or a boolean",
            v,
        ))
    }
}

fn warn_unknown(parent: &str, obj: &Map<String, Value>, known: &[&str]) {
    for key in obj.keys() {
        if !known.contains(&key.as_str()) {
            tracing::warn!(field = %join(parent, key), "unknown config field; ignoring");
        }
    }
}

/// Check a raw config value against the declared shapes of every domain.
///
/// # Errors
///
/// Returns [`ConfigError::Shape`] for the first offending field.
pub fn check(raw: &Value) -> Result<()> {
    let root = as_object("<root>", raw)?;
    warn_unknown("", root, TOP_LEVEL_KEYS);

    if let Some(http) = root.get("http") {
        check_http(http)?;
    }
    if let Some(stdio) = root.get("stdio") {
        check_stdio(stdio)?;
    }
    if let Some(paths) = root.get("paths") {
        let obj = as_object("paths", paths)?;
        warn_unknown("paths", obj, &["tools"]);
        if let Some(tools) = obj.get("tools") {
            check_string("paths.tools", tools)?;
        }
    }
    if let Some(experimental) = root.get("experimental") {
        let obj = as_object("experimental", experimental)?;
        warn_unknown("experimental", obj, &["oauth"]);
        if let Some(oauth) = obj.get("oauth") {
            check_oauth(oauth)?;
        }
    }
    Ok(())
}

fn check_http(v: &Value) -> Result<()> {
    if v.is_boolean() {
        return Ok(());
    }
    let obj = v
        .as_object()
        .ok_or_else(|| shape_err("http", "a boolean or an object", v))?;
    warn_unknown(
        "http",
        obj,
        &["port", "host", "bodySizeLimit", "debug", "endpoint", "cors"],
    );

    if let Some(port) = obj.get("port") {
        check_port("http.port", port)?;
    }
    if let Some(host) = obj.get("host") {
        check_string("http.host", host)?;
    }
    if let Some(limit) = obj.get("bodySizeLimit") {
        check_u64("http.bodySizeLimit", limit)?;
    }
    if let Some(debug) = obj.get("debug") {
        check_bool("http.debug", debug)?;
    }
    if let Some(endpoint) = obj.get("endpoint") {
        check_path("http.endpoint", endpoint)?;
    }
    if let Some(cors) = obj.get("cors") {
        check_cors(cors)?;
    }
    Ok(())
}

fn check_cors(v: &Value) -> Result<()> {
    let obj = as_object("http.cors", v)?;
    warn_unknown(
        "http.cors",
        obj,
        &[
            "origin",
            "methods",
            "allowedHeaders",
            "exposedHeaders",
            "credentials",
            "maxAge",
        ],
    );

    if let Some(origin) = obj.get("origin") {
        check_origin("http.cors.origin", origin)?;
    }
    for key in ["methods", "allowedHeaders", "exposedHeaders"] {
        if let Some(list) = obj.get(key) {
            check_string_list(&join("http.cors", key), list)?;
        }
    }
    if let Some(credentials) = obj.get("credentials") {
        check_bool("http.cors.credentials", credentials)?;
    }
    if let Some(max_age) = obj.get("maxAge") {
        check_u64("http.cors.maxAge", max_age)?;
    }
    Ok(())
}

fn check_stdio(v: &Value) -> Result<()> {
    if v.is_boolean() {
        return Ok(());
    }
    let obj = v
        .as_object()
        .ok_or_else(|| shape_err("stdio", "a boolean or an object", v))?;
    warn_unknown("stdio", obj, &["debug"]);
    if let Some(debug) = obj.get("debug") {
        check_bool("stdio.debug", debug)?;
    }
    Ok(())
}

/// Only the types of present fields are checked; completeness is validated downstream.
fn check_oauth(v: &Value) -> Result<()> {
    let obj = as_object("experimental.oauth", v)?;
    for key in ["issuerUrl", "baseUrl", "serviceDocumentationUrl"] {
        if let Some(field) = obj.get(key) {
            check_string(&join("experimental.oauth", key), field)?;
        }
    }
    if let Some(prefix) = obj.get("pathPrefix") {
        check_path("experimental.oauth.pathPrefix", prefix)?;
    }
    if let Some(scopes) = obj.get("defaultScopes")
        && !is_string_array(scopes)
    {
        return Err(shape_err(
            "experimental.oauth.defaultScopes",
            "an array of strings",
            scopes,
        ));
    }
    if let Some(endpoints) = obj.get("endpoints") {
        let endpoints = as_object("experimental.oauth.endpoints", endpoints)?;
        for (key, field) in endpoints {
            check_string(&join("experimental.oauth.endpoints", key), field)?;
        }
    }
    Ok(())
}
