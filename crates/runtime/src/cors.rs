//! CORS policy built from the resolved CORS bundle.

use crate::error::ComposeError;
use axum::http::{HeaderName, HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer, ExposeHeaders};
use unrelated_mcp_config::{CorsOrigin, ResolvedCorsConfig, StringList};

const WILDCARD: &str = "*";

fn origin(cfg: &ResolvedCorsConfig) -> Result<AllowOrigin, ComposeError> {
    let parse = |value: &str| {
        HeaderValue::from_str(value).map_err(|_| ComposeError::InvalidCors {
            field: "origin",
            value: value.to_string(),
        })
    };
    let wildcard = || {
        if cfg.credentials {
            // Browsers refuse `*` together with credentials.
            tracing::warn!("CORS origin `*` with credentials; mirroring the request origin");
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::any()
        }
    };

    Ok(match &cfg.origin {
        CorsOrigin::Flag(true) => AllowOrigin::mirror_request(),
        CorsOrigin::Flag(false) => AllowOrigin::list(Vec::<HeaderValue>::new()),
        CorsOrigin::One(s) if s.trim() == WILDCARD => wildcard(),
        CorsOrigin::One(s) => AllowOrigin::exact(parse(s.trim())?),
        CorsOrigin::Many(list) if list.iter().any(|s| s.trim() == WILDCARD) => wildcard(),
        CorsOrigin::Many(list) => AllowOrigin::list(
            list.iter()
                .map(|s| parse(s.trim()))
                .collect::<Result<Vec<_>, _>>()?,
        ),
    })
}

fn header_names(list: &StringList, field: &'static str) -> Result<Vec<HeaderName>, ComposeError> {
    list.items()
        .into_iter()
        .filter(|h| *h != WILDCARD)
        .map(|h| {
            HeaderName::try_from(h).map_err(|_| ComposeError::InvalidCors {
                field,
                value: h.to_string(),
            })
        })
        .collect()
}

fn has_wildcard(list: &StringList) -> bool {
    list.items().contains(&WILDCARD)
}

fn methods(cfg: &ResolvedCorsConfig) -> Result<AllowMethods, ComposeError> {
    if has_wildcard(&cfg.methods) {
        return Ok(if cfg.credentials {
            AllowMethods::mirror_request()
        } else {
            AllowMethods::any()
        });
    }
    let methods = cfg
        .methods
        .items()
        .into_iter()
        .map(|m| {
            Method::from_bytes(m.to_ascii_uppercase().as_bytes()).map_err(|_| {
                ComposeError::InvalidCors {
                    field: "methods",
                    value: m.to_string(),
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(AllowMethods::list(methods))
}

fn allowed_headers(cfg: &ResolvedCorsConfig) -> Result<AllowHeaders, ComposeError> {
    if has_wildcard(&cfg.allowed_headers) {
        return Ok(if cfg.credentials {
            AllowHeaders::mirror_request()
        } else {
            AllowHeaders::any()
        });
    }
    Ok(AllowHeaders::list(header_names(
        &cfg.allowed_headers,
        "allowedHeaders",
    )?))
}

fn exposed_headers(cfg: &ResolvedCorsConfig) -> Result<ExposeHeaders, ComposeError> {
    if has_wildcard(&cfg.exposed_headers) && !cfg.credentials {
        return Ok(ExposeHeaders::any());
    }
    Ok(ExposeHeaders::list(header_names(
        &cfg.exposed_headers,
        "exposedHeaders",
    )?))
}

/// Build the CORS stage. Preflight requests are answered here and never reach inner stages.
pub fn cors_layer(cfg: &ResolvedCorsConfig) -> Result<CorsLayer, ComposeError> {
    Ok(CorsLayer::new()
        .allow_origin(origin(cfg)?)
        .allow_methods(methods(cfg)?)
        .allow_headers(allowed_headers(cfg)?)
        .expose_headers(exposed_headers(cfg)?)
        .allow_credentials(cfg.credentials)
        .max_age(Duration::from_secs(cfg.max_age)))
}
