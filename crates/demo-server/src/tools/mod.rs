//! The demo's tools, keyed by their path under the tools directory.

mod extra_arguments;
mod greet;
mod hash_string;

use std::sync::Arc;
use unrelated_mcp_runtime::ToolCatalog;
use unrelated_mcp_runtime::tool::source_fn;

pub fn catalog(tools_path: &str) -> ToolCatalog {
    ToolCatalog::new(tools_path)
        .with("greet.rs", Arc::new(greet::module()))
        .with("hash_string.rs", Arc::new(hash_string::module()))
        .with(
            "extra_arguments.rs",
            source_fn(|| async { Ok(extra_arguments::module()) }),
        )
}
