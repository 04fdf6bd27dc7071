use serde_json::Value;
use sha2::{Digest as _, Sha256};
use unrelated_mcp_runtime::prelude::*;

pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

pub fn module() -> ToolModule {
    ToolModule::new(handler_fn(|args, _extra| async move {
        let Some(input) = args.get("input").and_then(Value::as_str) else {
            return Ok(CallToolResult::success(vec![Content::text(
                "Invalid input: string required",
            )]));
        };
        Ok(CallToolResult::success(vec![Content::text(sha256_hex(
            input,
        ))]))
    }))
    .with_schema(Export::shape([(
        "input",
        string().min_length(1).describe("The string to hash").shared(),
    )]))
    .with_metadata(ToolMetadata {
        name: Some("hash-string".into()),
        description: Some("Hash a string using SHA-256".into()),
        annotations: None,
    })
}
