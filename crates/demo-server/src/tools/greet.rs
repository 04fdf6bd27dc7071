use serde_json::Value;
use unrelated_mcp_runtime::prelude::*;

pub fn module() -> ToolModule {
    ToolModule::new(handler_fn(|args, _extra| async move {
        let name = args.get("name").and_then(Value::as_str).unwrap_or("world");
        let greeting = match args.get("style").and_then(Value::as_str) {
            Some("formal") => format!("Good day, {name}."),
            _ => format!("Hello, {name}!"),
        };
        Ok(CallToolResult::success(vec![Content::text(greeting)]))
    }))
    .with_schema(Export::shape([
        ("name", string().min_length(1).describe("The name of the user to greet").shared()),
        (
            "style",
            enumeration(["casual", "formal"])
                .default_value(serde_json::json!("casual"))
                .shared(),
        ),
    ]))
    .with_metadata(ToolMetadata {
        description: Some("Greet the user".into()),
        annotations: Some(ToolAnnotations {
            title: Some("Greet the user".into()),
            read_only_hint: Some(true),
            destructive_hint: Some(false),
            idempotent_hint: Some(true),
            open_world_hint: Some(false),
        }),
        ..ToolMetadata::default()
    })
}
