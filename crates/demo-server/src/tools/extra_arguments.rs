use serde_json::json;
use unrelated_mcp_runtime::prelude::*;

pub fn module() -> ToolModule {
    ToolModule::new(handler_fn(|_args, extra| async move {
        let rendered = json!({
            "requestId": extra.request_id,
            "cancelled": extra.ct.is_cancelled(),
            "authInfo": extra.auth_info,
        });
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Your extra arguments are: {rendered}"
        ))]))
    }))
    .with_metadata(ToolMetadata {
        name: Some("extra-arguments".into()),
        description: Some("Access the extra arguments from a tool call".into()),
        annotations: Some(ToolAnnotations {
            title: Some("Extra arguments".into()),
            read_only_hint: Some(true),
            destructive_hint: Some(false),
            idempotent_hint: Some(true),
            open_world_hint: None,
        }),
    })
}
