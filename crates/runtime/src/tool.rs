//! Tool modules and the sources they are loaded from.

use crate::auth::AuthInfo;
use crate::middleware::Middleware;
use crate::validator::{SharedValidator, Validator};
use async_trait::async_trait;
use rmcp::model::{CallToolResult, JsonObject, RequestId, ToolAnnotations};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Per-call context handed to a tool handler.
#[derive(Debug, Clone)]
pub struct ToolExtra {
    /// Cancelled when the client cancels the request or the transport goes away.
    pub ct: CancellationToken,
    pub request_id: RequestId,
    /// Present when the request was authenticated (HTTP mode only).
    pub auth_info: Option<AuthInfo>,
}

#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool with already-validated arguments.
    ///
    /// An `Err` is reported to the client as an `isError` result, never as a protocol error.
    async fn call(&self, args: JsonObject, extra: ToolExtra) -> anyhow::Result<CallToolResult>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(JsonObject, ToolExtra) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<CallToolResult>> + Send,
{
    async fn call(&self, args: JsonObject, extra: ToolExtra) -> anyhow::Result<CallToolResult> {
        (self.0)(args, extra).await
    }
}

/// Wrap an async closure as a [`ToolHandler`].
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn ToolHandler>
where
    F: Fn(JsonObject, ToolExtra) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<CallToolResult>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// A dynamically-shaped exported value.
///
/// Module exports are only known at load time, so the registry and the middleware resolver
/// inspect them structurally instead of trusting their declared types.
#[derive(Clone)]
pub enum Export {
    /// Plain data (null, scalars, lists or objects of data).
    Value(Value),
    Validator(SharedValidator),
    Middleware(Middleware),
    List(Vec<Export>),
    Map(BTreeMap<String, Export>),
}

impl fmt::Debug for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Validator(v) => f.debug_tuple("Validator").field(v).finish(),
            Self::Middleware(_) => f.write_str("Middleware(..)"),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Map(map) => f.debug_tuple("Map").field(map).finish(),
        }
    }
}

impl Export {
    pub fn validator(v: impl Validator + 'static) -> Self {
        Self::Validator(Arc::new(v))
    }

    /// A shape export: argument name -> validator.
    pub fn shape<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, SharedValidator)>,
        K: Into<String>,
    {
        Self::Map(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), Self::Validator(v)))
                .collect(),
        )
    }
}

/// Whether an exported value is a value decoder.
#[must_use]
pub fn is_validator(export: &Export) -> bool {
    matches!(export, Export::Validator(_))
}

/// Module-supplied metadata. Present fields override the derived defaults.
#[derive(Debug, Clone, Default)]
pub struct ToolMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
    pub annotations: Option<ToolAnnotations>,
}

/// What a tool source yields once loaded.
#[derive(Clone)]
pub struct ToolModule {
    pub handler: Arc<dyn ToolHandler>,
    pub schema: Option<Export>,
    pub metadata: Option<ToolMetadata>,
}

impl ToolModule {
    pub fn new(handler: Arc<dyn ToolHandler>) -> Self {
        Self {
            handler,
            schema: None,
            metadata: None,
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Export) -> Self {
        self.schema = Some(schema);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: ToolMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[async_trait]
pub trait ToolSource: Send + Sync {
    async fn load(&self) -> anyhow::Result<ToolModule>;
}

#[async_trait]
impl ToolSource for ToolModule {
    async fn load(&self) -> anyhow::Result<ToolModule> {
        Ok(self.clone())
    }
}

struct FnSource<F>(F);

#[async_trait]
impl<F, Fut> ToolSource for FnSource<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<ToolModule>> + Send,
{
    async fn load(&self) -> anyhow::Result<ToolModule> {
        (self.0)().await
    }
}

/// Wrap an async loader as a [`ToolSource`].
pub fn source_fn<F, Fut>(f: F) -> Arc<dyn ToolSource>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<ToolModule>> + Send + 'static,
{
    Arc::new(FnSource(f))
}

/// Last path segment with its extension stripped: `a/b/my-tool.rs` -> `my-tool`.
#[must_use]
pub fn derive_tool_name(path: &str) -> String {
    let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => file.to_string(),
    }
}

/// Tool sources keyed by path under the tools directory, in source order.
#[derive(Clone, Default)]
pub struct ToolCatalog {
    root: String,
    entries: Vec<(String, Arc<dyn ToolSource>)>,
}

impl ToolCatalog {
    pub fn new(tools_path: impl Into<String>) -> Self {
        Self {
            root: tools_path.into(),
            entries: Vec::new(),
        }
    }

    /// Add a source at `relative_path` (joined onto the tools directory).
    #[must_use]
    pub fn with(mut self, relative_path: &str, source: Arc<dyn ToolSource>) -> Self {
        self.add(relative_path, source);
        self
    }

    pub fn add(&mut self, relative_path: &str, source: Arc<dyn ToolSource>) {
        let root = self.root.trim_end_matches('/');
        let relative = relative_path.trim_start_matches("./").trim_start_matches('/');
        let path = if root.is_empty() {
            relative.to_string()
        } else {
            format!("{root}/{relative}")
        };
        self.entries.push((path, source));
    }

    /// Re-root every entry under a different tools directory.
    #[must_use]
    pub fn rooted_at(self, tools_path: &str) -> Self {
        let old_root = self.root.trim_end_matches('/').to_string();
        let mut out = Self::new(tools_path);
        for (path, source) in self.entries {
            let relative = path
                .strip_prefix(&old_root)
                .map_or(path.as_str(), |r| r.trim_start_matches('/'));
            out.add(relative, source);
        }
        out
    }

    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Arc<dyn ToolSource>)> {
        self.entries.iter().map(|(p, s)| (p.as_str(), s))
    }
}
