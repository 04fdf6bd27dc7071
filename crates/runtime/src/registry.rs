//! Tool loading, shape validation and registration.
//!
//! Boot sequence:
//! 1. [`load_all`] loads every source concurrently and waits for all of them to settle
//! 2. [`register_all`] derives defaults, validates each declared shape and registers the tool
//!    into a [`ToolTable`]
//!
//! The table is read-only afterwards and shared by every protocol server instance.

use crate::error::RegistryError;
use crate::tool::{Export, ToolCatalog, ToolExtra, ToolHandler, ToolModule, derive_tool_name, is_validator};
use crate::validator::{InputShape, SharedValidator, Violation};
use futures::future::join_all;
use rmcp::ErrorData;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool, ToolAnnotations};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Description used when a module does not provide one.
pub const DEFAULT_DESCRIPTION: &str = "No description provided";

/// Load every source in the catalog.
///
/// All loads run concurrently and all of them settle before this returns; there is no
/// short-circuit and no retry. On failure the first failing source in catalog order is reported.
///
/// # Errors
///
/// Returns [`RegistryError::Load`] for the first source (in catalog order) that failed.
pub async fn load_all(catalog: &ToolCatalog) -> Result<Vec<(String, ToolModule)>, RegistryError> {
    let loads = catalog.entries().map(|(path, source)| {
        let path = path.to_string();
        let source = Arc::clone(source);
        async move {
            let result = source.load().await;
            (path, result)
        }
    });

    let settled = join_all(loads).await;

    let mut loaded = Vec::with_capacity(settled.len());
    let mut first_failure = None;
    for (path, result) in settled {
        match result {
            Ok(module) => loaded.push((path, module)),
            Err(source) => {
                tracing::error!(path = %path, error = %source, "tool failed to load");
                if first_failure.is_none() {
                    first_failure = Some(RegistryError::Load { path, source });
                }
            }
        }
    }

    match first_failure {
        Some(err) => Err(err),
        None => Ok(loaded),
    }
}

/// A tool ready to be registered.
#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub shape: InputShape,
    pub annotations: ToolAnnotations,
    pub handler: Arc<dyn ToolHandler>,
    /// Where the tool came from (for diagnostics).
    pub source_path: String,
}

/// A declared schema that was not a mapping of argument names to validators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeWarning {
    pub tool: String,
    pub path: String,
}

/// Outcome of a successful registration pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationReport {
    /// Registered names in registration order.
    pub tools: Vec<String>,
    pub warnings: Vec<ShapeWarning>,
}

/// Turn a declared schema export into an input shape.
///
/// `None` (no schema exported) is an empty shape. A mapping whose every value is a validator is a
/// shape; an empty mapping is valid. Anything else, including a mapping whose composed schema does
/// not compile, is rejected.
fn resolve_shape(schema: Option<&Export>) -> Option<InputShape> {
    let Some(schema) = schema else {
        return Some(InputShape::empty());
    };
    let Export::Map(fields) = schema else {
        return None;
    };
    if !fields.values().all(is_validator) {
        return None;
    }
    let shape: BTreeMap<String, SharedValidator> = fields
        .iter()
        .filter_map(|(k, v)| match v {
            Export::Validator(v) => Some((k.clone(), Arc::clone(v))),
            _ => None,
        })
        .collect();
    match InputShape::new(shape) {
        Ok(shape) => Some(shape),
        Err(e) => {
            tracing::debug!(error = %e, "input schema does not compile");
            None
        }
    }
}

/// Apply the defaulting rules to one loaded module.
///
/// Returns the descriptor and, when the declared schema was malformed, the warning to record.
#[must_use]
pub fn describe(path: &str, module: &ToolModule) -> (ToolDescriptor, Option<ShapeWarning>) {
    let mut name = derive_tool_name(path);
    let mut description = DEFAULT_DESCRIPTION.to_string();
    let mut annotations = ToolAnnotations::default();

    if let Some(meta) = &module.metadata {
        if let Some(n) = &meta.name {
            name.clone_from(n);
        }
        if let Some(d) = &meta.description {
            description.clone_from(d);
        }
        if let Some(a) = &meta.annotations {
            annotations = a.clone();
        }
    }

    let (shape, warning) = match resolve_shape(module.schema.as_ref()) {
        Some(shape) => (shape, None),
        None => {
            tracing::warn!(
                tool = %name,
                path = %path,
                "Invalid schema for tool. Expected a map of argument names to validators; registering with an empty input shape"
            );
            (
                InputShape::empty(),
                Some(ShapeWarning {
                    tool: name.clone(),
                    path: path.to_string(),
                }),
            )
        }
    };

    (
        ToolDescriptor {
            name,
            description,
            shape,
            annotations,
            handler: Arc::clone(&module.handler),
            source_path: path.to_string(),
        },
        warning,
    )
}

/// Register every loaded module into `table`.
///
/// # Errors
///
/// Returns [`RegistryError::DuplicateName`] if two tools resolve to the same name.
pub fn register_all(
    table: &mut ToolTable,
    loaded: &[(String, ToolModule)],
) -> Result<RegistrationReport, RegistryError> {
    let mut report = RegistrationReport::default();
    for (path, module) in loaded {
        let (descriptor, warning) = describe(path, module);
        report.tools.push(descriptor.name.clone());
        report.warnings.extend(warning);
        table.register(descriptor)?;
    }
    Ok(report)
}

/// Load and register a whole catalog.
///
/// # Errors
///
/// Returns the first load failure or a duplicate-name error.
pub async fn build_tool_table(
    catalog: &ToolCatalog,
) -> Result<(Arc<ToolTable>, RegistrationReport), RegistryError> {
    let loaded = load_all(catalog).await?;
    let mut table = ToolTable::default();
    let report = register_all(&mut table, &loaded)?;
    tracing::info!(
        tools = report.tools.len(),
        warnings = report.warnings.len(),
        "registered tools"
    );
    Ok((Arc::new(table), report))
}

/// Registered tools, in registration order.
#[derive(Default)]
pub struct ToolTable {
    tools: Vec<ToolDescriptor>,
    by_name: HashMap<String, usize>,
}

impl ToolTable {
    /// The protocol engine's register primitive.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if `descriptor.name` is already registered.
    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<(), RegistryError> {
        if let Some(&idx) = self.by_name.get(&descriptor.name) {
            return Err(RegistryError::DuplicateName {
                name: descriptor.name,
                first: self.tools[idx].source_path.clone(),
                second: descriptor.source_path,
            });
        }
        tracing::debug!(tool = %descriptor.name, path = %descriptor.source_path, "registered tool");
        self.by_name
            .insert(descriptor.name.clone(), self.tools.len());
        self.tools.push(descriptor);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.by_name.get(name).map(|&i| &self.tools[i])
    }

    /// Tool definitions as advertised by `tools/list`.
    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools
            .iter()
            .map(|t| {
                let schema_obj = t
                    .shape
                    .schema()
                    .as_object()
                    .cloned()
                    .unwrap_or_else(JsonObject::new);
                let mut tool = Tool::new(t.name.clone(), t.description.clone(), Arc::new(schema_obj));
                tool.annotations = Some(t.annotations.clone());
                tool
            })
            .collect()
    }

    /// Validate arguments and run a tool.
    ///
    /// # Errors
    ///
    /// Returns `invalid_params` for an unknown tool or arguments that fail the input shape. Handler
    /// failures are not errors: they come back as an `isError` result.
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
        extra: ToolExtra,
    ) -> Result<CallToolResult, ErrorData> {
        let tool = self
            .get(name)
            .ok_or_else(|| ErrorData::invalid_params(format!("Tool {name} not found"), None))?;

        let args = validate_arguments(&tool.shape, arguments.unwrap_or_default())
            .map_err(|(msg, data)| ErrorData::invalid_params(msg, Some(data)))?;

        match tool.handler.call(args, extra).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::debug!(tool = %name, error = %e, "tool handler failed");
                Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
            }
        }
    }
}

/// Parse arguments against a shape.
///
/// Unknown arguments are dropped, except that a tool without arguments rejects any.
fn validate_arguments(
    shape: &InputShape,
    args: JsonObject,
) -> Result<JsonObject, (String, Value)> {
    if shape.is_empty() {
        if args.is_empty() {
            return Ok(args);
        }
        let violations: Vec<Value> = args
            .keys()
            .map(|k| {
                json!({
                    "type": "invalid-parameter",
                    "parameter": k,
                    "validParameters": [],
                })
            })
            .collect();
        let first = args.keys().next().map_or("?", String::as_str);
        return Err((
            format!("Invalid params: unknown parameter '{first}' (this tool takes no arguments)"),
            json!({ "type": "validation-errors", "violations": violations }),
        ));
    }

    shape.parse(args).map_err(|violations| {
        (
            format!(
                "Invalid params: validation failed with {} error(s)",
                violations.len()
            ),
            json!({
                "type": "validation-errors",
                "violations": violations.iter().map(Violation::to_json).collect::<Vec<_>>(),
            }),
        )
    })
}
