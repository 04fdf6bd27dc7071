//! Argument validators ("value decoders") used to declare a tool's input shape.
//!
//! Each validator is a JSON Schema fragment. A tool's shape maps argument names to validators; the
//! composed object schema is advertised as the tool's `inputSchema` and compiled once with
//! `jsonschema` to check call arguments.

use jsonschema::error::ValidationErrorKind;
use rmcp::model::JsonObject;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// One failed check on a call's arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    MissingRequired {
        parameter: String,
    },
    Constraint {
        instance_path: String,
        message: String,
    },
}

impl Violation {
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::MissingRequired { parameter } => json!({
                "type": "missing-required-parameter",
                "parameter": parameter,
            }),
            Self::Constraint {
                instance_path,
                message,
            } => json!({
                "type": "constraint-violation",
                "message": message,
                "instancePath": instance_path,
            }),
        }
    }
}

/// A value decoder, described as JSON Schema.
pub trait Validator: Send + Sync + fmt::Debug {
    /// JSON Schema fragment describing accepted values.
    fn json_schema(&self) -> Value;

    /// Whether an absent value is accepted.
    fn is_optional(&self) -> bool {
        false
    }

    /// Value used when the argument is absent.
    fn fallback(&self) -> Option<Value> {
        None
    }
}

impl<V: Validator + ?Sized> Validator for Arc<V> {
    fn json_schema(&self) -> Value {
        (**self).json_schema()
    }

    fn is_optional(&self) -> bool {
        (**self).is_optional()
    }

    fn fallback(&self) -> Option<Value> {
        (**self).fallback()
    }
}

pub type SharedValidator = Arc<dyn Validator>;

// ------------------------------------------------------------------------------------------------
// Primitives
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct StringValidator {
    min_length: Option<usize>,
    max_length: Option<usize>,
}

#[must_use]
pub fn string() -> StringValidator {
    StringValidator::default()
}

impl StringValidator {
    #[must_use]
    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    #[must_use]
    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }
}

impl Validator for StringValidator {
    fn json_schema(&self) -> Value {
        let mut schema = json!({ "type": "string" });
        if let Some(min) = self.min_length {
            schema["minLength"] = json!(min);
        }
        if let Some(max) = self.max_length {
            schema["maxLength"] = json!(max);
        }
        schema
    }
}

#[derive(Debug, Clone, Default)]
pub struct NumberValidator {
    integer: bool,
    min: Option<f64>,
    max: Option<f64>,
}

#[must_use]
pub fn number() -> NumberValidator {
    NumberValidator::default()
}

#[must_use]
pub fn integer() -> NumberValidator {
    NumberValidator {
        integer: true,
        ..NumberValidator::default()
    }
}

impl NumberValidator {
    #[must_use]
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    #[must_use]
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }
}

impl Validator for NumberValidator {
    fn json_schema(&self) -> Value {
        let mut schema = json!({ "type": if self.integer { "integer" } else { "number" } });
        if let Some(min) = self.min {
            schema["minimum"] = json!(min);
        }
        if let Some(max) = self.max {
            schema["maximum"] = json!(max);
        }
        schema
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanValidator;

#[must_use]
pub fn boolean() -> BooleanValidator {
    BooleanValidator
}

impl Validator for BooleanValidator {
    fn json_schema(&self) -> Value {
        json!({ "type": "boolean" })
    }
}

/// One of a fixed set of strings.
#[derive(Debug, Clone)]
pub struct EnumValidator {
    options: Vec<String>,
}

pub fn enumeration<I, S>(options: I) -> EnumValidator
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    EnumValidator {
        options: options.into_iter().map(Into::into).collect(),
    }
}

impl Validator for EnumValidator {
    fn json_schema(&self) -> Value {
        json!({ "type": "string", "enum": self.options })
    }
}

// ------------------------------------------------------------------------------------------------
// Compound
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ArrayValidator {
    item: SharedValidator,
}

pub fn array(item: impl Validator + 'static) -> ArrayValidator {
    ArrayValidator {
        item: Arc::new(item),
    }
}

impl Validator for ArrayValidator {
    fn json_schema(&self) -> Value {
        json!({ "type": "array", "items": self.item.json_schema() })
    }
}

fn object_schema(fields: &BTreeMap<String, SharedValidator>) -> Value {
    let properties: Map<String, Value> = fields
        .iter()
        .map(|(k, v)| (k.clone(), v.json_schema()))
        .collect();
    let required: Vec<&str> = fields
        .iter()
        .filter(|(_, v)| !v.is_optional())
        .map(|(k, _)| k.as_str())
        .collect();
    let mut schema = json!({ "type": "object", "properties": properties });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

/// A nested object argument with named fields.
#[derive(Debug, Clone, Default)]
pub struct ObjectValidator {
    fields: BTreeMap<String, SharedValidator>,
}

pub fn object<I, K>(fields: I) -> ObjectValidator
where
    I: IntoIterator<Item = (K, SharedValidator)>,
    K: Into<String>,
{
    ObjectValidator {
        fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
    }
}

impl Validator for ObjectValidator {
    fn json_schema(&self) -> Value {
        object_schema(&self.fields)
    }
}

/// A raw JSON Schema document, for shapes the builders cannot express.
#[derive(Debug, Clone)]
pub struct JsonSchemaValidator {
    schema: Value,
}

impl JsonSchemaValidator {
    /// # Errors
    ///
    /// Returns an error if `schema` is not a valid JSON Schema.
    pub fn new(schema: Value) -> anyhow::Result<Self> {
        jsonschema::validator_for(&schema)
            .map_err(|e| anyhow::anyhow!("invalid JSON schema: {e}"))?;
        Ok(Self { schema })
    }
}

impl Validator for JsonSchemaValidator {
    fn json_schema(&self) -> Value {
        self.schema.clone()
    }
}

// ------------------------------------------------------------------------------------------------
// Combinators
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Optional<V>(V);

impl<V: Validator> Validator for Optional<V> {
    fn json_schema(&self) -> Value {
        self.0.json_schema()
    }

    fn is_optional(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
pub struct WithDefault<V> {
    inner: V,
    default: Value,
}

impl<V: Validator> Validator for WithDefault<V> {
    fn json_schema(&self) -> Value {
        let mut schema = self.inner.json_schema();
        if let Some(obj) = schema.as_object_mut() {
            obj.insert("default".to_string(), self.default.clone());
        }
        schema
    }

    fn is_optional(&self) -> bool {
        true
    }

    fn fallback(&self) -> Option<Value> {
        Some(self.default.clone())
    }
}

#[derive(Debug, Clone)]
pub struct Described<V> {
    inner: V,
    description: String,
}

impl<V: Validator> Validator for Described<V> {
    fn json_schema(&self) -> Value {
        let mut schema = self.inner.json_schema();
        if let Some(obj) = schema.as_object_mut() {
            obj.insert(
                "description".to_string(),
                Value::String(self.description.clone()),
            );
        }
        schema
    }

    fn is_optional(&self) -> bool {
        self.inner.is_optional()
    }

    fn fallback(&self) -> Option<Value> {
        self.inner.fallback()
    }
}

/// Builder-style combinators available on every validator.
pub trait ValidatorExt: Validator + Sized + 'static {
    fn optional(self) -> Optional<Self> {
        Optional(self)
    }

    fn default_value(self, default: impl Into<Value>) -> WithDefault<Self> {
        WithDefault {
            inner: self,
            default: default.into(),
        }
    }

    fn describe(self, description: impl Into<String>) -> Described<Self> {
        Described {
            inner: self,
            description: description.into(),
        }
    }

    fn shared(self) -> SharedValidator {
        Arc::new(self)
    }
}

impl<V: Validator + Sized + 'static> ValidatorExt for V {}

// ------------------------------------------------------------------------------------------------
// Tool input shape
// ------------------------------------------------------------------------------------------------

/// A tool's arguments: names mapped to validators, compiled into one object schema.
#[derive(Clone)]
pub struct InputShape {
    fields: BTreeMap<String, SharedValidator>,
    schema: Value,
    compiled: Option<Arc<jsonschema::Validator>>,
}

impl fmt::Debug for InputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputShape")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl Default for InputShape {
    fn default() -> Self {
        Self::empty()
    }
}

impl InputShape {
    /// A shape that accepts no arguments.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            fields: BTreeMap::new(),
            schema: object_schema(&BTreeMap::new()),
            compiled: None,
        }
    }

    /// # Errors
    ///
    /// Returns an error if the composed schema does not compile.
    pub fn new(fields: BTreeMap<String, SharedValidator>) -> anyhow::Result<Self> {
        if fields.is_empty() {
            return Ok(Self::empty());
        }
        let schema = object_schema(&fields);
        let compiled = jsonschema::validator_for(&schema)
            .map_err(|e| anyhow::anyhow!("invalid input schema: {e}"))?;
        Ok(Self {
            fields,
            schema,
            compiled: Some(Arc::new(compiled)),
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The composed object schema (`inputSchema`).
    #[must_use]
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Keep the declared arguments, fill defaults, then validate.
    ///
    /// Unknown arguments are dropped before validation.
    ///
    /// # Errors
    ///
    /// Returns every violation found.
    pub fn parse(&self, mut args: JsonObject) -> Result<JsonObject, Vec<Violation>> {
        let mut out = JsonObject::new();
        let mut violations = Vec::new();
        for (key, validator) in &self.fields {
            if let Some(v) = args.remove(key) {
                out.insert(key.clone(), v);
            } else if let Some(d) = validator.fallback() {
                out.insert(key.clone(), d);
            } else if !validator.is_optional() {
                violations.push(Violation::MissingRequired {
                    parameter: key.clone(),
                });
            }
        }
        for key in args.keys() {
            tracing::debug!(parameter = %key, "dropping unknown tool argument");
        }

        let instance = Value::Object(out);
        if let Some(compiled) = &self.compiled {
            for e in compiled.iter_errors(&instance) {
                // Already reported as missing-required-parameter.
                if matches!(e.kind(), ValidationErrorKind::Required { .. }) {
                    continue;
                }
                violations.push(Violation::Constraint {
                    instance_path: e.instance_path().to_string(),
                    message: e.to_string(),
                });
            }
        }

        match instance {
            Value::Object(out) if violations.is_empty() => Ok(out),
            _ => Err(violations),
        }
    }
}
