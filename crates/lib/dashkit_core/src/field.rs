//! Declarative field descriptors for tool inputs.
//!
//! A tool declares its input as an ordered list of [`Field`]s. The list drives
//! three things: the `schema.fields` / `ui.args` parts of the manifest, default
//! filling before dispatch, and coercion of raw JSON arguments into the shape
//! the handler's input type deserializes from.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Number, Value, json};

use crate::error::FieldError;

/// Primitive type of a declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    /// A string restricted to the listed options.
    Enum(Vec<String>),
    /// Any JSON object; structure is checked by the handler's input type.
    Object,
    /// A resolved `{id, label}` pair.
    TagValue,
}

impl FieldType {
    /// JSON schema `type` keyword for this field type.
    pub fn json_type(&self) -> &'static str {
        match self {
            FieldType::String | FieldType::Enum(_) => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Object | FieldType::TagValue => "object",
        }
    }
}

/// Default for a field that is missing or null in the request.
///
/// `Computed` producers run on every request, so a default such as "the
/// current year" stays fresh for the lifetime of the process.
#[derive(Clone)]
pub enum DefaultValue {
    Literal(Value),
    Computed(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    pub fn computed<F>(producer: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self::Computed(Arc::new(producer))
    }

    /// Evaluate the default for the current request.
    pub fn resolve(&self) -> Value {
        match self {
            DefaultValue::Literal(v) => v.clone(),
            DefaultValue::Computed(f) => f(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            DefaultValue::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Reference to a tag value type by namespace and name.
///
/// A `None` namespace means "the namespace of the app serving the manifest".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DTypeRef {
    pub ns: Option<String>,
    pub name: String,
}

impl DTypeRef {
    pub fn new(ns: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ns: Some(ns.into()),
            name: name.into(),
        }
    }
}

/// One named input of a tool.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    field_type: FieldType,
    title: Option<String>,
    description: Option<String>,
    default: Option<DefaultValue>,
    optional: bool,
    dtype: Option<DTypeRef>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            title: None,
            description: None,
            default: None,
            optional: false,
            dtype: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub fn enumeration<I, T>(name: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::new(
            name,
            FieldType::Enum(options.into_iter().map(Into::into).collect()),
        )
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Object)
    }

    pub fn tag_value(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::TagValue)
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::literal(value));
        self
    }

    pub fn computed_default<F>(mut self, producer: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::computed(producer));
        self
    }

    /// Accept a missing or null value when no default applies.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Bind the field to a tag value type so the UI renders a picker for it.
    pub fn dtype(mut self, dtype: DTypeRef) -> Self {
        self.dtype = Some(dtype);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    /// Display label: the title, falling back to the field name.
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    pub fn dtype_ref(&self) -> Option<&DTypeRef> {
        self.dtype.as_ref()
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    /// JSON schema fragment published under `schema.fields`.
    ///
    /// Only literal defaults are published; computed ones depend on the
    /// request time.
    pub fn schema(&self) -> Value {
        let mut schema = Map::new();
        if let Some(title) = &self.title {
            schema.insert("title".into(), json!(title));
        }
        if let Some(description) = &self.description {
            schema.insert("description".into(), json!(description));
        }
        schema.insert("type".into(), json!(self.field_type.json_type()));
        if let FieldType::Enum(options) = &self.field_type {
            schema.insert("enum".into(), json!(options));
        }
        if let Some(DefaultValue::Literal(v)) = &self.default {
            schema.insert("default".into(), v.clone());
        }
        Value::Object(schema)
    }

    /// Coerce a present, non-null raw value into this field's type.
    pub fn coerce(&self, raw: Value) -> Result<Value, FieldError> {
        let wrong_type = |found: Value| FieldError::WrongType {
            field: self.name.clone(),
            expected: self.field_type.json_type(),
            found,
        };

        match &self.field_type {
            FieldType::String => match raw {
                Value::String(_) => Ok(raw),
                other => Err(wrong_type(other)),
            },
            FieldType::Integer => match &raw {
                Value::Number(n) => integral(n).map(Value::from).ok_or_else(|| wrong_type(raw)),
                Value::String(s) => parse_integral(s).map(Value::from).ok_or_else(|| wrong_type(raw)),
                _ => Err(wrong_type(raw)),
            },
            FieldType::Number => match &raw {
                Value::Number(_) => Ok(raw),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| wrong_type(raw)),
                _ => Err(wrong_type(raw)),
            },
            FieldType::Boolean => match &raw {
                Value::Bool(_) => Ok(raw),
                Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
                Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
                _ => Err(wrong_type(raw)),
            },
            FieldType::Enum(options) => match raw {
                Value::String(s) if options.contains(&s) => Ok(Value::String(s)),
                Value::String(s) => Err(FieldError::NotInEnum {
                    field: self.name.clone(),
                    value: s,
                    options: options.clone(),
                }),
                other => Err(wrong_type(other)),
            },
            FieldType::Object => match raw {
                Value::Object(_) => Ok(raw),
                other => Err(wrong_type(other)),
            },
            FieldType::TagValue => match &raw {
                Value::Object(map)
                    if ["id", "label"]
                        .iter()
                        .all(|k| map.get(*k).is_none_or(Value::is_string)) =>
                {
                    Ok(raw)
                }
                _ => Err(wrong_type(raw)),
            },
        }
    }
}

fn integral(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    n.as_f64().and_then(integral_f64)
}

fn parse_integral(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().and_then(integral_f64))
}

fn integral_f64(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn is_absent(args: &Map<String, Value>, key: &str) -> bool {
    args.get(key).is_none_or(Value::is_null)
}

/// Fill every field that is missing or null with its declared default.
pub fn apply_defaults(fields: &[Field], args: &mut Map<String, Value>) {
    for field in fields {
        if let Some(default) = &field.default
            && is_absent(args, &field.name)
        {
            args.insert(field.name.clone(), default.resolve());
        }
    }
}

/// Validate and coerce `args` against `fields`.
///
/// Keys that no field declares are passed through unchanged.
pub fn coerce_args(
    fields: &[Field],
    mut args: Map<String, Value>,
) -> Result<Map<String, Value>, FieldError> {
    for field in fields {
        match args.remove(&field.name) {
            Some(raw) if !raw.is_null() => {
                let value = field.coerce(raw)?;
                args.insert(field.name.clone(), value);
            }
            _ if field.optional => {
                args.insert(field.name.clone(), Value::Null);
            }
            _ => {
                return Err(FieldError::Missing {
                    field: field.name.clone(),
                });
            }
        }
    }
    Ok(args)
}
