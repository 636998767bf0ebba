//! Tool descriptors and the handler seam.
//!
//! A [`Tool`] bundles a public operation name, its declared input fields, the
//! UI hints published in the manifest, and a type-erased [`Handler`]. Tools
//! are built once at startup with [`ToolBuilder`] and shared as `Arc<Tool<S>>`;
//! the `Arc` is the handler identity the registry deduplicates on.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{FieldError, HandlerError};
use crate::field::{self, DTypeRef, Field};

/// Type-erased tool handler.
///
/// Receives validated arguments and the shared execution state; returns the
/// JSON result placed in the response envelope.
#[async_trait]
pub trait Handler<S>: Send + Sync {
    async fn call(&self, args: Map<String, Value>, state: Arc<S>) -> Result<Value, HandlerError>;
}

/// Adapts an async function over a typed input into a [`Handler`].
struct TypedHandler<I, F> {
    f: F,
    _input: PhantomData<fn() -> I>,
}

#[async_trait]
impl<S, I, R, F, Fut> Handler<S> for TypedHandler<I, F>
where
    S: Send + Sync + 'static,
    I: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    F: Fn(I, Arc<S>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
{
    async fn call(&self, args: Map<String, Value>, state: Arc<S>) -> Result<Value, HandlerError> {
        let input: I = serde_json::from_value(Value::Object(args)).map_err(HandlerError::Input)?;
        let output = (self.f)(input, state).await?;
        serde_json::to_value(output).map_err(HandlerError::Output)
    }
}

/// Reference to a handler, either by registry name or by tool object.
pub enum HandlerRef<S> {
    Name(String),
    Tool(Arc<Tool<S>>),
}

impl<S> HandlerRef<S> {
    /// Registry name the reference resolves to.
    pub fn name(&self) -> &str {
        match self {
            HandlerRef::Name(name) => name,
            HandlerRef::Tool(tool) => tool.name(),
        }
    }
}

impl<S> Clone for HandlerRef<S> {
    fn clone(&self) -> Self {
        match self {
            HandlerRef::Name(name) => HandlerRef::Name(name.clone()),
            HandlerRef::Tool(tool) => HandlerRef::Tool(tool.clone()),
        }
    }
}

impl<S> fmt::Debug for HandlerRef<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerRef::Name(name) => f.debug_tuple("Name").field(name).finish(),
            HandlerRef::Tool(tool) => f.debug_tuple("Tool").field(&tool.name()).finish(),
        }
    }
}

impl<S> From<&str> for HandlerRef<S> {
    fn from(name: &str) -> Self {
        HandlerRef::Name(name.to_string())
    }
}

impl<S> From<String> for HandlerRef<S> {
    fn from(name: String) -> Self {
        HandlerRef::Name(name)
    }
}

impl<S> From<Arc<Tool<S>>> for HandlerRef<S> {
    fn from(tool: Arc<Tool<S>>) -> Self {
        HandlerRef::Tool(tool)
    }
}

/// Binds a click on a rendered tag value to a handler producing follow-up
/// tool arguments.
pub struct ContextAction<S> {
    pub target: DTypeRef,
    pub handler: Option<HandlerRef<S>>,
    pub info: Option<Value>,
}

impl<S> Clone for ContextAction<S> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            handler: self.handler.clone(),
            info: self.info.clone(),
        }
    }
}

impl<S> fmt::Debug for ContextAction<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextAction")
            .field("target", &self.target)
            .field("handler", &self.handler)
            .field("info", &self.info)
            .finish()
    }
}

/// A named, independently invocable operation.
pub struct Tool<S> {
    name: String,
    title: String,
    fields: Vec<Field>,
    ui_prefix: Option<String>,
    manual_update: bool,
    examples: Option<Vec<String>>,
    context_actions: Vec<ContextAction<S>>,
    handler: Box<dyn Handler<S>>,
}

impl<S> fmt::Debug for Tool<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl<S> Tool<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// UI label prefix, defaulting to the title.
    pub fn ui_prefix(&self) -> &str {
        self.ui_prefix.as_deref().unwrap_or(&self.title)
    }

    pub fn manual_update(&self) -> bool {
        self.manual_update
    }

    /// Example invocations, defaulting to `Show {title}`.
    pub fn examples(&self) -> Vec<String> {
        self.examples
            .clone()
            .unwrap_or_else(|| vec![format!("Show {}", self.title)])
    }

    pub fn context_actions(&self) -> &[ContextAction<S>] {
        &self.context_actions
    }

    /// Fill declared defaults, then coerce the merged arguments.
    pub fn prepare_args(&self, mut args: Map<String, Value>) -> Result<Map<String, Value>, FieldError> {
        field::apply_defaults(&self.fields, &mut args);
        field::coerce_args(&self.fields, args)
    }
}

impl<S> Tool<S>
where
    S: Send + Sync + 'static,
{
    pub fn builder(name: impl Into<String>) -> ToolBuilder<S> {
        ToolBuilder::new(name)
    }

    /// Invoke the handler with already prepared arguments.
    pub async fn call(&self, args: Map<String, Value>, state: Arc<S>) -> Result<Value, HandlerError> {
        self.handler.call(args, state).await
    }
}

/// Builder for [`Tool`].
pub struct ToolBuilder<S> {
    name: String,
    title: Option<String>,
    fields: Vec<Field>,
    ui_prefix: Option<String>,
    manual_update: bool,
    examples: Option<Vec<String>>,
    context_actions: Vec<ContextAction<S>>,
}

impl<S> ToolBuilder<S>
where
    S: Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            fields: Vec::new(),
            ui_prefix: None,
            manual_update: false,
            examples: None,
            context_actions: Vec::new(),
        }
    }

    /// Display title; defaults to the tool name.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn ui_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.ui_prefix = Some(prefix.into());
        self
    }

    pub fn manual_update(mut self, manual_update: bool) -> Self {
        self.manual_update = manual_update;
        self
    }

    pub fn examples<I, T>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.examples = Some(examples.into_iter().map(Into::into).collect());
        self
    }

    pub fn context_action(mut self, action: ContextAction<S>) -> Self {
        self.context_actions.push(action);
        self
    }

    /// Finish the tool with an async handler over a typed input.
    pub fn handler<I, R, F, Fut>(self, f: F) -> Arc<Tool<S>>
    where
        I: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(I, Arc<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
    {
        self.raw_handler(TypedHandler {
            f,
            _input: PhantomData,
        })
    }

    /// Finish the tool with a hand-written [`Handler`].
    pub fn raw_handler(self, handler: impl Handler<S> + 'static) -> Arc<Tool<S>> {
        let title = self.title.unwrap_or_else(|| self.name.clone());
        Arc::new(Tool {
            name: self.name,
            title,
            fields: self.fields,
            ui_prefix: self.ui_prefix,
            manual_update: self.manual_update,
            examples: self.examples,
            context_actions: self.context_actions,
            handler: Box::new(handler),
        })
    }
}
