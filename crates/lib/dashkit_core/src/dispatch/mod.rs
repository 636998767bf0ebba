//! Request dispatcher.
//!
//! Answers the two envelope actions:
//!
//! - `info` returns the manifest computed at construction.
//! - `request` resolves `opName`, fills defaults, validates the arguments,
//!   and runs the tool's handler against the shared state.
//!
//! Every failure becomes a structured error envelope; nothing here is fatal
//! to the server.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::app::AppInfo;
use crate::error::{DispatchError, HandlerError};
use crate::manifest::Manifest;
use crate::registry::Registry;

/// What the transport should send back.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchReply {
    /// A JSON body: a handler result or an error envelope.
    Json(Value),
    /// The handler succeeded but its result could not be serialized.
    SerializationFailed,
}

impl From<DispatchError> for DispatchReply {
    fn from(e: DispatchError) -> Self {
        DispatchReply::Json(e.to_envelope())
    }
}

/// Envelope dispatcher over a fixed set of tools.
pub struct Dispatcher<S> {
    state: Arc<S>,
    registry: Registry<S>,
    manifest: Value,
}

impl<S> Dispatcher<S>
where
    S: Send + Sync + 'static,
{
    /// Build the handler table and the cached manifest.
    pub fn new(app: AppInfo<S>) -> Self {
        let registry = Registry::from_app(&app);
        let manifest = serde_json::to_value(Manifest::build(&app, &registry)).unwrap_or_default();

        info!(
            ns = %app.ns,
            tools = app.tools.len(),
            tag_values = app.tag_values.len(),
            handlers = registry.len(),
            "dispatcher ready"
        );

        Self {
            state: app.state,
            registry,
            manifest,
        }
    }

    pub fn manifest(&self) -> &Value {
        &self.manifest
    }

    pub fn registry(&self) -> &Registry<S> {
        &self.registry
    }

    pub fn state(&self) -> &Arc<S> {
        &self.state
    }

    /// Dispatch a raw request body.
    pub async fn dispatch_bytes(&self, body: &[u8]) -> DispatchReply {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => self.dispatch(value).await,
            Err(e) => {
                debug!(error = %e, "request body is not JSON");
                DispatchError::BadRequestBody.into()
            }
        }
    }

    /// Dispatch a parsed request envelope.
    pub async fn dispatch(&self, body: Value) -> DispatchReply {
        let Value::Object(mut body) = body else {
            return DispatchError::BadRequestBody.into();
        };

        match body.get("action").and_then(Value::as_str) {
            Some("info") => DispatchReply::Json(self.manifest.clone()),
            Some("request") => {
                let op_name = body.remove("opName").unwrap_or(Value::Null);
                let info = body.remove("info").unwrap_or(Value::Null);
                match op_name {
                    Value::String(name) if !name.is_empty() => self.request(&name, info).await,
                    other => DispatchError::NoOpName { op_name: other }.into(),
                }
            }
            _ => DispatchError::UnknownAction {
                action: body.remove("action").unwrap_or(Value::Null),
            }
            .into(),
        }
    }

    /// Invoke `op_name` with the raw `info` argument map.
    pub async fn request(&self, op_name: &str, info: Value) -> DispatchReply {
        let Some(tool) = self.registry.resolve(op_name) else {
            debug!(op_name = %op_name, "op name not found");
            return DispatchError::OpNameNotFound {
                op_name: op_name.to_string(),
            }
            .into();
        };

        let raw_args = match info {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                warn!(op_name = %op_name, info = %other, "bad args format: info is not an object");
                return DispatchError::BadFormat.into();
            }
        };

        debug!(op_name = %op_name, args = ?raw_args, "dispatching request");

        let args = match tool.prepare_args(raw_args) {
            Ok(args) => args,
            Err(e) => {
                warn!(op_name = %op_name, error = %e, "bad args format");
                return DispatchError::BadFormat.into();
            }
        };

        match tool.call(args, self.state.clone()).await {
            Ok(value) => DispatchReply::Json(value),
            Err(HandlerError::Input(e)) => {
                warn!(op_name = %op_name, error = %e, "bad args format");
                DispatchError::BadFormat.into()
            }
            Err(HandlerError::Output(e)) => {
                error!(op_name = %op_name, error = %e, "error encoding response");
                DispatchReply::SerializationFailed
            }
            Err(e @ HandlerError::Failed(_)) => {
                error!(op_name = %op_name, error = %e, "handler failed");
                DispatchError::HandlerFailed.into()
            }
        }
    }
}
