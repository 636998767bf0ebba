//! Error types for argument validation, handler execution and dispatch.

use serde_json::{Value, json};
use thiserror::Error;

/// A raw argument failed validation against its field declaration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("missing required field `{field}`")]
    Missing { field: String },

    #[error("field `{field}` expected {expected}, got {found}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: Value,
    },

    #[error("field `{field}` value {value:?} is not one of {options:?}")]
    NotInEnum {
        field: String,
        value: String,
        options: Vec<String>,
    },
}

/// Errors raised while running a tool handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The validated arguments did not deserialize into the handler's input type.
    #[error("Input error: {0}")]
    Input(#[source] serde_json::Error),

    /// The handler's result could not be serialized.
    #[error("Output error: {0}")]
    Output(#[source] serde_json::Error),

    #[error("Handler failed: {0}")]
    Failed(String),
}

impl HandlerError {
    pub fn failed(e: impl std::fmt::Display) -> Self {
        Self::Failed(e.to_string())
    }
}

/// Structured dispatch failures.
///
/// Every variant maps to an `{ok: false, code, reason, info}` envelope; none of
/// them is fatal to the server.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("Bad Request Body")]
    BadRequestBody,

    #[error("Unknown Action")]
    UnknownAction { action: Value },

    #[error("No Op Name")]
    NoOpName { op_name: Value },

    #[error("Op Name Not Found")]
    OpNameNotFound { op_name: String },

    #[error("BadFormat")]
    BadFormat,

    #[error("Handler Failed")]
    HandlerFailed,
}

impl DispatchError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::BadRequestBody => "BadRequestBody",
            DispatchError::UnknownAction { .. } => "UnknownAction",
            DispatchError::NoOpName { .. } => "NoOpName",
            DispatchError::OpNameNotFound { .. } => "OpNameNotFound",
            DispatchError::BadFormat => "BadFormat",
            DispatchError::HandlerFailed => "HandlerFailed",
        }
    }

    /// Diagnostic details echoed back to the caller, if any.
    pub fn info(&self) -> Option<Value> {
        match self {
            DispatchError::UnknownAction { action } => Some(json!({ "action": action })),
            DispatchError::NoOpName { op_name } => Some(json!({ "op_name": op_name })),
            DispatchError::OpNameNotFound { op_name } => Some(json!({ "op_name": op_name })),
            _ => None,
        }
    }

    /// Render the error envelope sent on the wire.
    pub fn to_envelope(&self) -> Value {
        json!({
            "ok": false,
            "code": self.code(),
            "reason": self.to_string(),
            "info": self.info(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_name_not_found_envelope_echoes_name() {
        let env = DispatchError::OpNameNotFound {
            op_name: "Nope".into(),
        }
        .to_envelope();
        assert_eq!(env["ok"], false);
        assert_eq!(env["code"], "OpNameNotFound");
        assert_eq!(env["reason"], "Op Name Not Found");
        assert_eq!(env["info"]["op_name"], "Nope");
    }

    #[test]
    fn bad_format_envelope_has_null_info() {
        let env = DispatchError::BadFormat.to_envelope();
        assert_eq!(env["code"], "BadFormat");
        assert_eq!(env["reason"], "BadFormat");
        assert!(env["info"].is_null());
    }
}
