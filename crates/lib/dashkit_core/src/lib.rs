//! # dashkit_core
//!
//! Protocol engine for Dashkit tool servers.
//!
//! A host application describes its tools and tag value types in an
//! [`AppInfo`]. The [`Dispatcher`] turns that description into a handler
//! table and a manifest, then answers `info` and `request` envelopes. The
//! HTTP surface lives in `dashkit_api`.

pub mod app;
pub mod dispatch;
pub mod error;
pub mod field;
pub mod manifest;
pub mod registry;
pub mod tag_value;
pub mod tool;

pub use app::AppInfo;
pub use dispatch::{DispatchReply, Dispatcher};
pub use error::{DispatchError, FieldError, HandlerError};
pub use field::{DTypeRef, DefaultValue, Field, FieldType};
pub use manifest::Manifest;
pub use registry::Registry;
pub use tag_value::{TagValue, TagValueType};
pub use tool::{ContextAction, Handler, HandlerRef, Tool, ToolBuilder};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
