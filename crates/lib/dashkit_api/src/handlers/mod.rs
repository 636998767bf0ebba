//! Request handlers.

pub mod dispatch;
pub mod resource;
