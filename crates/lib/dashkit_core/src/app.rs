//! Startup descriptor supplied by the host application.

use std::sync::Arc;

use crate::tag_value::TagValueType;
use crate::tool::Tool;

/// Everything the dispatcher needs to serve an app.
///
/// `state` is the shared execution context handed to every handler call. It
/// is never locked by the framework: a store that mutates internally must
/// synchronize itself (a connection pool, for example).
pub struct AppInfo<S> {
    pub ns: String,
    pub title: String,
    pub state: Arc<S>,
    /// Tools published in the manifest's `tools` map.
    pub tools: Vec<Arc<Tool<S>>>,
    pub tag_values: Vec<TagValueType<S>>,
    /// Extra handlers that are dispatchable but not published as tools.
    pub handlers: Vec<Arc<Tool<S>>>,
}

impl<S> AppInfo<S> {
    pub fn new(ns: impl Into<String>, title: impl Into<String>, state: S) -> Self {
        Self::with_shared_state(ns, title, Arc::new(state))
    }

    pub fn with_shared_state(ns: impl Into<String>, title: impl Into<String>, state: Arc<S>) -> Self {
        Self {
            ns: ns.into(),
            title: title.into(),
            state,
            tools: Vec::new(),
            tag_values: Vec::new(),
            handlers: Vec::new(),
        }
    }

    pub fn tool(mut self, tool: Arc<Tool<S>>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: impl IntoIterator<Item = Arc<Tool<S>>>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn tag_value(mut self, tag_type: TagValueType<S>) -> Self {
        self.tag_values.push(tag_type);
        self
    }

    pub fn handler(mut self, tool: Arc<Tool<S>>) -> Self {
        self.handlers.push(tool);
        self
    }
}
